//! HTTP handlers for template-service.
//!
//! Proxy handlers always answer 200 with a [`ProxyEnvelope`](crate::models::ProxyEnvelope);
//! only the operational endpoints use HTTP status codes.

pub mod health;
pub mod page_source;
pub mod template_ai;
pub mod template_version;
pub mod templates;
