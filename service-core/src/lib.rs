//! service-core: Shared infrastructure for the template tooling services.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
