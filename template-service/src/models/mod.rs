pub mod envelope;
pub mod params;

pub use envelope::{ProxyEnvelope, JSON_CONTENT_TYPE};
pub use params::RequestParams;
