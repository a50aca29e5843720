pub mod credentials;
pub mod error;
pub mod metrics;
pub mod openai;
pub mod page_source;
pub mod sendgrid;
pub mod upstream;
pub mod wrapper;

pub use credentials::{Credential, CredentialProvider, LayeredCredentials, StaticCredentials};
pub use error::ProxyError;
pub use openai::OpenAiClient;
pub use page_source::PageSourceFetcher;
pub use sendgrid::{NewTemplateVersion, SendGridClient};
pub use upstream::{HttpTransport, Transport};
pub use wrapper::EmailWrapper;
