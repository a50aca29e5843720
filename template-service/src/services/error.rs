use thiserror::Error;

/// Everything that can go wrong while proxying a single request.
///
/// The display text is the exact message shown to the browser in the
/// envelope's `error` field.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A required parameter is missing, blank or malformed. No network call
    /// has been made.
    #[error("{0}")]
    InvalidInput(String),

    /// A credential could not be resolved. No network call has been made.
    #[error("{0}")]
    Configuration(String),

    /// The provider answered with an error status.
    #[error("{message}")]
    Upstream {
        status: u16,
        message: String,
        /// Raw provider body, echoed to the browser for SendGrid calls.
        body: Option<String>,
    },

    /// The provider could not be reached or the response could not be read.
    #[error("{0}")]
    Transport(String),

    /// The provider answered successfully with a body we could not use.
    #[error("{0}")]
    Parse(String),
}

impl ProxyError {
    /// Short, stable name used for logs and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::InvalidInput(_) => "invalid input",
            ProxyError::Configuration(_) => "configuration error",
            ProxyError::Upstream { .. } => "upstream error",
            ProxyError::Transport(_) => "transport error",
            ProxyError::Parse(_) => "parse error",
        }
    }

    /// Metric label for the outcome of an outbound call.
    pub fn outcome(&self) -> &'static str {
        match self {
            ProxyError::InvalidInput(_) => "invalid_input",
            ProxyError::Configuration(_) => "configuration_error",
            ProxyError::Upstream { .. } => "upstream_error",
            ProxyError::Transport(_) => "transport_error",
            ProxyError::Parse(_) => "parse_error",
        }
    }

    /// Errors raised before any outbound call, caused by the caller or by
    /// deployment configuration rather than by the provider.
    pub fn is_short_circuit(&self) -> bool {
        matches!(
            self,
            ProxyError::InvalidInput(_) | ProxyError::Configuration(_)
        )
    }
}
