/// Error types for the advisor client
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Invalid advisor configuration: {0}")]
    ConfigError(String),

    #[error("Advisor request failed: {0}")]
    RequestFailed(String),

    #[error("Advisor returned HTTP {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Advisor response missing text content")]
    EmptyResponse,

    #[error("Could not parse advisor proposal: {0}")]
    MalformedProposal(String),

    #[error("HTTP transport error: {0}")]
    TransportError(#[from] reqwest::Error),
}

impl AdvisorError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedProposal(msg.into())
    }

    /// True when the failure is on the advisor side (network, HTTP, empty
    /// body) rather than a malformed-but-received proposal.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed(_)
                | Self::ApiError { .. }
                | Self::EmptyResponse
                | Self::TransportError(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AdvisorError>;
