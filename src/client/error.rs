use thiserror::Error;

/// Failure of a call to the remote blog API.
///
/// The variants carry rendered messages rather than source errors so a result
/// can be cloned to every caller that awaited the same fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server error: status {status} body {body}")]
    Server { status: u16, body: String },
    #[error("blog `{id}` not found")]
    NotFound { id: String },
    #[error("blog rejected by server: {0}")]
    Validation(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn server(status: u16, body: impl Into<String>) -> Self {
        Self::Server {
            status,
            body: body.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Short label for log fields and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Server { .. } => "server",
            Self::NotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Url(_) => "url",
        }
    }
}
