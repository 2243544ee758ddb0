use thiserror::Error;

use crate::{
    client::ClientError, config::LoadError, domain::FormError, infra::error::InfraError,
    presentation::TemplateRenderError, session::SubmitError,
};

/// Top-level failure of a `monk` invocation.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] LoadError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Render(#[from] TemplateRenderError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) | AppError::Form(_) | AppError::Validation(_) => 2,
            AppError::Client(ClientError::NotFound { .. }) => 3,
            _ => 1,
        }
    }
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::Form(err) => AppError::Form(err),
            SubmitError::Client(ClientError::Validation(message)) => AppError::Validation(message),
            SubmitError::Client(err) => AppError::Client(err),
            SubmitError::NotCreating | SubmitError::Pending => {
                AppError::unexpected(err.to_string())
            }
        }
    }
}
