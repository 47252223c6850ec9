//! Error taxonomy and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::mechanisms::MechanismError;
use crate::types::ErrorOutput;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("No file provided")]
    MissingFile,

    #[error("No file selected")]
    EmptyFilename,

    #[error("Invalid multipart request: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error("Invalid epsilon parameters")]
    InvalidPrivacyParams,

    #[error("Invalid column names")]
    InvalidColumns,

    #[error("Invalid train-test split")]
    InvalidSplit,

    #[error("Invalid epsilon for model")]
    InvalidModelEpsilon,

    #[error("Invalid seed")]
    InvalidSeed,

    #[error("Unsupported model algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Dataset exceeds the limit of {limit} {unit}")]
    DatasetTooLarge { limit: usize, unit: &'static str },

    #[error(transparent)]
    Mechanism(#[from] MechanismError),

    #[error("File processing failed")]
    OutputMissing,

    #[error("Malformed data: {0}")]
    Data(String),

    #[error("Model fitting failed: {0}")]
    Model(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::MissingFile
            | ServiceError::EmptyFilename
            | ServiceError::InvalidPrivacyParams
            | ServiceError::InvalidColumns
            | ServiceError::InvalidSplit
            | ServiceError::InvalidModelEpsilon
            | ServiceError::InvalidSeed
            | ServiceError::UnsupportedAlgorithm(_) => StatusCode::BAD_REQUEST,
            ServiceError::Mechanism(MechanismError::Sampling(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Mechanism(_) => StatusCode::BAD_REQUEST,
            ServiceError::Multipart { status, .. } => *status,
            ServiceError::DatasetTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::OutputMissing
            | ServiceError::Data(_)
            | ServiceError::Model(_)
            | ServiceError::Csv(_)
            | ServiceError::Io(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ServiceError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ServiceError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }

        (
            status,
            Json(ErrorOutput {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
