//! Error handling

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::FailResponse;

/// The upload could not be turned into a model input.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
#[error("inference failed: {0}")]
pub struct InferenceError(pub String);

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("model returned an empty score vector")]
    EmptyScores,
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("prediction log i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("prediction log is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
    #[error("failed to replace prediction log: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Fatal at startup; the server never binds without a model.
#[derive(Debug, Error)]
#[error("failed to load model from {path}: {reason}")]
pub struct ModelLoadError {
    pub path: String,
    pub reason: String,
}

/// Anything that can go wrong between inference input and a decision.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced at the HTTP boundary. Only the messages rendered by
/// `client_message` ever reach the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("no file uploaded")]
    NoFile,
    #[error("invalid file type")]
    InvalidFileType,
    #[error("payload exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("malformed multipart body: {0}")]
    MalformedUpload(String),
    #[error(transparent)]
    Prediction(#[from] PredictionError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn client_message(&self) -> String {
        match self {
            ApiError::NoFile => "No file uploaded".to_string(),
            ApiError::InvalidFileType => "Invalid file type".to_string(),
            ApiError::MalformedUpload(_) => "Invalid multipart payload".to_string(),
            ApiError::PayloadTooLarge(max) => {
                format!("Payload content length greater than maximum allowed: {}", max)
            }
            ApiError::Prediction(_) => "An error occurred while making the prediction".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<actix_web::error::BlockingError> for ApiError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NoFile
            | ApiError::InvalidFileType
            | ApiError::MalformedUpload(_)
            | ApiError::Prediction(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Prediction(err) => log::warn!("Prediction failed: {}", err),
            ApiError::Internal(msg) => log::error!("Internal error: {}", msg),
            _ => log::debug!("Rejected upload: {}", self),
        }

        HttpResponse::build(self.status_code()).json(FailResponse::new(self.client_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(ApiError::NoFile.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::MalformedUpload("incomplete".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::PayloadTooLarge(1_000_000).status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        let prediction = ApiError::from(PredictionError::from(PolicyError::EmptyScores));
        assert_eq!(prediction.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Internal("disk full".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_never_reaches_client() {
        let err = ApiError::from(PredictionError::from(InferenceError(
            "/srv/model/model.onnx: shape mismatch".into(),
        )));
        assert!(!err.client_message().contains("model.onnx"));

        let err = ApiError::Internal("/var/lib/predictions.json: permission denied".into());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn payload_message_names_the_limit() {
        assert_eq!(
            ApiError::PayloadTooLarge(1_000_000).client_message(),
            "Payload content length greater than maximum allowed: 1000000"
        );
    }
}
