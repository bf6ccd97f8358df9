use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::evaluator::EvaluateError;
use crate::services::extractor::ExtractError;

pub type AppResult<T> = Result<T, AppError>;

pub const MSG_MISSING_FILE: &str = "No resume file provided";
pub const MSG_NO_FILE_SELECTED: &str = "No file selected";
pub const MSG_UNSUPPORTED_FORMAT: &str = "Please upload a PDF or DOCX file";
pub const MSG_INSUFFICIENT_TEXT: &str =
    "Could not extract text from resume. Make sure it's not a scanned image.";
pub const MSG_EXTRACTION_FAILED: &str =
    "Could not read the uploaded document. Make sure the file is a valid PDF or DOCX.";
pub const MSG_MALFORMED_RESPONSE: &str = "AI returned an unexpected response. Please try again.";
pub const MSG_MODEL_UNAVAILABLE: &str =
    "Resume evaluation is temporarily unavailable. Please try again later.";
pub const MSG_INTERNAL: &str = "An internal server error occurred";

/// Every failure a request can end in.
///
/// `Display` carries the internal detail that gets logged; `client_message`
/// is the stable text returned in the response body.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing resume field in request")]
    MissingFile,

    #[error("Resume field has no filename")]
    NoFileSelected,

    #[error("Unsupported file extension: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Extracted text too short: {chars} characters, minimum is {minimum}")]
    InsufficientText { chars: usize, minimum: usize },

    #[error("Invalid upload: {message}")]
    InvalidUpload { message: String },

    #[error("File too large: maximum upload size is {limit_mb}MB")]
    FileTooLarge { limit_mb: usize },

    #[error("Text extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("Malformed model response: {message}")]
    MalformedModelResponse { message: String },

    #[error("Language model call failed: {message}")]
    ModelUnavailable { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::MissingFile => "MISSING_FILE",
            AppError::NoFileSelected => "NO_FILE_SELECTED",
            AppError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            AppError::InsufficientText { .. } => "INSUFFICIENT_TEXT",
            AppError::InvalidUpload { .. } => "INVALID_UPLOAD",
            AppError::FileTooLarge { .. } => "FILE_TOO_LARGE",
            AppError::ExtractionFailed { .. } => "EXTRACTION_FAILED",
            AppError::MalformedModelResponse { .. } => "MALFORMED_MODEL_RESPONSE",
            AppError::ModelUnavailable { .. } => "MODEL_UNAVAILABLE",
            AppError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingFile => StatusCode::BAD_REQUEST,
            AppError::NoFileSelected => StatusCode::BAD_REQUEST,
            AppError::UnsupportedFormat { .. } => StatusCode::BAD_REQUEST,
            AppError::InsufficientText { .. } => StatusCode::BAD_REQUEST,
            AppError::InvalidUpload { .. } => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::ExtractionFailed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::MalformedModelResponse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ModelUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn client_message(&self) -> String {
        match self {
            AppError::MissingFile => MSG_MISSING_FILE.to_string(),
            AppError::NoFileSelected => MSG_NO_FILE_SELECTED.to_string(),
            AppError::UnsupportedFormat { .. } => MSG_UNSUPPORTED_FORMAT.to_string(),
            AppError::InsufficientText { .. } => MSG_INSUFFICIENT_TEXT.to_string(),
            AppError::InvalidUpload { .. } | AppError::FileTooLarge { .. } => self.to_string(),
            AppError::ExtractionFailed { .. } => MSG_EXTRACTION_FAILED.to_string(),
            AppError::MalformedModelResponse { .. } => MSG_MALFORMED_RESPONSE.to_string(),
            AppError::ModelUnavailable { .. } => MSG_MODEL_UNAVAILABLE.to_string(),
            AppError::Internal { .. } => MSG_INTERNAL.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();
        let detail = self.to_string();
        let error_id = Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().to_rfc3339();

        if status.is_server_error() {
            tracing::error!(
                error_code = error_code,
                status_code = %status,
                error_id = %error_id,
                timestamp = %timestamp,
                error_detail = %detail,
                "Request failed"
            );
        } else {
            tracing::warn!(
                error_code = error_code,
                status_code = %status,
                error_id = %error_id,
                timestamp = %timestamp,
                error_detail = %detail,
                "Request rejected"
            );
        }

        let body = Json(json!({ "error": self.client_message() }));

        (status, body).into_response()
    }
}

impl From<ExtractError> for AppError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat { extension } => {
                AppError::UnsupportedFormat { extension }
            }
            ExtractError::ExtractionFailed { .. } => AppError::ExtractionFailed {
                message: err.to_string(),
            },
            ExtractError::Io(e) => AppError::Internal {
                message: format!("IO error: {}", e),
            },
        }
    }
}

impl From<EvaluateError> for AppError {
    fn from(err: EvaluateError) -> Self {
        match err {
            EvaluateError::MalformedModelResponse { .. } => AppError::MalformedModelResponse {
                message: err.to_string(),
            },
            EvaluateError::Model(e) => AppError::ModelUnavailable {
                message: e.to_string(),
            },
        }
    }
}

impl AppError {
    pub fn invalid_upload(message: impl Into<String>) -> Self {
        AppError::InvalidUpload {
            message: message.into(),
        }
    }
}
