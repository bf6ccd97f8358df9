use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::Json,
};
use bytes::Bytes;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{normalize_target_role, EvaluationResult, UploadedResume};
use crate::services::{extract_upload, DocumentFormat};
use crate::state::AppState;

const RESUME_FIELD: &str = "resume";
const TARGET_ROLE_FIELD: &str = "target_role";

/// Fields pulled out of the multipart body before any validation.
#[derive(Debug, Default)]
struct EvaluateForm {
    resume: Option<ResumeField>,
    target_role: Option<String>,
}

#[derive(Debug)]
struct ResumeField {
    file_name: Option<String>,
    content_type: Option<String>,
    content: Bytes,
}

pub async fn evaluate_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<EvaluationResult>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();

    info!(request_id = %request_id, "Starting resume evaluation request");

    let mut multipart = multipart.map_err(|rejection| {
        warn!(request_id = %request_id, error = %rejection, "Request body is not multipart form data");
        AppError::MissingFile
    })?;

    let form = read_form(&mut multipart, state.config.max_file_size_mb).await?;

    let upload = validate_upload(form.resume)?;
    let target_role = normalize_target_role(form.target_role.as_deref());

    let format = DocumentFormat::from_filename(&upload.file_name).map_err(|e| {
        warn!(request_id = %request_id, file_name = %upload.file_name, "Rejected file type");
        AppError::from(e)
    })?;

    info!(
        request_id = %request_id,
        file_name = %upload.file_name,
        file_size = upload.size,
        content_type = ?upload.content_type,
        format = %format,
        target_role = %target_role,
        "Resume received"
    );

    let text = match extract_upload(
        upload.content.clone(),
        upload.file_name.clone(),
        state.config.upload_dir.clone(),
    )
    .await
    {
        Ok(text) => text,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Text extraction failed");
            return Err(e.into());
        }
    };

    let chars = text.trim().chars().count();
    debug!(request_id = %request_id, text_chars = chars, "Text extracted");

    if chars < state.config.min_resume_chars {
        warn!(
            request_id = %request_id,
            text_chars = chars,
            minimum = state.config.min_resume_chars,
            "Too little text extracted, likely a scanned document"
        );
        return Err(AppError::InsufficientText {
            chars,
            minimum: state.config.min_resume_chars,
        });
    }

    let result = match state.evaluator.evaluate(&text, &target_role).await {
        Ok(result) => result,
        Err(e) => {
            error!(request_id = %request_id, error = %e, "Evaluation failed");
            return Err(e.into());
        }
    };

    info!(
        request_id = %request_id,
        overall_score = result.overall_score,
        total_time_ms = start.elapsed().as_millis() as u64,
        "Request completed successfully"
    );

    Ok(Json(result))
}

async fn read_form(multipart: &mut Multipart, limit_mb: usize) -> AppResult<EvaluateForm> {
    let mut form = EvaluateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit_mb))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            RESUME_FIELD if form.resume.is_none() => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let content = field.bytes().await.map_err(|e| multipart_error(e, limit_mb))?;

                form.resume = Some(ResumeField {
                    file_name,
                    content_type,
                    content,
                });
            }
            TARGET_ROLE_FIELD if form.target_role.is_none() => {
                let role = field.text().await.map_err(|e| multipart_error(e, limit_mb))?;
                form.target_role = Some(role);
            }
            _ => {
                debug!(field = %field_name, "Ignoring multipart field");
            }
        }
    }

    Ok(form)
}

fn validate_upload(resume: Option<ResumeField>) -> AppResult<UploadedResume> {
    let resume = resume.ok_or(AppError::MissingFile)?;

    let file_name = match resume.file_name {
        Some(name) if !name.is_empty() => name,
        _ => return Err(AppError::NoFileSelected),
    };

    let mut upload = UploadedResume::new(file_name, resume.content);
    if let Some(content_type) = resume.content_type {
        upload = upload.with_content_type(content_type);
    }
    Ok(upload)
}

fn multipart_error(err: MultipartError, limit_mb: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge { limit_mb }
    } else {
        AppError::invalid_upload(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(file_name: Option<&str>) -> ResumeField {
        ResumeField {
            file_name: file_name.map(str::to_string),
            content_type: Some("application/pdf".to_string()),
            content: Bytes::from_static(b"%PDF-1.4"),
        }
    }

    #[test]
    fn missing_resume_field() {
        assert!(matches!(validate_upload(None), Err(AppError::MissingFile)));
    }

    #[test]
    fn empty_or_absent_filename() {
        assert!(matches!(validate_upload(Some(field(Some("")))), Err(AppError::NoFileSelected)));
        assert!(matches!(validate_upload(Some(field(None))), Err(AppError::NoFileSelected)));
    }

    #[test]
    fn upload_keeps_name_and_content_type() {
        let upload = validate_upload(Some(field(Some("cv.pdf")))).unwrap();
        assert_eq!(upload.file_name, "cv.pdf");
        assert_eq!(upload.size, 8);
        assert_eq!(upload.content_type.as_deref(), Some("application/pdf"));
    }
}
