use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use bytes::Bytes;
use docx_rs::{DocumentChild, ParagraphChild, RunChild};
use lopdf::Document;
use tempfile::{Builder, NamedTempFile};
use thiserror::Error;

use crate::models::file_extension;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("{format} extraction failed: {message}")]
    ExtractionFailed { format: DocumentFormat, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Document families the service can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    /// `.docx`, and `.doc` files which go through the same OOXML reader.
    Word,
}

impl DocumentFormat {
    pub fn from_filename(filename: &str) -> Result<Self, ExtractError> {
        match file_extension(filename).as_deref() {
            Some("pdf") => Ok(DocumentFormat::Pdf),
            Some("docx") | Some("doc") => Ok(DocumentFormat::Word),
            other => Err(ExtractError::UnsupportedFormat {
                extension: other.unwrap_or("").to_string(),
            }),
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "PDF"),
            DocumentFormat::Word => write!(f, "Word document"),
        }
    }
}

/// Reads the file at `path` and returns its plain text, one line per PDF
/// page or Word paragraph. The format comes from `filename`, not `path`.
///
/// The file is only read; removing it is the caller's job.
pub fn extract(path: &Path, filename: &str) -> Result<String, ExtractError> {
    let start = Instant::now();
    let format = DocumentFormat::from_filename(filename)?;

    let text = match format {
        DocumentFormat::Pdf => extract_pdf(path)?,
        DocumentFormat::Word => extract_word(path)?,
    };

    tracing::debug!(
        file_name = %filename,
        format = %format,
        text_length = text.len(),
        processing_time_ms = start.elapsed().as_millis() as u64,
        "Text extraction completed"
    );

    Ok(text)
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    // pdf-extract is authoritative for text; lopdf is only consulted for diagnostics
    match Document::load(path) {
        Ok(doc) => tracing::debug!(pages = doc.get_pages().len(), "PDF structure loaded"),
        Err(e) => tracing::warn!("PDF structure validation failed: {}, will try text extraction anyway", e),
    }

    // pdf-extract panics on some malformed inputs
    let pages = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_by_pages(path)))
        .map_err(|payload| ExtractError::ExtractionFailed {
            format: DocumentFormat::Pdf,
            message: panic_message(&*payload),
        })?
        .map_err(|e| ExtractError::ExtractionFailed {
            format: DocumentFormat::Pdf,
            message: e.to_string(),
        })?;

    Ok(join_pages(pages))
}

/// Joins per-page text with one newline per page boundary; blank pages
/// still count as a line.
fn join_pages(pages: Vec<String>) -> String {
    pages
        .iter()
        .map(|page| page.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_word(path: &Path) -> Result<String, ExtractError> {
    let data = std::fs::read(path).map_err(|e| ExtractError::ExtractionFailed {
        format: DocumentFormat::Word,
        message: e.to_string(),
    })?;

    let docx = docx_rs::read_docx(&data).map_err(|e| ExtractError::ExtractionFailed {
        format: DocumentFormat::Word,
        message: e.to_string(),
    })?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(&p.children)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join("\n"))
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        RunChild::Break(_) => text.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => text.push_str(&paragraph_text(&link.children)),
            _ => {}
        }
    }
    text
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("parser panicked: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("parser panicked: {}", msg)
    } else {
        "parser panicked".to_string()
    }
}

/// Writes the upload to a uniquely named temporary file, extracts its text
/// on a blocking thread, and removes the file before returning.
pub async fn extract_upload(
    content: Bytes,
    filename: String,
    upload_dir: Option<PathBuf>,
) -> Result<String, ExtractError> {
    let format = DocumentFormat::from_filename(&filename)?;

    let task = tokio::task::spawn_blocking(move || -> Result<String, ExtractError> {
        let temp = write_temp_file(&content, &filename, upload_dir.as_deref())?;
        tracing::debug!(temp_path = %temp.path().display(), "Upload written to temporary file");

        let result = extract(temp.path(), &filename);

        // Dropping the handle deletes the file; close() surfaces removal errors
        let temp_path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            tracing::warn!(temp_path = %temp_path.display(), error = %e, "Failed to remove temporary file");
        }

        result
    });

    match task.await {
        Ok(result) => result,
        Err(e) => Err(ExtractError::ExtractionFailed {
            format,
            message: format!("extraction task failed: {}", e),
        }),
    }
}

fn write_temp_file(
    content: &[u8],
    filename: &str,
    upload_dir: Option<&Path>,
) -> Result<NamedTempFile, ExtractError> {
    let suffix = file_extension(filename)
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();

    let mut builder = Builder::new();
    builder.prefix("resume-").suffix(&suffix);

    let mut temp = match upload_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };

    temp.write_all(content)?;
    temp.flush()?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_dispatch_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_filename("cv.PDF").unwrap(), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::from_filename("cv.Docx").unwrap(), DocumentFormat::Word);
        assert_eq!(DocumentFormat::from_filename("cv.doc").unwrap(), DocumentFormat::Word);
    }

    #[test]
    fn unknown_extensions_are_rejected() {
        for name in ["cv.txt", "cv.pdf.exe", "cv", "photo.png"] {
            match DocumentFormat::from_filename(name) {
                Err(ExtractError::UnsupportedFormat { .. }) => {}
                other => panic!("expected UnsupportedFormat for {}, got {:?}", name, other),
            }
        }
    }

    #[test]
    fn blank_pages_keep_their_line() {
        let pages = vec![
            "First page\n\n".to_string(),
            String::new(),
            "Third page".to_string(),
        ];
        assert_eq!(join_pages(pages), "First page\n\nThird page");
    }

    #[test]
    fn unsupported_file_is_not_opened() {
        // The path does not exist; dispatch must fail before any read
        let err = extract(Path::new("/nonexistent/resume.txt"), "resume.txt").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat { extension } if extension == "txt"));
    }

    #[test]
    fn corrupt_word_document_reports_extraction_failure() {
        let mut temp = Builder::new().suffix(".docx").tempfile().unwrap();
        temp.write_all(b"definitely not a zip archive").unwrap();

        let err = extract(temp.path(), "resume.docx").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::ExtractionFailed { format: DocumentFormat::Word, .. }
        ));
        assert!(temp.path().exists());
    }

    #[test]
    fn unreadable_word_document_reports_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.docx");

        let err = extract(&missing, "resume.docx").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::ExtractionFailed { format: DocumentFormat::Word, .. }
        ));
    }

    #[tokio::test]
    async fn extract_upload_removes_temporary_file_on_failure() {
        let dir = tempfile::tempdir().unwrap();

        let result = extract_upload(
            Bytes::from_static(b"%PDF-1.4 truncated"),
            "resume.pdf".to_string(),
            Some(dir.path().to_path_buf()),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
