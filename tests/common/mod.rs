//! Fixtures shared by the integration test binaries.
#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use docx_rs::{Docx, Paragraph, Run};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tokio::net::TcpListener;

use resume_evaluator::services::llm_client::{LanguageModel, LlmError};
use resume_evaluator::{create_router, AppState, Config};

pub const VALID_EVALUATION: &str = r#"{
  "overall_score": 8,
  "summary": "Strong backend engineer with clear ownership of distributed systems. Impact is mostly quantified.",
  "strengths": [
    "Led the migration of the payments ledger to event sourcing",
    "Cut p99 latency from 800ms to 120ms",
    "Mentored four engineers"
  ],
  "improvements": [
    {"section": "Summary", "issue": "Opens with a generic objective", "suggestion": "Lead with years of backend experience and scale handled", "priority": "high"},
    {"section": "Skills", "issue": "No mention of observability tooling", "suggestion": "List Prometheus and OpenTelemetry used at Acme", "priority": "medium"},
    {"section": "Work Experience", "issue": "Oldest role has no outcomes", "suggestion": "Add one metric to the 2015 role", "priority": "medium"},
    {"section": "Formatting", "issue": "Dates use two styles", "suggestion": "Use MMM YYYY throughout", "priority": "low"}
  ]
}"#;

/// Language model double that replays a fixed reply and records prompts.
pub struct StubModel {
    reply: Result<String, u16>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubModel {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.into()),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    /// Fails every call with an API error carrying `status`.
    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(status),
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete(&self, prompt: &str, _max_output_tokens: u32) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.reply {
            Ok(reply) => Ok(reply.clone()),
            Err(status) => Err(LlmError::Api {
                status: *status,
                message: "invalid x-api-key sk-ant-secret".to_string(),
            }),
        }
    }
}

/// Serves the application on an ephemeral port and returns its base URL.
pub async fn spawn_app(model: Arc<StubModel>, upload_dir: &Path) -> String {
    let config = Config {
        upload_dir: Some(upload_dir.to_path_buf()),
        ..Config::default()
    };
    spawn_app_with(config, model).await
}

pub async fn spawn_app_with(config: Config, model: Arc<StubModel>) -> String {
    let app = create_router(AppState::new(config, model));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Builds a PDF with one page per entry, each page holding the given lines.
pub fn pdf_fixture(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => pages.len() as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Builds a DOCX whose body holds one paragraph per entry.
pub fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

pub fn two_page_resume_pdf() -> Vec<u8> {
    pdf_fixture(&[
        &[
            "Jane Doe - Backend Engineer",
            "Staff Engineer, Acme Payments 2019-2024",
            "Led the migration of the payments ledger to event sourcing",
            "Cut p99 latency from 800ms to 120ms across checkout services",
        ],
        &[
            "Education",
            "BSc Computer Science, University of Somewhere 2014",
            "Skills: Rust, Go, PostgreSQL, Kafka, Kubernetes",
        ],
    ])
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}
