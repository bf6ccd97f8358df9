pub mod evaluator;
pub mod extractor;
pub mod llm_client;

pub use evaluator::{Evaluator, EvaluatorSettings};
pub use extractor::{extract, extract_upload, DocumentFormat};
pub use llm_client::{AnthropicClient, LanguageModel};
