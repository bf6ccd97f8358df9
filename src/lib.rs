//! Resume Evaluator Service
//!
//! Accepts a PDF or Word resume plus a target role, extracts the text and
//! asks a language model for structured feedback.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use handlers::create_router;
pub use state::AppState;
