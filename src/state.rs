use std::sync::Arc;

use crate::config::Config;
use crate::services::{Evaluator, EvaluatorSettings, LanguageModel};

/// Shared application state injected into handlers via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub evaluator: Evaluator,
}

impl AppState {
    pub fn new(config: Config, model: Arc<dyn LanguageModel>) -> Self {
        let evaluator = Evaluator::new(model, EvaluatorSettings::from(&config));
        Self {
            config: Arc::new(config),
            evaluator,
        }
    }
}
