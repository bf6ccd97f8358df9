use std::env;
use std::path::PathBuf;
use anyhow::{Context, Result};
use tracing::{info, warn};

pub const DEFAULT_MODEL: &str = "claude-opus-4-6";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines, anything else the human format.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT").map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub request_timeout_seconds: u64,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
    pub anthropic_base_url: String,
    pub max_output_tokens: u32,
    pub min_resume_chars: usize,
    pub min_improvements: usize,
    pub max_improvements: usize,
    pub upload_dir: Option<PathBuf>,
}

// Hand-written so the credential never ends up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "<redacted>"))
            .field("anthropic_model", &self.anthropic_model)
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("min_resume_chars", &self.min_resume_chars)
            .field("min_improvements", &self.min_improvements)
            .field("max_improvements", &self.max_improvements)
            .field("upload_dir", &self.upload_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 5000,
            max_file_size_mb: 10,
            request_timeout_seconds: 120,
            anthropic_api_key: None,
            anthropic_model: DEFAULT_MODEL.to_string(),
            anthropic_base_url: DEFAULT_ANTHROPIC_BASE_URL.to_string(),
            max_output_tokens: 2000,
            min_resume_chars: 100,
            min_improvements: 3,
            max_improvements: 6,
            upload_dir: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let defaults = Config::default();

        // PORT takes precedence for hosting platforms that inject it
        let port_var = if env::var("PORT").is_ok() { "PORT" } else { "SERVER_PORT" };

        let config = Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| {
                info!("SERVER_HOST not set, using default: {}", defaults.server_host);
                defaults.server_host.clone()
            }),
            server_port: Self::parse_env_var(port_var, defaults.server_port)
                .context("Failed to parse server port")?,
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", defaults.max_file_size_mb)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            request_timeout_seconds: Self::parse_env_var(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            )
            .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            anthropic_api_key: env::var("ANTHROPIC_API_KEY")
                .ok()
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            anthropic_model: Self::string_env_var("ANTHROPIC_MODEL", &defaults.anthropic_model),
            anthropic_base_url: Self::string_env_var(
                "ANTHROPIC_BASE_URL",
                &defaults.anthropic_base_url,
            ),
            max_output_tokens: Self::parse_env_var("MAX_OUTPUT_TOKENS", defaults.max_output_tokens)
                .context("Failed to parse MAX_OUTPUT_TOKENS")?,
            min_resume_chars: Self::parse_env_var("MIN_RESUME_CHARS", defaults.min_resume_chars)
                .context("Failed to parse MIN_RESUME_CHARS")?,
            min_improvements: Self::parse_env_var("MIN_IMPROVEMENTS", defaults.min_improvements)
                .context("Failed to parse MIN_IMPROVEMENTS")?,
            max_improvements: Self::parse_env_var("MAX_IMPROVEMENTS", defaults.max_improvements)
                .context("Failed to parse MAX_IMPROVEMENTS")?,
            upload_dir: env::var("UPLOAD_DIR")
                .ok()
                .filter(|dir| !dir.trim().is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;

        // The credential is checked at first use, not here
        if config.anthropic_api_key.is_none() {
            warn!("ANTHROPIC_API_KEY is not set; evaluation requests will fail until it is configured");
        }

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.trim().parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn string_env_var(var_name: &str, default: &str) -> String {
        match env::var(var_name) {
            Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
            _ => {
                info!("{} not set, using default: {}", var_name, default);
                default.to_string()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.max_output_tokens == 0 {
            return Err(anyhow::anyhow!("MAX_OUTPUT_TOKENS must be greater than 0"));
        }
        if self.max_improvements == 0 {
            return Err(anyhow::anyhow!("MAX_IMPROVEMENTS must be greater than 0"));
        }
        if self.min_improvements > self.max_improvements {
            return Err(anyhow::anyhow!(
                "MIN_IMPROVEMENTS ({}) must not exceed MAX_IMPROVEMENTS ({})",
                self.min_improvements,
                self.max_improvements
            ));
        }
        Ok(())
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
