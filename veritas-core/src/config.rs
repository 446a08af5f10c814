use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct VeritasConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    /// Claims shorter than this (in characters, after trimming) are rejected.
    pub min_claim_chars: usize,
    pub max_claim_chars: usize,
    pub cors_allow_any_origin: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            min_claim_chars: 5,
            max_claim_chars: 2000,
            cors_allow_any_origin: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    /// "gemini" or "chat-completions"
    pub provider: String,
    /// Falls back to the provider's API key env vars when unset.
    pub provider_key: Option<String>,
    /// Falls back to the provider's default model when unset.
    pub model_name: Option<String>,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
    pub base_url: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            provider_key: None,
            model_name: None,
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_ms: 500,
            base_url: None,
        }
    }
}

impl VeritasConfig {
    /// Load `path` (optional; a missing file means defaults) overlaid with
    /// `VERITAS__SECTION__KEY` environment variables.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("VERITAS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }

    /// Load from a TOML string. Used by tests and embedded defaults.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?;
        s.try_deserialize()
    }
}
