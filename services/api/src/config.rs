use lingobot_core::backend::AudioFormat;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where chat completions are sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    OpenAI {
        api_key: String,
        api_base: Option<String>,
    },
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub chat_model: String,
    pub language_backend_url: String,
    pub request_timeout: Duration,
    pub audio_format: AudioFormat,
    pub default_instructions: Option<String>,
    pub log_level: Level,
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn required_for(name: &str, provider: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| {
        ConfigError::MissingVar(format!("{name} must be set for '{provider}' provider"))
    })
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let provider_str = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let provider = match provider_str.to_lowercase().as_str() {
            "openai" => Provider::OpenAI {
                api_key: required_for("OPENAI_API_KEY", "openai")?,
                api_base: std::env::var("OPENAI_API_BASE").ok(),
            },
            "azure" => Provider::Azure {
                endpoint: required_for("AZURE_OPENAI_ENDPOINT", "azure")?,
                api_key: required_for("AZURE_OPENAI_API_KEY", "azure")?,
                deployment: required_for("AZURE_OPENAI_DEPLOYMENT", "azure")?,
                api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|_| "2023-07-01-preview".to_string()),
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "LLM_PROVIDER".to_string(),
                    format!("'{other}' is not one of 'openai', 'azure'"),
                ));
            }
        };

        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        let language_backend_url = required("LANGUAGE_BACKEND_URL")?;

        let timeout_str = std::env::var("REQUEST_TIMEOUT_SECS").unwrap_or_else(|_| "15".to_string());
        let request_timeout = timeout_str
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "REQUEST_TIMEOUT_SECS".to_string(),
                    format!("'{timeout_str}' is not a positive number of seconds"),
                )
            })?;

        let audio_format = match std::env::var("AUDIO_FORMAT") {
            Ok(value) => value
                .parse::<AudioFormat>()
                .map_err(|e| ConfigError::InvalidValue("AUDIO_FORMAT".to_string(), e))?,
            Err(_) => AudioFormat::default(),
        };

        let default_instructions = std::env::var("DEFAULT_INSTRUCTIONS")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            bind_address,
            provider,
            chat_model,
            language_backend_url,
            request_timeout,
            audio_format,
            default_instructions,
            log_level,
        })
    }
}
