//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the clonable
//! services every chat session is built from, and the code that wires them
//! up from the configuration.

use crate::config::{Config, Provider};
use anyhow::Context;
use async_openai::config::{AzureConfig, OpenAIConfig};
use lingobot_core::{
    ChatServices, FunctionRegistry, HttpLanguageBackend, LLMClient, OpenAICompatibleClient,
    SessionSettings, prompts,
};
use std::sync::Arc;
use tracing::info;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: ChatServices,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        Ok(Self {
            services: build_services(&config)?,
            config: Arc::new(config),
        })
    }
}

/// Creates the LLM client for the configured provider.
pub fn build_llm_client(config: &Config) -> Arc<dyn LLMClient> {
    match &config.provider {
        Provider::OpenAI { api_key, api_base } => {
            info!("Using OpenAI provider.");
            let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
            if let Some(base) = api_base {
                openai_config = openai_config.with_api_base(base);
            }
            Arc::new(OpenAICompatibleClient::new(
                openai_config,
                config.chat_model.clone(),
            ))
        }
        Provider::Azure {
            endpoint,
            api_key,
            deployment,
            api_version,
        } => {
            info!(%deployment, %api_version, "Using Azure OpenAI provider.");
            let azure_config = AzureConfig::new()
                .with_api_base(endpoint)
                .with_api_key(api_key)
                .with_deployment_id(deployment)
                .with_api_version(api_version);
            Arc::new(OpenAICompatibleClient::new(
                azure_config,
                config.chat_model.clone(),
            ))
        }
    }
}

/// Builds everything a `ChatSession` needs from the configuration.
pub fn build_services(config: &Config) -> anyhow::Result<ChatServices> {
    let registry =
        FunctionRegistry::language_functions().context("Failed to build function registry")?;
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .context("Failed to build HTTP client")?;
    let backend = HttpLanguageBackend::new(http, config.language_backend_url.clone());

    let settings = SessionSettings {
        request_timeout: config.request_timeout,
        audio_format: config.audio_format,
        default_instruction: config
            .default_instructions
            .clone()
            .unwrap_or_else(|| prompts::DEFAULT_INSTRUCTIONS.to_string()),
        ..SessionSettings::default()
    };

    Ok(ChatServices {
        llm: build_llm_client(config),
        backend: Arc::new(backend),
        registry: Arc::new(registry),
        settings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lingobot_core::backend::AudioFormat;
    use std::time::Duration;
    use tracing::Level;

    fn config(provider: Provider) -> Config {
        Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            provider,
            chat_model: "gpt-4o".to_string(),
            language_backend_url: "http://localhost:8042/".to_string(),
            request_timeout: Duration::from_secs(20),
            audio_format: AudioFormat::OggOpus,
            default_instructions: None,
            log_level: Level::INFO,
        }
    }

    #[test]
    fn services_carry_configured_settings() {
        let services = build_services(&config(Provider::OpenAI {
            api_key: "key".to_string(),
            api_base: None,
        }))
        .unwrap();

        assert_eq!(services.registry.descriptors().len(), 4);
        assert_eq!(services.settings.request_timeout, Duration::from_secs(20));
        assert_eq!(services.settings.audio_format, AudioFormat::OggOpus);
        assert_eq!(services.settings.max_model_calls, 10);
        assert_eq!(
            services.settings.default_instruction,
            prompts::DEFAULT_INSTRUCTIONS
        );
    }

    #[test]
    fn default_instructions_can_be_overridden() {
        let mut config = config(Provider::Azure {
            endpoint: "https://example.openai.azure.com".to_string(),
            api_key: "key".to_string(),
            deployment: "chat".to_string(),
            api_version: "2023-07-01-preview".to_string(),
        });
        config.default_instructions = Some("Transliterate every sentence".to_string());

        let state = AppState::from_config(config).unwrap();

        assert_eq!(
            state.services.settings.default_instruction,
            "Transliterate every sentence"
        );
    }
}
