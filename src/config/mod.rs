pub mod prompt;

use crate::cli::Args;
use crate::llm::{ LlmConfig, LlmType, ParseLlmTypeError };
use log::warn;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use self::prompt::{ PromptConfig, PromptError };

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    LlmType(#[from] ParseLlmTypeError),
    #[error("Invalid API URL '{url}': {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("Failed to load prompts: {0}")]
    Prompt(#[from] PromptError),
}

/// Settings resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub system_prompt: String,
    pub history_window: usize,
    pub reveal_cadence: Duration,
    pub toast_timeout: Duration,
    pub cache_ttl: Option<Duration>,
    pub cache_capacity: u64,
}

impl AppConfig {
    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let llm_type: LlmType = args.chat_llm_type.parse()?;
        let base_url = args.api_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| llm_type.default_base_url().to_string());
        Url::parse(&base_url).map_err(|source| ConfigError::InvalidUrl {
            url: base_url.clone(),
            source,
        })?;

        let api_key = args.api_key.clone().filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            warn!("No API key configured; every question will fail until OPENROUTER_API_KEY is set");
        }

        let prompts = match &args.prompts_path {
            Some(path) => prompt::load_prompts(path)?,
            None => PromptConfig::default(),
        };

        Ok(Self {
            llm: LlmConfig {
                llm_type,
                api_key,
                completion_model: Some(args.model.clone()),
                base_url: Some(base_url),
                app_name: args.app_name.clone(),
                app_url: args.app_url.clone(),
            },
            system_prompt: prompts.system_prompt,
            history_window: args.history_window,
            reveal_cadence: Duration::from_millis(args.reveal_cadence_ms),
            toast_timeout: Duration::from_secs(args.toast_timeout_secs),
            cache_ttl: args.enable_cache.then(|| Duration::from_secs(args.cache_ttl_secs)),
            cache_capacity: args.cache_capacity,
        })
    }
}
