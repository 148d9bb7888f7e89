use crate::error::{ChatError, Result};
use crate::provider::{OpenAiChatConfig, DEFAULT_CHAT_MODEL};
use crate::store::ContextPolicy;
use crate::streamer::DEFAULT_STREAM_TIMEOUT;
use kale_search::{DEFAULT_RETRIEVAL_TIMEOUT, DEFAULT_TOP_K};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SYSTEM_PROMPT_PATH: &str = "data/pykale_prompt.txt";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Runtime settings of the chat loop.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub system_prompt_path: PathBuf,
    pub top_k: usize,
    pub retrieval_timeout: Duration,
    pub stream_timeout: Duration,
    pub context_policy: ContextPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            system_prompt_path: PathBuf::from(DEFAULT_SYSTEM_PROMPT_PATH),
            top_k: DEFAULT_TOP_K,
            retrieval_timeout: DEFAULT_RETRIEVAL_TIMEOUT,
            stream_timeout: DEFAULT_STREAM_TIMEOUT,
            context_policy: ContextPolicy::default(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn secs_var(name: &str) -> Result<Option<Duration>> {
    match non_empty_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs.max(1))))
            .map_err(|_| {
                ChatError::InvalidConfig(format!("{name} must be whole seconds, got '{raw}'"))
            }),
    }
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self {
            api_key: non_empty_var("OPENAI_API_KEY"),
            ..Default::default()
        };
        if let Some(url) = non_empty_var("OPENAI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(model) = non_empty_var("KALE_CHAT_MODEL") {
            config.model = model;
        }
        if let Some(path) = non_empty_var("KALE_SYSTEM_PROMPT") {
            config.system_prompt_path = PathBuf::from(path);
        }
        if let Some(timeout) = secs_var("KALE_RETRIEVAL_TIMEOUT_SECS")? {
            config.retrieval_timeout = timeout;
        }
        if let Some(timeout) = secs_var("KALE_STREAM_TIMEOUT_SECS")? {
            config.stream_timeout = timeout;
        }
        if let Some(policy) = non_empty_var("KALE_CONTEXT_POLICY") {
            config.context_policy = policy.parse()?;
        }
        Ok(config)
    }

    /// Settings for the OpenAI completion backend; fails without a credential.
    pub fn openai(&self) -> Result<OpenAiChatConfig> {
        let api_key = self
            .api_key
            .clone()
            .ok_or(ChatError::MissingCredential("OPENAI_API_KEY"))?;
        Ok(OpenAiChatConfig {
            api_key,
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            connect_timeout: Duration::from_secs(10),
        })
    }
}

/// Read the system prompt. A missing or blank file is a configuration error.
pub fn load_system_prompt(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let prompt = std::fs::read_to_string(path).map_err(|source| ChatError::PromptUnreadable {
        path: path.display().to_string(),
        source,
    })?;
    if prompt.trim().is_empty() {
        return Err(ChatError::InvalidConfig(format!(
            "system prompt {} is empty",
            path.display()
        )));
    }
    Ok(prompt)
}
