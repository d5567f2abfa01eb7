use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{AppError, AppResult, LLMProvider, LLMRequest, LLMResponse};

/// Reasoning backend seam. Every agent talks to its model through this trait.
#[async_trait]
pub trait LLMAdapter: Send + Sync {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse>;
}

/// Configuration for LLM provider (renamed to avoid conflict with LLMProvider enum in types.rs)
pub struct LLMProviderConfig {
    pub name: String,
    pub api_key: String,
}

pub struct LLM {
    adapter: Arc<dyn LLMAdapter>,
    provider: LLMProvider,
}

impl LLM {
    pub fn new(provider: LLMProviderConfig) -> AppResult<Self> {
        let kind = LLMProvider::from_id(&provider.name)
            .ok_or_else(|| AppError::Config(format!("Unsupported provider: {}", provider.name)))?;

        if provider.api_key.trim().is_empty() {
            return Err(AppError::Config(format!(
                "Missing API key for provider: {}",
                provider.name
            )));
        }

        let adapter: Arc<dyn LLMAdapter> = match kind {
            LLMProvider::Google => Arc::new(crate::llm::google::GoogleAdapter::new(&provider.api_key)),
            LLMProvider::OpenAI => Arc::new(crate::llm::openai::OpenAIAdapter::new(&provider.api_key)),
        };

        Ok(Self {
            adapter,
            provider: kind,
        })
    }

    pub fn provider(&self) -> LLMProvider {
        self.provider
    }

    /// Shared handle to the underlying adapter, for agents that hold it
    /// for the process lifetime.
    pub fn adapter(&self) -> Arc<dyn LLMAdapter> {
        Arc::clone(&self.adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_provider_is_config_error() {
        let result = LLM::new(LLMProviderConfig {
            name: "carrier-pigeon".to_string(),
            api_key: "key".to_string(),
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let result = LLM::new(LLMProviderConfig {
            name: "google".to_string(),
            api_key: String::new(),
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_known_provider_builds() {
        let llm = LLM::new(LLMProviderConfig {
            name: "openai".to_string(),
            api_key: "sk-test".to_string(),
        })
        .unwrap();
        assert_eq!(llm.provider(), LLMProvider::OpenAI);
    }
}
