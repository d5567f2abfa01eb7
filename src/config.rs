use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LLMConfig {
    pub google_api_key: String,
    pub openai_api_key: String,
    pub default_provider: String,
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LLMConfig {
    /// API key for the configured provider, if one is set.
    pub fn active_api_key(&self) -> Option<String> {
        let key = match self.default_provider.as_str() {
            "google" => &self.google_api_key,
            "openai" => &self.openai_api_key,
            _ => return None,
        };
        if key.trim().is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub serpapi_key: String,
    pub max_results: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    pub dir: PathBuf,
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            max_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                cors_allowed_origins: env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            llm: LLMConfig {
                google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
                openai_api_key: env::var("OPENAI_API_KEY").unwrap_or_default(),
                default_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "google".to_string()),
                default_model: env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
                temperature: env::var("LLM_TEMPERATURE")
                    .unwrap_or_else(|_| "0.3".to_string())
                    .parse()
                    .context("LLM_TEMPERATURE must be a number")?,
                max_tokens: env::var("LLM_MAX_TOKENS")
                    .unwrap_or_else(|_| "2048".to_string())
                    .parse()
                    .context("LLM_MAX_TOKENS must be a positive integer")?,
            },
            search: SearchConfig {
                serpapi_key: env::var("SERPAPI_API_KEY").unwrap_or_default(),
                max_results: env::var("SEARCH_MAX_RESULTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .context("SEARCH_MAX_RESULTS must be a positive integer")?,
            },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("data")),
                max_bytes: MAX_UPLOAD_BYTES,
            },
        })
    }

    /// Reject configurations that cannot build the reasoning or search
    /// capabilities. Called once at startup.
    pub fn validate(&self) -> Result<()> {
        match self.llm.default_provider.as_str() {
            "google" | "openai" => {}
            other => bail!("Unsupported LLM_PROVIDER: {}", other),
        }
        if self.llm.active_api_key().is_none() {
            bail!(
                "No API key configured for LLM provider '{}' (set GOOGLE_API_KEY or OPENAI_API_KEY)",
                self.llm.default_provider
            );
        }
        if self.search.serpapi_key.trim().is_empty() {
            bail!("SERPAPI_API_KEY must be set");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    fn sample() -> Config {
        Config {
            server: ServerConfig {
                port: 8000,
                host: "127.0.0.1".to_string(),
                cors_allowed_origins: vec!["*".to_string()],
            },
            llm: LLMConfig {
                google_api_key: "g-key".to_string(),
                openai_api_key: String::new(),
                default_provider: "google".to_string(),
                default_model: "gemini-2.5-flash".to_string(),
                temperature: 0.3,
                max_tokens: 2048,
            },
            search: SearchConfig {
                serpapi_key: "s-key".to_string(),
                max_results: 5,
            },
            upload: UploadConfig::default(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_config() {
        assert_ok!(sample().validate());
    }

    #[test]
    fn test_validate_rejects_missing_llm_key() {
        let mut config = sample();
        config.llm.default_provider = "openai".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("openai"));
    }

    #[test]
    fn test_validate_rejects_missing_search_key() {
        let mut config = sample();
        config.search.serpapi_key = "  ".to_string();
        assert_err!(config.validate());
    }

    #[test]
    fn test_validate_rejects_unknown_provider() {
        let mut config = sample();
        config.llm.default_provider = "mystery".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_active_api_key_ignores_blank() {
        let mut config = sample();
        config.llm.google_api_key = "   ".to_string();
        assert_eq!(config.llm.active_api_key(), None);
    }
}
