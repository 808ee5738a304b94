use anyhow::{anyhow, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::{log_system_event, log_validation};

pub const DEFAULT_CHAT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Complete application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub chat: ChatConfig,
    pub http: HttpConfig,
    pub uploads: UploadConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Document-capable generation API (topics and quizzes)
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_keys: Vec<String>,
    pub api_url: String,
}

/// Chat-completions API (weak-area analysis)
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub referer: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub directory: PathBuf,
    pub max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file_enabled: bool,
    pub console_enabled: bool,
    pub log_directory: String,
}

/// Source of configuration values; the process environment in production
trait Lookup {
    fn get(&self, key: &str) -> Option<String>;

    /// Set and non-blank
    fn non_empty(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &str) -> Result<String> {
        self.non_empty(key)
            .ok_or_else(|| anyhow!("Missing required environment variable {}", key))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.non_empty(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.non_empty(key) {
            Some(raw) => raw
                .parse::<T>()
                .map_err(|_| anyhow!("Invalid {} value: '{}'", key, raw)),
            None => Ok(default),
        }
    }
}

impl<F> Lookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        self(key)
    }
}

impl Config {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key: &str| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        log_system_event!(config, "Loading application configuration");

        let config = Config {
            gemini: GeminiConfig::load(&lookup)?,
            chat: ChatConfig::load(&lookup)?,
            http: HttpConfig::load(&lookup)?,
            uploads: UploadConfig::load(&lookup)?,
            server: ServerConfig::load(&lookup)?,
            logging: LoggingConfig::load(&lookup)?,
        };

        log_system_event!(config, "Configuration loaded successfully");
        Ok(config)
    }

    /// Log a summary of loaded configuration (without sensitive data)
    pub fn log_configuration_summary(&self) {
        info!(
            gemini_url = %self.gemini.api_url,
            gemini_key_count = self.gemini.api_keys.len(),
            gemini_keys_masked = ?self.gemini.api_keys.iter().map(|k| mask_sensitive_data(k)).collect::<Vec<_>>(),
            chat_url = %self.chat.api_url,
            chat_model = %self.chat.model,
            chat_key_masked = %mask_sensitive_data(&self.chat.api_key),
            http_timeout_secs = self.http.timeout_secs,
            upload_directory = %self.uploads.directory.display(),
            max_upload_bytes = self.uploads.max_bytes,
            server_address = %self.server.address(),
            log_level = %self.logging.level,
            "Configuration summary"
        );
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_keys.is_empty() {
            return Err(anyhow!("At least one Gemini API key is required"));
        }

        if self.gemini.api_keys.len() == 1 {
            warn!("Only one Gemini API key configured - key rotation is disabled");
        }

        for (name, url) in [("GEMINI_API_URL", &self.gemini.api_url), ("OPENROUTER_API_URL", &self.chat.api_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(anyhow!("{} must start with http:// or https://", name));
            }
        }

        if self.server.port == 0 {
            return Err(anyhow!("Server port must be greater than 0"));
        }

        if self.http.timeout_secs == 0 {
            return Err(anyhow!("HTTP_TIMEOUT_SECS must be greater than 0"));
        }

        if self.uploads.max_bytes == 0 {
            return Err(anyhow!("MAX_UPLOAD_BYTES must be greater than 0"));
        }

        log_validation!(success, "configuration", "Configuration validation completed successfully");
        Ok(())
    }
}

impl GeminiConfig {
    fn load(lookup: &impl Lookup) -> Result<Self> {
        // GEMINI_API_KEY_1, GEMINI_API_KEY_2, ... stop at the first gap
        let mut api_keys: Vec<String> = (1..)
            .map(|i| lookup.non_empty(&format!("GEMINI_API_KEY_{}", i)))
            .take_while(Option::is_some)
            .flatten()
            .collect();

        if let Some(list) = lookup.non_empty("GEMINI_API_KEYS") {
            api_keys.extend(
                list.split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string),
            );
        }

        if api_keys.is_empty() {
            return Err(anyhow!(
                "Missing Gemini API keys: set GEMINI_API_KEY_1 (and _2, ...) or GEMINI_API_KEYS"
            ));
        }

        Ok(GeminiConfig {
            api_keys,
            api_url: lookup.required("GEMINI_API_URL")?,
        })
    }
}

impl ChatConfig {
    fn load(lookup: &impl Lookup) -> Result<Self> {
        Ok(ChatConfig {
            api_key: lookup.required("OPENROUTER_API_KEY")?,
            api_url: lookup.required("OPENROUTER_API_URL")?,
            model: lookup.or_default("OPENROUTER_MODEL", DEFAULT_CHAT_MODEL),
            referer: lookup.or_default("OPENROUTER_REFERER", "http://localhost:3000"),
            title: lookup.or_default("OPENROUTER_TITLE", "QuizMaster"),
        })
    }
}

impl HttpConfig {
    fn load(lookup: &impl Lookup) -> Result<Self> {
        Ok(HttpConfig {
            timeout_secs: lookup.parsed("HTTP_TIMEOUT_SECS", 60u64)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl UploadConfig {
    fn load(lookup: &impl Lookup) -> Result<Self> {
        let directory = lookup
            .non_empty("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("quizmaster_uploads"));

        Ok(UploadConfig {
            directory,
            max_bytes: lookup.parsed("MAX_UPLOAD_BYTES", 20 * 1024 * 1024usize)?,
        })
    }
}

impl ServerConfig {
    fn load(lookup: &impl Lookup) -> Result<Self> {
        let port = lookup
            .parsed("PORT", 8080u16)
            .map_err(|e| anyhow!("{}. Must be a number between 1-65535", e))?;

        Ok(ServerConfig {
            port,
            host: lookup.or_default("HOST", "0.0.0.0"),
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl LoggingConfig {
    fn load(lookup: &impl Lookup) -> Result<Self> {
        Ok(LoggingConfig {
            level: lookup.or_default("RUST_LOG", "info,quizmaster=debug"),
            file_enabled: lookup.parsed("LOG_FILE_ENABLED", true).unwrap_or(true),
            console_enabled: lookup.parsed("LOG_CONSOLE_ENABLED", true).unwrap_or(true),
            log_directory: lookup.or_default("LOG_DIRECTORY", "logs"),
        })
    }
}

/// Mask sensitive data in configuration for safe logging
fn mask_sensitive_data(data: &str) -> String {
    let chars: Vec<char> = data.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}***{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GEMINI_API_KEY_1", "gemini-one"),
            ("GEMINI_API_KEY_2", "gemini-two"),
            ("GEMINI_API_URL", "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"),
            ("OPENROUTER_API_KEY", "sk-or-123456789"),
            ("OPENROUTER_API_URL", "https://openrouter.ai/api/v1/chat/completions"),
        ]
    }

    #[test]
    fn test_mask_sensitive_data() {
        assert_eq!(mask_sensitive_data("short"), "*****");
        assert_eq!(mask_sensitive_data("sk-1234567890abcdef"), "sk-1***cdef");
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = Config::from_lookup(lookup_from(&minimal())).unwrap();

        assert_eq!(config.gemini.api_keys, vec!["gemini-one", "gemini-two"]);
        assert_eq!(config.chat.model, DEFAULT_CHAT_MODEL);
        assert_eq!(config.chat.referer, "http://localhost:3000");
        assert_eq!(config.chat.title, "QuizMaster");
        assert_eq!(config.http.timeout(), Duration::from_secs(60));
        assert_eq!(config.uploads.max_bytes, 20 * 1024 * 1024);
        assert!(config.uploads.directory.ends_with("quizmaster_uploads"));
        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert_eq!(config.logging.level, "info,quizmaster=debug");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_numbered_keys_stop_at_gap_and_merge_with_list() {
        let mut pairs = minimal();
        pairs.push(("GEMINI_API_KEY_4", "unreachable"));
        pairs.push(("GEMINI_API_KEYS", " extra-a, ,extra-b "));

        let config = Config::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(
            config.gemini.api_keys,
            vec!["gemini-one", "gemini-two", "extra-a", "extra-b"]
        );
    }

    #[test]
    fn test_missing_required_values_are_fatal() {
        for missing in ["GEMINI_API_URL", "OPENROUTER_API_KEY", "OPENROUTER_API_URL"] {
            let pairs: Vec<_> = minimal().into_iter().filter(|(k, _)| *k != missing).collect();
            let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
            assert!(err.to_string().contains(missing), "{}", err);
        }

        let pairs: Vec<_> = minimal()
            .into_iter()
            .filter(|(k, _)| !k.starts_with("GEMINI_API_KEY"))
            .collect();
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_blank_required_value_counts_as_missing() {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| *k != "OPENROUTER_API_KEY");
        pairs.push(("OPENROUTER_API_KEY", "   "));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let mut pairs = minimal();
        pairs.push(("PORT", "not-a-number"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = minimal();
        pairs.push(("HTTP_TIMEOUT_SECS", "soon"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = Config::from_lookup(lookup_from(&minimal())).unwrap();

        let mut invalid = config.clone();
        invalid.server.port = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = config.clone();
        invalid.gemini.api_url = "generativelanguage.googleapis.com".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = config;
        invalid.http.timeout_secs = 0;
        assert!(invalid.validate().is_err());
    }
}
