//! Configuration types, built from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig, RetryConfig};
use crate::mentor::response::ResponderConfig;
use crate::mentor::state::DEFAULT_SUGGESTION_CAP;

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Conversation tuning.
#[derive(Debug, Clone)]
pub struct MentorConfig {
    /// Suggestion turns before the conversation wraps up.
    pub suggestion_cap: u32,
    /// Log entries included as context in response prompts.
    pub history_window: usize,
    /// Sampling temperature for response turns.
    pub temperature: f32,
    /// Token limit for response turns.
    pub max_tokens: u32,
    /// Bound on every model call.
    pub llm_timeout: Duration,
    /// Sessions idle longer than this are dropped. `None` keeps them forever.
    pub session_idle: Option<Duration>,
}

impl Default for MentorConfig {
    fn default() -> Self {
        Self {
            suggestion_cap: DEFAULT_SUGGESTION_CAP,
            history_window: 6,
            temperature: 0.7,
            max_tokens: 400,
            llm_timeout: Duration::from_secs(30),
            session_idle: None,
        }
    }
}

impl MentorConfig {
    pub fn responder_config(&self) -> ResponderConfig {
        ResponderConfig {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            history_window: self.history_window,
            timeout: self.llm_timeout,
        }
    }

    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let suggestion_cap = parse_or(get, "HOBBY_MENTOR_SUGGESTION_CAP", defaults.suggestion_cap)?;
        if suggestion_cap == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HOBBY_MENTOR_SUGGESTION_CAP".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let temperature: f32 = parse_or(get, "HOBBY_MENTOR_TEMPERATURE", defaults.temperature)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "HOBBY_MENTOR_TEMPERATURE".to_string(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let timeout_secs: u64 = parse_or(get, "HOBBY_MENTOR_LLM_TIMEOUT_SECS", 30)?;
        let idle_secs: Option<u64> = parse_opt(get, "HOBBY_MENTOR_SESSION_IDLE_SECS")?;

        Ok(Self {
            suggestion_cap,
            history_window: parse_or(get, "HOBBY_MENTOR_HISTORY_WINDOW", defaults.history_window)?,
            temperature,
            max_tokens: defaults.max_tokens,
            llm_timeout: Duration::from_secs(timeout_secs),
            session_idle: idle_secs.filter(|s| *s > 0).map(Duration::from_secs),
        })
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as the frontend fallback route.
    pub static_dir: Option<PathBuf>,
    /// Directory for daily rolling log files.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: None,
            log_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::InvalidValue {
                key: "HOBBY_MENTOR_HOST".to_string(),
                message: format!("{}: {e}", self.host),
            })
    }

    fn from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            host: get("HOBBY_MENTOR_HOST").unwrap_or(defaults.host),
            port: parse_or(get, "HOBBY_MENTOR_PORT", defaults.port)?,
            static_dir: get("HOBBY_MENTOR_STATIC_DIR").map(PathBuf::from),
            log_dir: get("HOBBY_MENTOR_LOG_DIR").map(PathBuf::from),
        })
    }
}

/// Everything the binary needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub mentor: MentorConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Treat blank values as unset.
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let retry = RetryConfig {
            max_retries: parse_or(&get, "HOBBY_MENTOR_LLM_MAX_RETRIES", 2)?,
            ..RetryConfig::default()
        };

        Ok(Self {
            server: ServerConfig::from_lookup(&get)?,
            mentor: MentorConfig::from_lookup(&get)?,
            llm: llm_from_lookup(&get)?,
            retry,
        })
    }
}

fn llm_from_lookup(get: &impl Fn(&str) -> Option<String>) -> Result<LlmConfig, ConfigError> {
    let anthropic_key = get("ANTHROPIC_API_KEY");
    let openai_key = get("OPENAI_API_KEY");

    let backend = match get("HOBBY_MENTOR_BACKEND") {
        Some(name) => {
            LlmBackend::from_str(&name).map_err(|message| ConfigError::InvalidValue {
                key: "HOBBY_MENTOR_BACKEND".to_string(),
                message,
            })?
        }
        None if anthropic_key.is_none() && openai_key.is_some() => LlmBackend::OpenAi,
        None => LlmBackend::Anthropic,
    };

    let (key_var, key, default_model) = match backend {
        LlmBackend::Anthropic => ("ANTHROPIC_API_KEY", anthropic_key, DEFAULT_ANTHROPIC_MODEL),
        LlmBackend::OpenAi => ("OPENAI_API_KEY", openai_key, DEFAULT_OPENAI_MODEL),
    };
    let api_key = key.ok_or_else(|| ConfigError::MissingRequired {
        key: key_var.to_string(),
        hint: format!("export {key_var}=... (or set HOBBY_MENTOR_BACKEND)"),
    })?;

    Ok(LlmConfig {
        backend,
        api_key: SecretString::from(api_key),
        model: get("HOBBY_MENTOR_MODEL").unwrap_or_else(|| default_model.to_string()),
    })
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("'{raw}': {e}"),
            })
        })
        .transpose()
}
