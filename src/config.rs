//! Environment-backed configuration.
//!
//! Built once at startup and passed into constructors; request handlers
//! never read the environment themselves. Missing required credentials
//! abort startup instead of letting the bot limp along unable to reply.

use crate::error::{ConfigError, Result};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: String,
    /// OpenAI API key for script generation.
    pub openai_api_key: String,
    /// Token gating the read-only diagnostics endpoint. Unset disables it.
    pub admin_token: Option<String>,
    /// Webhook listening port.
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = require(&lookup, "BOT_TOKEN")?;
        let openai_api_key = require(&lookup, "OPENAI_API_KEY")?;
        let admin_token = optional(&lookup, "ADMIN_TOKEN");
        let port = match optional(&lookup, "PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            bot_token,
            openai_api_key,
            admin_token,
            port,
        })
    }
}

/// Empty and whitespace-only values count as unset.
fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn require(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<String> {
    optional(lookup, name).ok_or_else(|| ConfigError::MissingVar(name).into())
}
