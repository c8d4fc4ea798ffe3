//! Configuration and settings management
//!
//! Loads settings from config files and environment variables.

use crate::fetchers::ChatGptCredentials;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Chat the bot's commands are registered in
    pub home_chat_id: i64,

    /// Comma-separated list of moderator user IDs (they get public replies)
    #[serde(rename = "moderators")]
    pub moderators_str: Option<String>,

    /// Bearer token for the chat-completion proxy
    pub chatgpt_api_key: Option<String>,
    /// Base URL of the chat-completion proxy
    pub chatgpt_api_endpoint: Option<String>,
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use cosmo_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Not checked into git
            .add_source(File::with_name("config/local").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            // UPPER_SNAKE_CASE is mapped to snake_case; empty vars count as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }

    /// Returns a set of Telegram IDs treated as moderators
    #[must_use]
    pub fn moderators(&self) -> HashSet<i64> {
        self.moderators_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Chat-completion credentials, if both the key and the endpoint are set
    #[must_use]
    pub fn chatgpt_credentials(&self) -> Option<ChatGptCredentials> {
        match (&self.chatgpt_api_key, &self.chatgpt_api_endpoint) {
            (Some(key), Some(endpoint)) if !key.is_empty() && !endpoint.is_empty() => {
                Some(ChatGptCredentials::new(key, endpoint))
            }
            _ => None,
        }
    }
}

/// Maximum number of entries kept by each fetcher cache.
pub const FETCH_CACHE_MAX_CAPACITY: u64 = 1024;

/// Get fetcher cache capacity from env or default.
///
/// Environment variable: `FETCH_CACHE_MAX_CAPACITY`. Values below 1 or
/// unparsable values fall back to the default.
#[must_use]
pub fn get_fetch_cache_max_capacity() -> u64 {
    parse_cache_capacity(std::env::var("FETCH_CACHE_MAX_CAPACITY").ok().as_deref())
}

fn parse_cache_capacity(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&capacity| capacity >= 1)
        .unwrap_or(FETCH_CACHE_MAX_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn settings() -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            home_chat_id: -100,
            moderators_str: None,
            chatgpt_api_key: None,
            chatgpt_api_endpoint: None,
        }
    }

    #[test]
    fn test_moderator_list_parsing() {
        let mut settings = settings();
        assert!(settings.moderators().is_empty());

        settings.moderators_str = Some("123,456".to_string());
        let mods = settings.moderators();
        assert!(mods.contains(&123));
        assert!(mods.contains(&456));
        assert_eq!(mods.len(), 2);

        settings.moderators_str = Some("333; 444 555".to_string());
        assert_eq!(settings.moderators().len(), 3);

        settings.moderators_str = Some("abc, 777".to_string());
        let mods = settings.moderators();
        assert!(mods.contains(&777));
        assert_eq!(mods.len(), 1);
    }

    #[test]
    fn test_chatgpt_credentials_require_key_and_endpoint() {
        let mut settings = settings();
        assert!(settings.chatgpt_credentials().is_none());

        settings.chatgpt_api_key = Some("key".to_string());
        assert!(settings.chatgpt_credentials().is_none());

        settings.chatgpt_api_endpoint = Some(String::new());
        assert!(settings.chatgpt_credentials().is_none());

        settings.chatgpt_api_endpoint = Some("https://chat.example".to_string());
        assert!(settings.chatgpt_credentials().is_some());
    }

    #[test]
    fn test_cache_capacity_parsing() {
        assert_eq!(parse_cache_capacity(None), FETCH_CACHE_MAX_CAPACITY);
        assert_eq!(parse_cache_capacity(Some("64")), 64);
        assert_eq!(parse_cache_capacity(Some(" 8 ")), 8);
        // zero would turn every cache into a pass-through
        assert_eq!(parse_cache_capacity(Some("0")), FETCH_CACHE_MAX_CAPACITY);
        assert_eq!(parse_cache_capacity(Some("-5")), FETCH_CACHE_MAX_CAPACITY);
        assert_eq!(parse_cache_capacity(Some("abc")), FETCH_CACHE_MAX_CAPACITY);
        assert_eq!(parse_cache_capacity(Some("")), FETCH_CACHE_MAX_CAPACITY);
    }

    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        env::set_var("HOME_CHAT_ID", "-1001234");
        env::set_var("MODERATORS", "1,2");

        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.home_chat_id, -1_001_234);
        assert_eq!(settings.moderators().len(), 2);

        env::remove_var("TELEGRAM_TOKEN");
        env::remove_var("HOME_CHAT_ID");
        env::remove_var("MODERATORS");
        Ok(())
    }
}
