//! Runtime configuration read once at startup.
//!
//! Nothing here runs at module load; callers build a [`Config`] and pass
//! the pieces they need into service constructors.

use chrono_tz::Tz;

use crate::error::{AppError, ConfigError, Result};
use crate::store::MAX_QUERY_LIMIT;
use crate::timestamp::{parse_timezone, DEFAULT_TIMEZONE};

pub const DEFAULT_WINDOW_DAYS: u32 = 3;
pub const DEFAULT_QUERY_LIMIT: usize = MAX_QUERY_LIMIT;

/// Settings the digest job needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DigestSettings {
    pub timezone: Tz,
    pub window_days: u32,
    pub query_limit: usize,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            window_days: DEFAULT_WINDOW_DAYS,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Config {
    pub llm_api_key: String,
    pub notion_api_key: String,
    pub notion_database_id: String,
    pub line_channel_secret: String,
    pub line_channel_access_token: String,
    pub line_user_id: Option<String>,
    pub cron_secret_token: Option<String>,
    pub digest: DigestSettings,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("notion_database_id", &self.notion_database_id)
            .field("line_user_id", &self.line_user_id)
            .field("cron_secret_token", &self.cron_secret_token.as_ref().map(|_| "***"))
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Load from process environment variables
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| optional(key).ok_or(ConfigError::Missing(key));

        let mut digest = DigestSettings::default();
        if let Some(tz) = optional("TASK_TIMEZONE") {
            digest.timezone = parse_timezone(&tz).ok_or_else(|| ConfigError::Invalid {
                key: "TASK_TIMEZONE",
                reason: format!("unknown timezone '{tz}'"),
            })?;
        }
        if let Some(days) = optional("DIGEST_WINDOW_DAYS") {
            digest.window_days = days.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "DIGEST_WINDOW_DAYS",
                reason: format!("'{days}': {e}"),
            })?;
        }
        if let Some(limit) = optional("DIGEST_QUERY_LIMIT") {
            let parsed: usize = limit.trim().parse().map_err(|e| ConfigError::Invalid {
                key: "DIGEST_QUERY_LIMIT",
                reason: format!("'{limit}': {e}"),
            })?;
            if !(1..=MAX_QUERY_LIMIT).contains(&parsed) {
                return Err(ConfigError::Invalid {
                    key: "DIGEST_QUERY_LIMIT",
                    reason: format!("must be between 1 and {MAX_QUERY_LIMIT}"),
                });
            }
            digest.query_limit = parsed;
        }

        Ok(Self {
            llm_api_key: required("LLM_API_KEY")?,
            notion_api_key: required("NOTION_API_KEY")?,
            notion_database_id: required("NOTION_DATABASE_ID")?,
            line_channel_secret: required("LINE_CHANNEL_SECRET")?,
            line_channel_access_token: required("LINE_CHANNEL_ACCESS_TOKEN")?,
            line_user_id: optional("LINE_USER_ID"),
            cron_secret_token: optional("CRON_SECRET_TOKEN"),
            digest,
        })
    }

    /// Check the token presented by the scheduler
    pub fn verify_cron_token(&self, token: &str) -> Result<()> {
        let expected = self
            .cron_secret_token
            .as_deref()
            .ok_or(ConfigError::Missing("CRON_SECRET_TOKEN"))?;
        if token != expected {
            return Err(AppError::Unauthorized("invalid cron token".to_string()));
        }
        Ok(())
    }

    /// Recipient of the daily digest
    pub fn digest_recipient(&self) -> std::result::Result<&str, ConfigError> {
        self.line_user_id
            .as_deref()
            .ok_or(ConfigError::Missing("LINE_USER_ID"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("LLM_API_KEY", "llm"),
            ("NOTION_API_KEY", "notion"),
            ("NOTION_DATABASE_ID", "db"),
            ("LINE_CHANNEL_SECRET", "secret"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "token"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> std::result::Result<Config, ConfigError> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();
        assert_eq!(config.digest, DigestSettings::default());
        assert_eq!(config.digest.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.line_user_id, None);
    }

    #[test]
    fn test_missing_required_key() {
        let mut env = base_env();
        env.remove("NOTION_DATABASE_ID");
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing("NOTION_DATABASE_ID"));

        let mut env = base_env();
        env.insert("LLM_API_KEY", "  ");
        assert_eq!(load(&env).unwrap_err(), ConfigError::Missing("LLM_API_KEY"));
    }

    #[test]
    fn test_digest_overrides() {
        let mut env = base_env();
        env.insert("TASK_TIMEZONE", "Europe/Moscow");
        env.insert("DIGEST_WINDOW_DAYS", "7");
        env.insert("DIGEST_QUERY_LIMIT", "50");
        let config = load(&env).unwrap();
        assert_eq!(config.digest.timezone, chrono_tz::Europe::Moscow);
        assert_eq!(config.digest.window_days, 7);
        assert_eq!(config.digest.query_limit, 50);
    }

    #[test]
    fn test_invalid_values() {
        let mut env = base_env();
        env.insert("TASK_TIMEZONE", "Nowhere/City");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { key: "TASK_TIMEZONE", .. })));

        let mut env = base_env();
        env.insert("DIGEST_WINDOW_DAYS", "-1");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { key: "DIGEST_WINDOW_DAYS", .. })));

        let mut env = base_env();
        env.insert("DIGEST_QUERY_LIMIT", "1000");
        assert!(matches!(load(&env), Err(ConfigError::Invalid { key: "DIGEST_QUERY_LIMIT", .. })));
    }

    #[test]
    fn test_verify_cron_token() {
        let mut env = base_env();
        let config = load(&env).unwrap();
        assert!(matches!(
            config.verify_cron_token("x"),
            Err(AppError::Config(ConfigError::Missing("CRON_SECRET_TOKEN")))
        ));

        env.insert("CRON_SECRET_TOKEN", "s3cret");
        let config = load(&env).unwrap();
        assert!(config.verify_cron_token("s3cret").is_ok());
        assert!(matches!(config.verify_cron_token("nope"), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mut env = base_env();
        env.insert("CRON_SECRET_TOKEN", "s3cret");
        let rendered = format!("{:?}", load(&env).unwrap());
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("\"llm\""));
        assert!(!rendered.contains("\"secret\""));
    }
}
