//! Configuration module for the rewards bot.
//!
//! Loads configuration from environment variables (and `.env`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Bot running mode
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Point amounts and limits for every way of earning or spending points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardConfig {
    /// Points for one completed ad.
    pub ad: i64,
    /// Points for the daily claim.
    pub daily: i64,
    /// Upper bound (inclusive) of a lucky spin.
    pub spin_max: i64,
    /// Points credited to the referrer per new user.
    pub referral: i64,
    /// Default points for a correct quiz answer.
    pub quiz: i64,
    /// Minimum withdrawal amount.
    pub min_withdraw: i64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            ad: 10,
            daily: 20,
            spin_max: 100,
            referral: 50,
            quiz: 15,
            min_withdraw: 100,
        }
    }
}

/// Ad network settings for the watch page.
#[derive(Debug, Clone)]
pub struct AdConfig {
    /// SDK used when no ad row is active.
    pub fallback_script_url: String,
    /// JS function exposed by the fallback SDK.
    pub fallback_show_fn: String,
    /// A session cannot be redeemed earlier than this after issuing.
    pub min_watch: Duration,
    /// Unredeemed sessions are dropped after this.
    pub session_ttl: Duration,
}

impl Default for AdConfig {
    fn default() -> Self {
        Self {
            fallback_script_url: "https://ad.gigapub.tech/script?id=1669".to_string(),
            fallback_show_fn: "showGiga".to_string(),
            min_watch: Duration::from_secs(5),
            session_ttl: Duration::from_secs(900),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,

    /// Bot username (without @) for referral links.
    /// Optional - will be fetched via getMe if not set.
    pub bot_username: Option<String>,

    /// Owner user IDs (comma-separated).
    /// These users can approve withdrawals from Telegram.
    pub owner_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    // Web
    pub admin_key: String,
    pub domain: String,
    pub port: u16,

    pub rewards: RewardConfig,
    pub ads: AdConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_mode = match var("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            Some("webhook") => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = var("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let owner_ids = var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let bot_username = var("BOT_USERNAME")
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let defaults = RewardConfig::default();
        let rewards = RewardConfig {
            ad: parse_or(&var, "REWARD_AD", defaults.ad)?,
            daily: parse_or(&var, "REWARD_DAILY", defaults.daily)?,
            spin_max: parse_or(&var, "REWARD_SPIN_MAX", defaults.spin_max)?,
            referral: parse_or(&var, "REWARD_REFERRAL", defaults.referral)?,
            quiz: parse_or(&var, "REWARD_QUIZ", defaults.quiz)?,
            min_withdraw: parse_or(&var, "MIN_WITHDRAW", defaults.min_withdraw)?,
        };
        if rewards.spin_max < 0 || rewards.min_withdraw <= 0 {
            bail!("REWARD_SPIN_MAX must be >= 0 and MIN_WITHDRAW must be > 0");
        }

        let ad_defaults = AdConfig::default();
        let ads = AdConfig {
            fallback_script_url: var("AD_SCRIPT_URL").unwrap_or(ad_defaults.fallback_script_url),
            fallback_show_fn: var("AD_SHOW_FN").unwrap_or(ad_defaults.fallback_show_fn),
            min_watch: Duration::from_secs(parse_or(
                &var,
                "AD_MIN_WATCH_SECS",
                ad_defaults.min_watch.as_secs(),
            )?),
            session_ttl: Duration::from_secs(parse_or(
                &var,
                "AD_SESSION_TTL_SECS",
                ad_defaults.session_ttl.as_secs(),
            )?),
        };

        Ok(Self {
            bot_token: var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            bot_mode,
            webhook_url,
            webhook_secret: var("WEBHOOK_SECRET"),
            bot_username,
            owner_ids,
            mongodb_uri: var("MONGODB_URI").context("MONGODB_URI must be set")?,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "poinbot".to_string()),
            admin_key: var("ADMIN_KEY").unwrap_or_else(|| "admin123".to_string()),
            domain: var("DOMAIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            port: parse_or(&var, "PORT", 3000)?,
            rewards,
            ads,
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
        ]))
        .unwrap();

        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.admin_key, "admin123");
        assert_eq!(config.domain, "http://localhost:3000");
        assert_eq!(config.port, 3000);
        assert_eq!(config.mongodb_database, "poinbot");
        assert_eq!(config.rewards, RewardConfig::default());
        assert_eq!(config.ads.fallback_show_fn, "showGiga");
    }

    #[test]
    fn test_missing_token() {
        let err = Config::from_lookup(lookup(&[("MONGODB_URI", "mongodb://localhost")]))
            .unwrap_err();
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    fn test_webhook_requires_url() {
        let result = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("BOT_MODE", "webhook"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("OWNER_IDS", "1, 2,x,3"),
            ("BOT_USERNAME", "@poin_bot"),
            ("DOMAIN", "https://poin.example/"),
            ("REWARD_DAILY", "25"),
            ("MIN_WITHDRAW", "500"),
        ]))
        .unwrap();

        assert_eq!(config.owner_ids, vec![1, 2, 3]);
        assert_eq!(config.bot_username.as_deref(), Some("poin_bot"));
        assert_eq!(config.domain, "https://poin.example");
        assert_eq!(config.rewards.daily, 25);
        assert_eq!(config.rewards.min_withdraw, 500);
    }

    #[test]
    fn test_invalid_number() {
        let err = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }
}
