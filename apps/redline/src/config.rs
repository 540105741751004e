//! Configuration management for Redline

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::outline::SectionStrategy;
use crate::scroll::RetryPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub review: ReviewConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewConfig {
    pub scroll: ScrollConfig,
    pub save_timeout_ms: u64,
    pub hover_delay_ms: u64,
    pub section_strategy: SectionStrategy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrollConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
    pub leading_margin_px: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL; annotations stay in memory when unset
    pub url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            review: ReviewConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        ReviewConfig {
            scroll: ScrollConfig::default(),
            save_timeout_ms: 10_000,
            hover_delay_ms: 300,
            section_strategy: SectionStrategy::Bands,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        ScrollConfig {
            max_attempts: 10,
            interval_ms: 100,
            leading_margin_px: 80.0,
        }
    }
}

impl ReviewConfig {
    pub fn save_timeout(&self) -> Duration {
        Duration::from_millis(self.save_timeout_ms)
    }

    pub fn hover_delay(&self) -> Duration {
        Duration::from_millis(self.hover_delay_ms)
    }
}

impl ScrollConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}

impl Config {
    /// Read configuration from the environment; malformed values use defaults
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = Config::default();
        let scroll = defaults.review.scroll;

        Ok(Config {
            review: ReviewConfig {
                scroll: ScrollConfig {
                    max_attempts: env_or("REDLINE_SCROLL_MAX_ATTEMPTS", scroll.max_attempts),
                    interval_ms: env_or("REDLINE_SCROLL_INTERVAL_MS", scroll.interval_ms),
                    leading_margin_px: env_or("REDLINE_SCROLL_MARGIN_PX", scroll.leading_margin_px),
                },
                save_timeout_ms: env_or("REDLINE_SAVE_TIMEOUT_MS", defaults.review.save_timeout_ms),
                hover_delay_ms: env_or("REDLINE_HOVER_DELAY_MS", defaults.review.hover_delay_ms),
                section_strategy: env::var("REDLINE_SECTION_STRATEGY")
                    .ok()
                    .and_then(|name| SectionStrategy::from_name(&name))
                    .unwrap_or(defaults.review.section_strategy),
            },
            database: DatabaseConfig {
                url: match env::var("DATABASE_URL") {
                    Ok(url) if !url.trim().is_empty() => Some(url),
                    Ok(_) | Err(env::VarError::NotPresent) => None,
                    Err(e) => return Err(e),
                },
            },
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.review.scroll.retry_policy(), RetryPolicy::default());
        assert_eq!(config.review.save_timeout(), Duration::from_secs(10));
        assert_eq!(config.review.section_strategy, SectionStrategy::Bands);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_from_env_overrides_and_fallbacks() {
        env::set_var("REDLINE_SCROLL_MAX_ATTEMPTS", "4");
        env::set_var("REDLINE_HOVER_DELAY_MS", "not-a-number");
        env::set_var("REDLINE_SECTION_STRATEGY", "Offsets");

        let config = Config::from_env().unwrap();
        assert_eq!(config.review.scroll.max_attempts, 4);
        assert_eq!(config.review.hover_delay_ms, 300);
        assert_eq!(config.review.section_strategy, SectionStrategy::Offsets);

        env::remove_var("REDLINE_SCROLL_MAX_ATTEMPTS");
        env::remove_var("REDLINE_HOVER_DELAY_MS");
        env::remove_var("REDLINE_SECTION_STRATEGY");
    }
}
