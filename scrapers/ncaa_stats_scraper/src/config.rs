use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RateLimits {
    /// Pause before every player page request.
    pub request_delay_secs: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            request_delay_secs: 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScrapingConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Budget for establishing the TCP/TLS connection alone.
    pub connect_timeout_secs: u64,
    /// Total connection attempts per page, including the first one.
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (compatible; NcaaStatsScraper/0.1)".to_string(),
            request_timeout_secs: 180,
            connect_timeout_secs: 30,
            max_attempts: 5,
            retry_delay_secs: 30,
        }
    }
}

impl ScrapingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Appended to every artifact name, e.g. `per_game_raw_stats_log_round_2.jsonl`.
    pub suffix: String,
    /// Number of processed players between checkpoints.
    pub checkpoint_interval: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("scrape_output"),
            suffix: "round_2".to_string(),
            checkpoint_interval: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    pub rate_limits: RateLimits,
    pub scraping: ScrapingConfig,
    pub output: OutputConfig,
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(delay) = env::var("RATE_LIMIT_DELAY_SECS").map_or(Ok(None), |d| d.parse::<u64>().map(Some)) {
            if let Some(delay) = delay {
                config.rate_limits.request_delay_secs = delay;
            }
        }
        if let Ok(user_agent) = env::var("SCRAPER_USER_AGENT") {
            config.scraping.user_agent = user_agent;
        }
        if let Ok(timeout) = env::var("SCRAPER_TIMEOUT_SECS").map_or(Ok(None), |t| t.parse::<u64>().map(Some)) {
            if let Some(timeout) = timeout {
                config.scraping.request_timeout_secs = timeout;
            }
        }
        if let Ok(timeout) = env::var("SCRAPER_CONNECT_TIMEOUT_SECS").map_or(Ok(None), |t| t.parse::<u64>().map(Some)) {
            if let Some(timeout) = timeout {
                config.scraping.connect_timeout_secs = timeout;
            }
        }
        if let Ok(attempts) = env::var("SCRAPER_MAX_ATTEMPTS").map_or(Ok(None), |a| a.parse::<u32>().map(Some)) {
            if let Some(attempts) = attempts {
                config.scraping.max_attempts = attempts.max(1);
            }
        }
        if let Ok(delay) = env::var("SCRAPER_RETRY_DELAY_SECS").map_or(Ok(None), |d| d.parse::<u64>().map(Some)) {
            if let Some(delay) = delay {
                config.scraping.retry_delay_secs = delay;
            }
        }
        if let Ok(dir) = env::var("SCRAPER_OUTPUT_DIR") {
            config.output.dir = PathBuf::from(dir);
        }
        if let Ok(suffix) = env::var("SCRAPER_OUTPUT_SUFFIX") {
            config.output.suffix = suffix;
        }
        if let Ok(interval) = env::var("CHECKPOINT_INTERVAL").map_or(Ok(None), |i| i.parse::<usize>().map(Some)) {
            if let Some(interval) = interval {
                config.output.checkpoint_interval = interval.max(1);
            }
        }

        config
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.rate_limits.request_delay_secs)
    }
}
