// src/config.rs
use crate::dedup::DEFAULT_DUPLICATE_THRESHOLD;
use std::env;
use tracing::warn;

pub const DEFAULT_START_URL: &str = "https://avval.ir/";
const DEFAULT_DB_PATH: &str = "data/directory.db";
const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (compatible; DirectoryScraper/1.0)";

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory root the crawl starts from (`START_URL`).
    pub start_url: String,
    /// SQLite database file (`DB_PATH`).
    pub db_path: String,
    /// Consecutive-duplicate run length that abandons a scope
    /// (`DUPLICATE_THRESHOLD`).
    pub duplicate_threshold: u32,
    /// Bound on element waits, in seconds (`WAIT_TIMEOUT_SECS`).
    pub wait_timeout_secs: u64,
    /// Debug toggle (`DEBUG`): verbose substrate logging and relaxed
    /// timeouts. Never changes extraction semantics.
    pub debug: bool,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub verbose: bool,
}

impl Config {
    /// Build the configuration from environment variables, falling back to
    /// the documented defaults. `.env` is loaded by `main` before this runs.
    pub fn from_env() -> Self {
        let debug = env::var("DEBUG")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(false);

        let request_timeout_secs = env_or("REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            start_url: env::var("START_URL").unwrap_or_else(|_| DEFAULT_START_URL.to_string()),
            db_path: env::var("DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string()),
            duplicate_threshold: env_or("DUPLICATE_THRESHOLD", DEFAULT_DUPLICATE_THRESHOLD),
            wait_timeout_secs: env_or("WAIT_TIMEOUT_SECS", DEFAULT_WAIT_TIMEOUT_SECS),
            debug,
            browser: BrowserConfig {
                user_agent: USER_AGENT.to_string(),
                // Debug runs tolerate slower pages rather than bailing early.
                request_timeout_secs: if debug {
                    request_timeout_secs * 2
                } else {
                    request_timeout_secs
                },
                verbose: debug,
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparsable {}={}", key, raw);
            default
        }),
        Err(_) => default,
    }
}
