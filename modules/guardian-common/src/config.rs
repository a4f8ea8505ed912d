use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::GuardianError;

/// Application configuration loaded from environment variables.
/// Every remote dependency is optional: an unset credential or list URL
/// degrades the matching signal instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Platform metadata (YouTube Data API)
    pub youtube_api_key: Option<String>,
    pub platform_timeout: Duration,

    // Model inference service
    pub model_service_url: String,
    pub model_timeout: Duration,

    // External reputation lists
    pub block_list_url: Option<String>,
    pub warn_list_url: Option<String>,
    pub reputation_timeout: Duration,

    // Storage / scoring
    pub history_cap: usize,
    pub scoring_policy_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube_api_key: None,
            platform_timeout: Duration::from_secs(5),
            model_service_url: "http://localhost:8010".to_string(),
            model_timeout: Duration::from_secs(8),
            block_list_url: None,
            warn_list_url: None,
            reputation_timeout: Duration::from_secs(5),
            history_cap: 100,
            scoring_policy_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment (after reading `.env`, if present).
    pub fn from_env() -> Result<Self, GuardianError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GuardianError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            youtube_api_key: get("YOUTUBE_API_KEY"),
            platform_timeout: seconds(&get, "PLATFORM_TIMEOUT_SECONDS", defaults.platform_timeout)?,
            model_service_url: get("MODEL_SERVICE_URL").unwrap_or(defaults.model_service_url),
            model_timeout: seconds(&get, "MODEL_TIMEOUT_SECONDS", defaults.model_timeout)?,
            block_list_url: get("REPUTATION_BLOCK_LIST_URL"),
            warn_list_url: get("REPUTATION_WARN_LIST_URL"),
            reputation_timeout: seconds(
                &get,
                "REPUTATION_TIMEOUT_SECONDS",
                defaults.reputation_timeout,
            )?,
            history_cap: parsed(&get, "HISTORY_CAP")?.unwrap_or(defaults.history_cap),
            scoring_policy_path: get("SCORING_POLICY_PATH").map(PathBuf::from),
        })
    }

    /// Log loaded configuration with secrets truncated.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(5).collect();
            format!("{}...({} chars)", head, val.len())
        }
        fn preview_opt(val: &Option<String>) -> String {
            match val {
                Some(v) => preview(v),
                None => "<not set>".to_string(),
            }
        }

        tracing::info!("Config loaded:");
        tracing::info!("  YOUTUBE_API_KEY: {}", preview_opt(&self.youtube_api_key));
        tracing::info!("  MODEL_SERVICE_URL: {}", self.model_service_url);
        tracing::info!("  MODEL_TIMEOUT_SECONDS: {}", self.model_timeout.as_secs());
        tracing::info!("  PLATFORM_TIMEOUT_SECONDS: {}", self.platform_timeout.as_secs());
        tracing::info!(
            "  REPUTATION_BLOCK_LIST_URL: {}",
            self.block_list_url.as_deref().unwrap_or("<not set>")
        );
        tracing::info!(
            "  REPUTATION_WARN_LIST_URL: {}",
            self.warn_list_url.as_deref().unwrap_or("<not set>")
        );
        tracing::info!("  HISTORY_CAP: {}", self.history_cap);
    }
}

fn parsed<T, G>(get: &G, key: &str) -> Result<Option<T>, GuardianError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|_| GuardianError::Config(format!("{key} must be a number, got '{v}'")))
        })
        .transpose()
}

fn seconds<G>(get: &G, key: &str, default: Duration) -> Result<Duration, GuardianError>
where
    G: Fn(&str) -> Option<String>,
{
    Ok(parsed::<u64, G>(get, key)?
        .map(Duration::from_secs)
        .unwrap_or(default))
}
