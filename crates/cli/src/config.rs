use std::time::Duration;

use promptbatch_core::export::ExportFormat;
use promptbatch_engine::EngineConfig;
use promptbatch_provider::ProviderConfig;

/// CLI configuration loaded from environment variables.
///
/// All fields except the provider URL have defaults suitable for a first
/// run against a staging provider.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Provider base URL (required, `PROVIDER_URL`).
    pub provider_url: String,
    /// Bearer token for the provider, if any (`PROVIDER_API_KEY`).
    pub provider_api_key: Option<String>,
    /// Client-side timeout per provider request, in seconds.
    pub request_timeout_secs: u64,
    /// Maximum simultaneously in-flight items.
    pub concurrency_limit: usize,
    /// Retries per item after its first attempt.
    pub max_retries: u32,
    /// Minimum delay between admissions, in milliseconds.
    pub throttle_ms: u64,
    /// Delay between completion polls, in seconds.
    pub poll_interval_secs: u64,
    /// Polls to attempt before abandoning a task.
    pub poll_max_attempts: u32,
    /// Failure export format (`text` or `structured`).
    pub export_format: ExportFormat,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default      |
    /// |------------------------|--------------|
    /// | `PROVIDER_URL`         | *(required)* |
    /// | `PROVIDER_API_KEY`     | *(none)*     |
    /// | `REQUEST_TIMEOUT_SECS` | `300`        |
    /// | `CONCURRENCY`          | `2`          |
    /// | `MAX_RETRIES`          | `2`          |
    /// | `THROTTLE_MS`          | `0`          |
    /// | `POLL_INTERVAL_SECS`   | `2`          |
    /// | `POLL_MAX_ATTEMPTS`    | `150`        |
    /// | `EXPORT_FORMAT`        | `structured` |
    pub fn from_env() -> Self {
        let provider_url = std::env::var("PROVIDER_URL").expect("PROVIDER_URL must be set");

        let provider_api_key = std::env::var("PROVIDER_API_KEY").ok().filter(|s| !s.is_empty());

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let concurrency_limit: usize = std::env::var("CONCURRENCY")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("CONCURRENCY must be a valid positive integer");

        let max_retries: u32 = std::env::var("MAX_RETRIES")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("MAX_RETRIES must be a valid u32");

        let throttle_ms: u64 = std::env::var("THROTTLE_MS")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("THROTTLE_MS must be a valid u64");

        let poll_interval_secs: u64 = std::env::var("POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("POLL_INTERVAL_SECS must be a valid u64");

        let poll_max_attempts: u32 = std::env::var("POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "150".into())
            .parse()
            .expect("POLL_MAX_ATTEMPTS must be a valid u32");

        let export_format = ExportFormat::from_str(
            &std::env::var("EXPORT_FORMAT").unwrap_or_else(|_| "structured".into()),
        );

        Self {
            provider_url,
            provider_api_key,
            request_timeout_secs,
            concurrency_limit,
            max_retries,
            throttle_ms,
            poll_interval_secs,
            poll_max_attempts,
            export_format,
        }
    }

    /// Provider connection settings derived from this configuration.
    pub fn provider(&self) -> ProviderConfig {
        let mut config = ProviderConfig::new(
            self.provider_url.clone(),
            self.provider_api_key.clone(),
        );
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }

    /// Engine settings derived from this configuration.
    pub fn engine(&self) -> EngineConfig {
        let mut config = EngineConfig {
            concurrency_limit: self.concurrency_limit,
            max_retries: self.max_retries,
            throttle: Duration::from_millis(self.throttle_ms),
            ..Default::default()
        };
        config.poll.interval = Duration::from_secs(self.poll_interval_secs);
        config.poll.max_attempts = self.poll_max_attempts;
        config
    }
}
