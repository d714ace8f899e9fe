//! Engine configuration.

use std::time::Duration;

use promptbatch_core::error::CoreError;

use crate::poll::PollConfig;
use crate::pipeline::PipelineConfig;
use crate::retry::RetryConfig;

// ---------------------------------------------------------------------------
// Concurrency presets
// ---------------------------------------------------------------------------

/// One item in flight at a time; gentlest on provider quotas.
pub const CONCURRENCY_CONSERVATIVE: usize = 1;

/// Default concurrency.
pub const CONCURRENCY_STANDARD: usize = 2;

/// Highest preset offered by the UI; any positive value is accepted.
pub const CONCURRENCY_FULL_SPEED: usize = 5;

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Operator-selected parameters for a batch run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of simultaneously in-flight items. Must be >= 1.
    pub concurrency_limit: usize,
    /// Retries per item after its first attempt; `0` means attempt once.
    pub max_retries: u32,
    /// Minimum delay before each admission, independent of retry backoff.
    pub throttle: Duration,
    /// Backoff parameters for the per-item retry policy.
    pub retry: RetryConfig,
    /// Completion polling parameters.
    pub poll: PollConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: CONCURRENCY_STANDARD,
            max_retries: 2,
            throttle: Duration::ZERO,
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Validate operator-supplied parameters.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.concurrency_limit < 1 {
            return Err(CoreError::Validation(
                "Concurrency limit must be at least 1".to_string(),
            ));
        }
        if self.poll.max_attempts < 1 {
            return Err(CoreError::Validation(
                "Poll attempt budget must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The per-item pipeline parameters derived from this configuration.
    pub(crate) fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_retries: self.max_retries,
            retry: self.retry.clone(),
            poll: self.poll.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
