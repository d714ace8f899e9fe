//! Batch orchestration engine.
//!
//! Executes a list of generation requests against an asynchronous provider
//! task API under a bounded concurrency budget, with operator-controlled
//! pause/resume/stop, bounded exponential-backoff retry, fixed-interval
//! completion polling, and per-item progress tracking.
//!
//! # Core Concepts
//!
//! - **Scheduler**: [`BatchScheduler`] owns the run state machine, admits
//!   items in input order under a per-instance semaphore, and joins every
//!   launched pipeline before settling.
//! - **Pipeline**: the per-item pipeline drives one item through
//!   validation, submission, and polling, wrapped by the retry policy.
//! - **Retry policy**: [`retry::retry_with_backoff`] with caller-supplied
//!   retryability classification.
//! - **Events**: every state change, admission, progress tick, and
//!   settlement is published on a broadcast channel; see [`EngineEvent`].
//! - **Report**: a settled run yields a [`RunReport`] with the outcome,
//!   final progress, and every item's result or failure.
//!
//! # Example
//!
//! ```ignore
//! use promptbatch_engine::{BatchScheduler, EngineConfig};
//!
//! let scheduler = BatchScheduler::new(service, EngineConfig::default())?;
//! let mut events = scheduler.subscribe();
//! let report = scheduler.run(items).await?;
//! println!("{}", report.outcome);
//! ```

pub mod config;
pub mod events;
pub mod pipeline;
pub mod poll;
pub mod report;
pub mod retry;
pub mod scheduler;

pub use config::EngineConfig;
pub use events::{EngineEvent, RunOutcome};
pub use report::{RunCounts, RunReport};
pub use scheduler::{BatchScheduler, EngineError};
