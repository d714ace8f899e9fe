//! HTTP client for asynchronous image-generation task providers.
//!
//! Providers expose a create-task endpoint returning an opaque task id and
//! a get-task endpoint reporting its status. This crate wraps that surface
//! behind the [`service::TaskService`] trait (the seam the engine and tests
//! depend on) and provides [`api::ProviderApi`], the reqwest-backed
//! implementation with bearer-token auth and per-request timeouts.

pub mod api;
pub mod service;
pub mod types;

pub use api::{ProviderApi, ProviderConfig, ProviderError};
pub use service::TaskService;
pub use types::{RemoteTaskStatus, SubmitResponse, TaskStatusResponse};
