//! Shared scripted provider mock for engine integration tests.
//!
//! The mock keys its scripts by prompt text so tests can target individual
//! items in a batch without threading ids around. It also tracks how many
//! tasks are simultaneously in flight, which is how the concurrency-limit
//! assertions observe the scheduler from the outside.

// Each test binary links this module separately and uses a subset of it.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use promptbatch_core::item::BatchItem;
use promptbatch_core::parse::request_payload;
use promptbatch_engine::EngineConfig;
use promptbatch_provider::{
    ProviderError, RemoteTaskStatus, SubmitResponse, TaskService, TaskStatusResponse,
};

/// Scripted behavior for submissions of a specific prompt.
pub enum SubmitScript {
    /// Every submission fails with this HTTP status.
    AlwaysStatus(u16),
    /// The first `times` submissions fail with this status, then succeed.
    FailTimes { status: u16, times: u32 },
}

struct TaskState {
    prompt: String,
    polls: u32,
    settled: bool,
}

pub struct MockProvider {
    /// Polls a task receives before reporting success (unless scripted).
    polls_to_succeed: u32,
    submit_scripts: Mutex<HashMap<String, SubmitScript>>,
    /// Prompts whose tasks report `failed` on their first poll.
    fail_generation: Mutex<HashMap<String, String>>,
    /// Prompts whose tasks never reach a terminal status.
    never_settle: Mutex<HashSet<String>>,
    submit_calls: Mutex<HashMap<String, u32>>,
    tasks: Mutex<HashMap<String, TaskState>>,
    next_task: AtomicU32,
    inflight: AtomicUsize,
    max_inflight: AtomicUsize,
}

impl MockProvider {
    pub fn new(polls_to_succeed: u32) -> Self {
        Self {
            polls_to_succeed,
            submit_scripts: Mutex::new(HashMap::new()),
            fail_generation: Mutex::new(HashMap::new()),
            never_settle: Mutex::new(HashSet::new()),
            submit_calls: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            next_task: AtomicU32::new(1),
            inflight: AtomicUsize::new(0),
            max_inflight: AtomicUsize::new(0),
        }
    }

    pub fn script_submit(&self, prompt: &str, script: SubmitScript) {
        self.submit_scripts
            .lock()
            .unwrap()
            .insert(prompt.to_string(), script);
    }

    pub fn script_generation_failure(&self, prompt: &str, error: &str) {
        self.fail_generation
            .lock()
            .unwrap()
            .insert(prompt.to_string(), error.to_string());
    }

    pub fn script_never_settles(&self, prompt: &str) {
        self.never_settle.lock().unwrap().insert(prompt.to_string());
    }

    /// Submissions observed for one prompt.
    pub fn submit_calls(&self, prompt: &str) -> u32 {
        *self.submit_calls.lock().unwrap().get(prompt).unwrap_or(&0)
    }

    /// Submissions observed across all prompts.
    pub fn total_submit_calls(&self) -> u32 {
        self.submit_calls.lock().unwrap().values().sum()
    }

    /// Highest number of simultaneously in-flight tasks observed.
    pub fn max_inflight(&self) -> usize {
        self.max_inflight.load(Ordering::SeqCst)
    }

    fn settle(&self, task: &mut TaskState) {
        if !task.settled {
            task.settled = true;
            self.inflight.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl TaskService for MockProvider {
    async fn submit_task(
        &self,
        payload: &serde_json::Value,
    ) -> Result<SubmitResponse, ProviderError> {
        let prompt = payload
            .get("prompt")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let calls = {
            let mut map = self.submit_calls.lock().unwrap();
            let entry = map.entry(prompt.clone()).or_insert(0);
            *entry += 1;
            *entry
        };

        if let Some(script) = self.submit_scripts.lock().unwrap().get(&prompt) {
            match script {
                SubmitScript::AlwaysStatus(status) => {
                    return Err(ProviderError::Api {
                        status: *status,
                        body: "scripted submission failure".to_string(),
                    });
                }
                SubmitScript::FailTimes { status, times } => {
                    if calls <= *times {
                        return Err(ProviderError::Api {
                            status: *status,
                            body: "scripted submission failure".to_string(),
                        });
                    }
                }
            }
        }

        let task_id = format!("task-{}", self.next_task.fetch_add(1, Ordering::SeqCst));
        self.tasks.lock().unwrap().insert(
            task_id.clone(),
            TaskState {
                prompt,
                polls: 0,
                settled: false,
            },
        );

        let current = self.inflight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inflight.fetch_max(current, Ordering::SeqCst);

        Ok(SubmitResponse { task_id })
    }

    async fn get_task_status(&self, task_id: &str) -> Result<TaskStatusResponse, ProviderError> {
        let mut tasks = self.tasks.lock().unwrap();
        let Some(task) = tasks.get_mut(task_id) else {
            return Err(ProviderError::Api {
                status: 404,
                body: format!("unknown task {task_id}"),
            });
        };
        task.polls += 1;

        if self.never_settle.lock().unwrap().contains(&task.prompt) {
            return Ok(TaskStatusResponse {
                status: RemoteTaskStatus::Running,
                result: None,
                error: None,
            });
        }

        if let Some(error) = self.fail_generation.lock().unwrap().get(&task.prompt) {
            let error = error.clone();
            self.settle(task);
            return Ok(TaskStatusResponse {
                status: RemoteTaskStatus::Failed,
                result: None,
                error: Some(error),
            });
        }

        if task.polls >= self.polls_to_succeed {
            let outputs = serde_json::json!({ "image": format!("{}.png", task.prompt) });
            self.settle(task);
            return Ok(TaskStatusResponse {
                status: RemoteTaskStatus::Succeeded,
                result: Some(outputs),
                error: None,
            });
        }

        Ok(TaskStatusResponse {
            status: RemoteTaskStatus::Running,
            result: None,
            error: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build queued items from prompt texts, 1-based sequence numbers.
pub fn items_from_prompts(prompts: &[&str]) -> Vec<BatchItem> {
    prompts
        .iter()
        .enumerate()
        .map(|(i, p)| BatchItem::new(i as u32 + 1, *p, request_payload(p)))
        .collect()
}

/// Engine configuration with millisecond-scale delays for fast tests.
pub fn fast_config(concurrency_limit: usize) -> EngineConfig {
    let mut config = EngineConfig {
        concurrency_limit,
        max_retries: 0,
        throttle: Duration::ZERO,
        ..Default::default()
    };
    config.retry.base_delay = Duration::from_millis(2);
    config.retry.max_delay = Duration::from_millis(8);
    config.poll.interval = Duration::from_millis(5);
    config.poll.max_attempts = 50;
    config
}

/// Poll `condition` until it holds or `deadline` elapses.
pub async fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
