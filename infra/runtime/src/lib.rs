//! # Runtime
//!
//! Tokio runtime profiles for the process.
//!
//! The desktop shell owns the main thread (the native window loop must run
//! there), so the API host gets its own multithreaded runtime whose workers
//! live entirely in the background.
//!
//! ## Profiles
//! * **Background host**: few workers, small stacks. Serves a single local client.
//! * **Default**: sized from `TOKIO_WORKER_THREADS` or the available parallelism.
//!
//! ## Example
//!
//! ```rust
//! use selfhost_runtime::{RuntimeConfig, build_runtime_with_config};
//!
//! let runtime = build_runtime_with_config(&RuntimeConfig::background_host())?;
//! let answer = runtime.block_on(async { 40 + 2 });
//! assert_eq!(answer, 42);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub use anyhow::Result;
pub use tokio::runtime::Runtime;

use anyhow::Context as _;
use std::{sync::OnceLock, thread::available_parallelism, time::Duration};
use tokio::runtime::Builder;
use tracing::{debug, info};

/// The default number of worker threads if detection fails.
const DEFAULT_WORKER_THREADS: usize = 4;
/// The default stack size for threads (2 `MiB`).
const DEFAULT_STACK_SIZE: usize = 2 * 1024 * 1024;
/// Minimum allowed stack size (1 `MiB`).
const MIN_STACK_SIZE: usize = 1024 * 1024;
/// Maximum allowed stack size (16 `MiB`).
const MAX_STACK_SIZE: usize = 16 * 1024 * 1024;
const MAX_WORKER_THREADS: usize = 256;
/// How long an idle blocking thread stays alive.
const THREAD_KEEP_ALIVE: Duration = Duration::from_secs(60);
const DEFAULT_THREAD_NAME: &str = "selfhost-worker";

static WORKER_THREADS: OnceLock<usize> = OnceLock::new();

fn detect_worker_threads() -> usize {
    *WORKER_THREADS.get_or_init(|| {
        std::env::var("TOKIO_WORKER_THREADS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0 && n <= MAX_WORKER_THREADS)
            .unwrap_or_else(|| {
                available_parallelism().map(std::num::NonZero::get).unwrap_or(DEFAULT_WORKER_THREADS)
            })
    })
}

fn thread_name_or_default(name: String) -> String {
    if name.trim().is_empty() { DEFAULT_THREAD_NAME.to_owned() } else { name }
}

/// Configuration for the Tokio runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
    pub stack_size: usize,
    pub thread_name: String,
    pub thread_keep_alive: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: detect_worker_threads(),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            thread_keep_alive: THREAD_KEEP_ALIVE,
        }
    }
}

impl RuntimeConfig {
    /// Preset for the embedded API host: at most two workers.
    #[must_use = "Use this configuration for the background API host"]
    pub fn background_host() -> Self {
        Self {
            worker_threads: detect_worker_threads().min(2),
            stack_size: DEFAULT_STACK_SIZE,
            thread_name: "selfhost-api".to_owned(),
            thread_keep_alive: Duration::from_secs(30),
        }
    }

    #[must_use = "Customize the number of worker threads for the runtime"]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.clamp(1, MAX_WORKER_THREADS);
        self
    }

    #[must_use = "Customize the stack size for worker threads"]
    pub fn with_stack_size(mut self, size: usize) -> Self {
        self.stack_size = size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE);
        self
    }

    #[must_use = "Customize the thread name"]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = thread_name_or_default(name.into());
        self
    }

    #[must_use = "Customize how long idle threads stay alive"]
    pub const fn with_thread_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.thread_keep_alive = keep_alive;
        self
    }

    fn normalized(&self) -> Self {
        Self {
            worker_threads: self.worker_threads.clamp(1, MAX_WORKER_THREADS),
            stack_size: self.stack_size.clamp(MIN_STACK_SIZE, MAX_STACK_SIZE),
            thread_name: thread_name_or_default(self.thread_name.clone()),
            thread_keep_alive: self.thread_keep_alive,
        }
    }
}

/// Creates a multithreaded runtime with I/O and timers enabled.
///
/// Out-of-range values in `config` are clamped before use.
///
/// # Errors
///
/// Returns an error if the OS refuses to spawn the worker threads.
pub fn build_runtime_with_config(config: &RuntimeConfig) -> Result<Runtime> {
    let config = config.normalized();
    debug!(config = ?config, "Building tokio runtime");
    info!(
        threads = config.worker_threads,
        stack = config.stack_size,
        name = %config.thread_name,
        "Initializing runtime"
    );

    Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .thread_name(&config.thread_name)
        .thread_stack_size(config.stack_size)
        .thread_keep_alive(config.thread_keep_alive)
        .enable_all()
        .build()
        .context("Failed to initialize runtime")
}
