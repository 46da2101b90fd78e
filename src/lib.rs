//! Process-wide bootstrap for the Turntable client.
//!
//! One logger slot and one event loop serve the whole process. Components
//! schedule work with [`run`]; an interactive console calls [`interactive`]
//! first so the loop lives on its own thread while the prompt keeps the
//! foreground.
//!
//! ```no_run
//! turntabler::interactive().unwrap();
//!
//! turntabler::run(|| async {
//!     // talk to the room...
//!     Ok::<(), std::io::Error>(())
//! })
//! .unwrap();
//! ```
//!
//! Without [`interactive`], the first [`run`] drives the loop on the calling
//! thread and returns once something calls [`stop`].
//!
//! Task failures never reach the caller; they are written to [`logger()`]
//! at `Error` level. Swap the sink with [`set_logger`].

use std::future::Future;
use std::sync::Arc;

use core_runtime::config::ReactorConfig;
use core_runtime::logging::SharedLogger;
use core_runtime::reactor::{Reactor, Runner, TaskOutput};
use once_cell::sync::Lazy;

pub use bridge_traits::logging::{ConsoleLogger, LogEntry, LogLevel, LoggerSink, MemoryLogger};
pub use core_runtime::reactor::{TaskFailure, TaskId};
pub use core_runtime::{Error, Result};

static LOGGER: Lazy<SharedLogger> = Lazy::new(SharedLogger::default);

static RUNNER: Lazy<Runner> = Lazy::new(|| {
    let config = ReactorConfig::default().with_logger(LOGGER.clone());
    Runner::new(Reactor::new(config))
});

/// The process-wide logger. Writes to stdout until replaced.
pub fn logger() -> SharedLogger {
    LOGGER.clone()
}

/// Replaces the process-wide logger sink for every holder at once.
pub fn set_logger(sink: Arc<dyn LoggerSink>) {
    LOGGER.set(sink);
}

/// The process-wide runner.
pub fn runner() -> &'static Runner {
    &RUNNER
}

/// Starts the process-wide loop on a background thread.
pub fn interactive() -> Result<()> {
    RUNNER.interactive()
}

/// Schedules `task` on the process-wide loop. See [`Runner::run`].
pub fn run<F, Fut, O>(task: F) -> Result<TaskId>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = O> + 'static,
    O: TaskOutput + 'static,
{
    RUNNER.run(task)
}

/// Requests the process-wide loop to stop.
pub fn stop() -> bool {
    RUNNER.reactor().stop()
}

/// Stops the process-wide loop and waits for it.
pub fn shutdown() -> Result<()> {
    RUNNER.reactor().shutdown()
}

pub fn is_running() -> bool {
    RUNNER.reactor().is_running()
}

/// Whether the caller is a task on an event loop.
pub fn in_context() -> bool {
    core_runtime::reactor::in_context()
}
