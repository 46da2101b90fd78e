use super::event_loop::{Claim, Reactor};
use super::failure::{TaskFailure, TaskOutput};
use super::job::{Job, TaskId};
use super::panic_capture::{self, Guarded};
use crate::error::Result;
use crate::events::{EventBus, ReactorEvent};
use crate::logging::SharedLogger;

use bridge_traits::logging::{LogEntry, LogLevel};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, Instrument};

/// Log target of task failure reports.
pub const FAILURE_TARGET: &str = "core_runtime::runner";

/// Schedules guarded tasks on a [`Reactor`].
///
/// Every task runs inside a failure boundary: an error or panic escaping it
/// is written to the reactor's logger as one `Error` entry, announced as
/// [`ReactorEvent::TaskFailed`] and then discarded. Sibling tasks and the
/// loop keep going.
#[derive(Debug, Clone)]
pub struct Runner {
    reactor: Reactor,
}

impl Runner {
    pub fn new(reactor: Reactor) -> Self {
        panic_capture::install();
        Self { reactor }
    }

    pub fn reactor(&self) -> &Reactor {
        &self.reactor
    }

    pub fn logger(&self) -> &SharedLogger {
        self.reactor.logger()
    }

    /// Starts the loop on its own thread so the caller stays free.
    pub fn interactive(&self) -> Result<()> {
        self.reactor.start_detached()
    }

    /// Schedules `task` on the loop.
    ///
    /// - Loop running: the task is queued (or spawned in place when called
    ///   from the loop itself) and this returns immediately.
    /// - Loop stopped: a loop is started on the calling thread with the task
    ///   first in line, and this returns once that loop stops.
    ///
    /// `task` is a `Send` closure producing a possibly `!Send` future; the
    /// future is built and polled on the loop thread only.
    ///
    /// # Errors
    ///
    /// - [`Error::Stopped`](crate::Error::Stopped) if the loop is stopping
    ///   and the caller is a task on it
    /// - [`Error::NestedRuntime`](crate::Error::NestedRuntime) if a loop
    ///   would have to be started from inside another async runtime
    ///
    /// Failures of the task itself never surface here.
    pub fn run<F, Fut, O>(&self, task: F) -> Result<TaskId>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = O> + 'static,
        O: TaskOutput + 'static,
    {
        let job = self.guarded_job(task);
        let id = job.id();

        match self.reactor.claim_or_enqueue(job)? {
            Claim::Enqueued => debug!(task_id = %id, "Task scheduled"),
            Claim::Start(startup) => {
                debug!(task_id = %id, "No event loop running; driving one on this thread");
                self.reactor.drive_blocking(startup)?;
            }
        }

        Ok(id)
    }

    /// Runs `task` in place on the current executor, inside the same
    /// failure boundary as [`run`](Self::run).
    ///
    /// The failure is still logged; it is also handed back so the caller
    /// can react to it.
    pub async fn run_inline<F, Fut, O>(&self, task: F) -> std::result::Result<(), TaskFailure>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = O>,
        O: TaskOutput,
    {
        guard(
            TaskId::new(),
            self.logger().clone(),
            self.reactor.events().clone(),
            task,
        )
        .await
    }

    fn guarded_job<F, Fut, O>(&self, task: F) -> Job
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = O> + 'static,
        O: TaskOutput + 'static,
    {
        let id = TaskId::new();
        let logger = self.logger().clone();
        let events = self.reactor.events().clone();

        Job::new(id, move || {
            guard(id, logger, events, task)
                .map(|_| ())
                .boxed_local()
        })
    }
}

async fn guard<F, Fut, O>(
    id: TaskId,
    logger: SharedLogger,
    events: EventBus,
    task: F,
) -> std::result::Result<(), TaskFailure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = O>,
    O: TaskOutput,
{
    let span = tracing::debug_span!("task", task_id = %id);
    let body = AssertUnwindSafe(async move { task().await.into_result() }).catch_unwind();
    let outcome = Guarded::new(body).instrument(span).await;

    let failure = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => TaskFailure::Failed(err),
        Err(payload) => TaskFailure::from_panic(payload),
    };

    let entry = LogEntry::new(LogLevel::Error, FAILURE_TARGET, failure.report())
        .with_field("task_id", id.to_string());
    logger.write(entry).await;

    events
        .emit(ReactorEvent::TaskFailed {
            task_id: id,
            message: failure.message(),
        })
        .ok();

    Err(failure)
}
