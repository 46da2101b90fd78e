use super::context::{self, ContextGuard, LoopContext};
use super::failure::{TaskFailure, TaskOutput};
use super::job::Job;
use super::state::{LoopMode, LoopState};
use crate::config::ReactorConfig;
use crate::error::{Error, Result};
use crate::events::{EventBus, ReactorEvent};
use crate::logging::SharedLogger;

use core_async::runtime::{self, Runtime};
use core_async::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use core_async::sync::{broadcast, CancellationToken};
use core_async::task::{self, JoinError, LocalSet, TaskTracker};
use futures::future::{LocalBoxFuture, OptionFuture};
use futures::FutureExt;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

static NEXT_REACTOR_ID: AtomicU64 = AtomicU64::new(1);

type LocalBody = Box<dyn FnOnce() -> LocalBoxFuture<'static, anyhow::Result<()>>>;

/// Owner of one single-threaded cooperative event loop.
///
/// The loop is a current-thread Tokio runtime driving a [`LocalSet`]; every
/// task runs on the loop thread and may suspend at any `.await` without
/// blocking the others. At most one loop is active per `Reactor`.
///
/// `Reactor` is a cheap handle: clones control the same loop.
#[derive(Clone)]
pub struct Reactor {
    shared: Arc<Shared>,
}

struct Shared {
    id: u64,
    config: ReactorConfig,
    control: Mutex<Control>,
    changed: Condvar,
    events: EventBus,
}

#[derive(Default)]
struct Control {
    state: LoopState,
    mode: Option<LoopMode>,
    queue: Option<UnboundedSender<Job>>,
    stop: Option<CancellationToken>,
    thread: Option<thread::JoinHandle<()>>,
    starts: u64,
}

/// A claimed loop, ready to be driven by whichever thread claimed it.
pub(crate) struct Startup {
    runtime: Runtime,
    receiver: UnboundedReceiver<Job>,
    stop: CancellationToken,
    mode: LoopMode,
    first: Option<Job>,
}

pub(crate) enum Claim {
    /// The loop was running; the job is on its way to it.
    Enqueued,
    /// The loop was stopped and is now ours to drive.
    Start(Startup),
}

enum BodyFailure {
    Failed(anyhow::Error),
    Panicked(Box<dyn Any + Send>),
}

impl BodyFailure {
    fn from_join(err: JoinError) -> Self {
        match err.try_into_panic() {
            Ok(payload) => BodyFailure::Panicked(payload),
            Err(err) => BodyFailure::Failed(anyhow::Error::new(err)),
        }
    }
}

impl Reactor {
    /// Infallible: a `ReactorConfig` is validated when it is built.
    pub fn new(config: ReactorConfig) -> Self {
        let events = EventBus::new(config.event_capacity());
        Self {
            shared: Arc::new(Shared {
                id: NEXT_REACTOR_ID.fetch_add(1, Ordering::Relaxed),
                config,
                control: Mutex::new(Control::default()),
                changed: Condvar::new(),
                events,
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub fn config(&self) -> &ReactorConfig {
        &self.shared.config
    }

    /// Logger that receives task failure reports.
    pub fn logger(&self) -> &SharedLogger {
        self.shared.config.logger()
    }

    pub fn state(&self) -> LoopState {
        self.shared.control.lock().state
    }

    /// Mode of the current (or starting) loop; `None` when stopped.
    pub fn mode(&self) -> Option<LoopMode> {
        self.shared.control.lock().mode
    }

    /// Whether a loop is currently dispatching tasks.
    pub fn is_running(&self) -> bool {
        self.state() == LoopState::Running
    }

    /// How many times a loop has been started by this reactor.
    pub fn starts(&self) -> u64 {
        self.shared.control.lock().starts
    }

    /// Whether the calling code runs on this reactor's loop thread.
    pub fn is_current(&self) -> bool {
        context::current().is_some_and(|context| context.reactor_id == self.shared.id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReactorEvent> {
        self.shared.events.subscribe()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.shared.events
    }

    /// Starts the loop on a dedicated thread and returns once it is running.
    ///
    /// Does nothing when the loop is already running. A panic escaping the
    /// loop thread aborts the process.
    ///
    /// # Errors
    ///
    /// - [`Error::Io`] if the runtime or the thread cannot be created
    /// - [`Error::Stopped`] when called from the loop thread while it stops
    pub fn start_detached(&self) -> Result<()> {
        let mut control = self.shared.control.lock();
        self.settle(&mut control)?;

        if control.state == LoopState::Running {
            debug!(reactor = self.shared.id, "Event loop already running");
            return Ok(());
        }

        let startup = self.claim(&mut control, LoopMode::Detached, None)?;
        let reactor = self.clone();
        let spawned = thread::Builder::new()
            .name(self.shared.config.thread_name().to_string())
            .spawn(move || abort_on_panic(move || reactor.drive_detached(startup)));

        match spawned {
            Ok(handle) => control.thread = Some(handle),
            Err(err) => {
                drop(control);
                self.finish(0);
                return Err(Error::Io(err));
            }
        }

        while control.state == LoopState::Starting {
            self.shared.changed.wait(&mut control);
        }

        Ok(())
    }

    /// Drives the loop on the calling thread until it is stopped.
    ///
    /// `body` runs as the first task. It is not guarded: an error stops the
    /// loop and is returned as [`Error::Task`], a panic resumes on the caller
    /// once the loop is torn down.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyRunning`] if the loop is not stopped
    /// - [`Error::NestedRuntime`] when called from inside an async runtime
    /// - [`Error::Io`] if the runtime cannot be created
    pub fn start_blocking<F, Fut, O>(&self, body: F) -> Result<()>
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = O> + 'static,
        O: TaskOutput + 'static,
    {
        let startup = {
            let mut control = self.shared.control.lock();
            if control.state != LoopState::Stopped {
                return Err(Error::AlreadyRunning);
            }
            self.claim(&mut control, LoopMode::Blocking, None)?
        };

        let body: LocalBody =
            Box::new(move || async move { body().await.into_result() }.boxed_local());
        self.drive(startup, Some(body))
    }

    /// Requests a stop. Safe to call from any thread, including from a task
    /// on the loop. Returns `false` when no loop was starting or running.
    ///
    /// Scheduling is rejected from now on. Queued tasks that never started
    /// are dropped; running tasks are cancelled at their next suspension
    /// point.
    pub fn stop(&self) -> bool {
        let mut control = self.shared.control.lock();
        match control.state {
            LoopState::Starting | LoopState::Running => {
                control.state = LoopState::Stopping;
                if let Some(stop) = control.stop.as_ref() {
                    stop.cancel();
                }
                self.shared.changed.notify_all();
                self.shared.events.emit(ReactorEvent::Stopping).ok();
                drop(control);

                info!(reactor = self.shared.id, "Event loop stop requested");
                true
            }
            LoopState::Stopping | LoopState::Stopped => false,
        }
    }

    /// Blocks until the loop has stopped.
    ///
    /// # Errors
    ///
    /// [`Error::Internal`] when called from the loop thread itself.
    pub fn wait_stopped(&self) -> Result<()> {
        self.wait_for_stop(false).map(|_| ())
    }

    /// Stops the loop and waits for it, joining the detached thread if any.
    ///
    /// From the loop thread itself this only requests the stop.
    pub fn shutdown(&self) -> Result<()> {
        self.stop();
        if self.is_current() {
            return Ok(());
        }

        if let Some(handle) = self.wait_for_stop(true)? {
            handle
                .join()
                .map_err(|_| Error::Internal("Event loop thread panicked".to_string()))?;
        }

        Ok(())
    }

    /// Sends `job` to a running loop or claims a stopped one for the caller.
    pub(crate) fn claim_or_enqueue(&self, job: Job) -> Result<Claim> {
        let mut control = self.shared.control.lock();
        self.settle(&mut control)?;

        if control.state.accepts_tasks() {
            self.enqueue(&control, job)?;
            return Ok(Claim::Enqueued);
        }

        let startup = self.claim(&mut control, LoopMode::Blocking, Some(job))?;
        Ok(Claim::Start(startup))
    }

    /// Drives a loop claimed by [`claim_or_enqueue`](Self::claim_or_enqueue).
    pub(crate) fn drive_blocking(&self, startup: Startup) -> Result<()> {
        self.drive(startup, None)
    }

    /// Waits for `Stopped`, optionally taking the finished detached thread.
    fn wait_for_stop(&self, reap: bool) -> Result<Option<thread::JoinHandle<()>>> {
        if self.is_current() {
            return Err(Error::Internal(
                "Cannot wait for the event loop from its own thread".to_string(),
            ));
        }

        let mut control = self.shared.control.lock();
        while control.state != LoopState::Stopped {
            self.shared.changed.wait(&mut control);
        }
        Ok(if reap { control.thread.take() } else { None })
    }

    /// Waits out `Starting`/`Stopping`. Afterwards the state is either
    /// `Running` or `Stopped`.
    fn settle(&self, control: &mut MutexGuard<'_, Control>) -> Result<()> {
        while control.state.is_transient() {
            // The loop thread would wait on itself.
            if self.is_current() {
                return Err(Error::Stopped);
            }
            self.shared.changed.wait(control);
        }
        Ok(())
    }

    fn claim(
        &self,
        control: &mut MutexGuard<'_, Control>,
        mode: LoopMode,
        first: Option<Job>,
    ) -> Result<Startup> {
        if mode == LoopMode::Blocking && runtime::inside_runtime() {
            return Err(Error::NestedRuntime);
        }

        let runtime = runtime::build_current_thread()?;

        // A previous detached loop has already passed `Stopped`; reap it.
        if let Some(previous) = control.thread.take() {
            if previous.join().is_err() {
                warn!(reactor = self.shared.id, "Previous event loop thread panicked");
            }
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();

        control.state = LoopState::Starting;
        control.mode = Some(mode);
        control.queue = Some(sender);
        control.stop = Some(stop.clone());
        control.starts += 1;

        self.shared.events.emit(ReactorEvent::Starting { mode }).ok();
        info!(reactor = self.shared.id, %mode, "Starting event loop");

        Ok(Startup {
            runtime,
            receiver,
            stop,
            mode,
            first,
        })
    }

    fn enqueue(&self, control: &Control, job: Job) -> Result<()> {
        // Nested call from a task on this loop: spawn in place.
        if let Some(context) = context::current().filter(|c| c.reactor_id == self.shared.id) {
            debug!(task_id = %job.id(), "Spawning nested task on the current loop");
            task::spawn_local(context.tracker.track_future(job.into_future()));
            return Ok(());
        }

        let queue = control.queue.as_ref().ok_or(Error::Stopped)?;
        queue.send(job).map_err(|_| Error::Stopped)
    }

    fn drive_detached(&self, startup: Startup) {
        if let Err(err) = self.drive(startup, None) {
            fatal(&format!("Detached event loop failed; aborting: {}", err));
        }
    }

    fn drive(&self, startup: Startup, body: Option<LocalBody>) -> Result<()> {
        let Startup {
            runtime,
            mut receiver,
            stop,
            mode,
            first,
        } = startup;

        let mut reset = ResetOnExit {
            reactor: self,
            armed: true,
        };

        let local = LocalSet::new();
        let tracker = TaskTracker::new();
        let idle_shutdown = mode == LoopMode::Blocking && self.shared.config.stop_when_idle();
        if idle_shutdown {
            // A closed tracker resolves `wait()` whenever it is empty.
            tracker.close();
        }

        let context = ContextGuard::enter(LoopContext {
            reactor_id: self.shared.id,
            tracker: tracker.clone(),
        });

        let outcome = local.block_on(
            &runtime,
            self.dispatch(&mut receiver, &stop, &tracker, mode, first, body, idle_shutdown),
        );

        // Loops that exit on their own (idle, body failure) pass through
        // `Stopping` too, so nothing can be scheduled during teardown.
        self.stop();

        receiver.close();
        let mut dropped = 0;
        while let Ok(job) = receiver.try_recv() {
            debug!(task_id = %job.id(), "Dropping queued task");
            dropped += 1;
        }
        if dropped > 0 {
            warn!(
                reactor = self.shared.id,
                dropped, "Event loop stopped with queued tasks that never ran"
            );
        }

        drop(local);
        drop(runtime);
        drop(context);

        reset.armed = false;
        self.finish(dropped);

        match outcome {
            Ok(()) => Ok(()),
            Err(BodyFailure::Failed(err)) => Err(Error::Task(TaskFailure::Failed(err))),
            Err(BodyFailure::Panicked(payload)) => panic::resume_unwind(payload),
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch(
        &self,
        receiver: &mut UnboundedReceiver<Job>,
        stop: &CancellationToken,
        tracker: &TaskTracker,
        mode: LoopMode,
        first: Option<Job>,
        body: Option<LocalBody>,
        idle_shutdown: bool,
    ) -> std::result::Result<(), BodyFailure> {
        self.mark_running(mode);

        if let Some(job) = first {
            dispatch_job(tracker, job);
        }

        let mut body = body.map(|body| task::spawn_local(tracker.track_future(body())));

        loop {
            core_async::select! {
                biased;

                _ = stop.cancelled() => return Ok(()),

                Some(joined) = OptionFuture::from(body.as_mut()), if body.is_some() => {
                    body = None;
                    match joined {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => return Err(BodyFailure::Failed(err)),
                        Err(err) => return Err(BodyFailure::from_join(err)),
                    }
                }

                job = receiver.recv() => match job {
                    Some(job) => dispatch_job(tracker, job),
                    None => return Ok(()),
                },

                _ = tracker.wait(), if idle_shutdown => {
                    debug!(reactor = self.shared.id, "Event loop idle; stopping");
                    return Ok(());
                }
            }
        }
    }

    fn mark_running(&self, mode: LoopMode) {
        let mut control = self.shared.control.lock();
        // A stop may have arrived while starting; leave it in place.
        if control.state != LoopState::Starting {
            return;
        }

        control.state = LoopState::Running;
        self.shared.changed.notify_all();
        self.shared.events.emit(ReactorEvent::Running { mode }).ok();
        drop(control);

        info!(reactor = self.shared.id, %mode, "Event loop running");
    }

    fn finish(&self, dropped: usize) {
        let mut control = self.shared.control.lock();
        self.reset_locked(&mut control);
        // Lifecycle events go out under the lock to keep them in state order.
        self.shared
            .events
            .emit(ReactorEvent::Stopped {
                dropped_tasks: dropped,
            })
            .ok();
        drop(control);

        info!(reactor = self.shared.id, dropped, "Event loop stopped");
    }

    fn reset_locked(&self, control: &mut MutexGuard<'_, Control>) {
        control.state = LoopState::Stopped;
        control.mode = None;
        control.queue = None;
        control.stop = None;
        self.shared.changed.notify_all();
    }
}

impl fmt::Debug for Reactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.shared.control.lock();
        f.debug_struct("Reactor")
            .field("id", &self.shared.id)
            .field("state", &control.state)
            .field("mode", &control.mode)
            .field("starts", &control.starts)
            .field("config", &self.shared.config)
            .finish()
    }
}

fn dispatch_job(tracker: &TaskTracker, job: Job) {
    debug!(task_id = %job.id(), "Dispatching task");
    task::spawn_local(tracker.track_future(job.into_future()));
}

/// Returns the reactor to `Stopped` if `drive` unwinds.
struct ResetOnExit<'a> {
    reactor: &'a Reactor,
    armed: bool,
}

impl Drop for ResetOnExit<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.reactor.finish(0);
        }
    }
}

/// A loop thread that dies silently is worse than a crash.
fn abort_on_panic<F: FnOnce()>(f: F) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let failure = TaskFailure::from_panic(payload);
        fatal(&format!("Event loop thread panicked; aborting: {}", failure.report()));
    }
}

// Straight to stderr and nowhere else: tracing layers may buffer, or hand the
// write to a runtime that is gone, and the process ends on the next line.
fn fatal(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::abort()
}
