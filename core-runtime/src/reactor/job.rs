use futures::future::LocalBoxFuture;
use std::fmt;
use uuid::Uuid;

/// Identifies one scheduled task in logs and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

type JobFn = Box<dyn FnOnce() -> LocalBoxFuture<'static, ()> + Send>;

/// A unit of work travelling from any thread to the loop thread.
///
/// The closure is `Send`; the future it produces is built on the loop
/// thread and never leaves it.
pub(crate) struct Job {
    id: TaskId,
    start: JobFn,
}

impl Job {
    pub(crate) fn new<F>(id: TaskId, start: F) -> Self
    where
        F: FnOnce() -> LocalBoxFuture<'static, ()> + Send + 'static,
    {
        Self {
            id,
            start: Box::new(start),
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn into_future(self) -> LocalBoxFuture<'static, ()> {
        (self.start)()
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job").field("id", &self.id).finish()
    }
}
