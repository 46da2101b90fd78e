//! # Event Bus System
//!
//! Broadcasts reactor lifecycle changes and recovered task failures using
//! `tokio::sync::broadcast` (through `core_async::sync`).
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, ReactorEvent};
//!
//! let bus = EventBus::new(16);
//! let mut stream = bus.subscribe();
//!
//! bus.emit(ReactorEvent::Stopping).ok();
//! assert!(matches!(stream.try_recv(), Ok(ReactorEvent::Stopping)));
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind by more than the
//!   buffer size and missed `n` events. It may keep receiving.
//! - **`RecvError::Closed`**: the bus was dropped.
//!
//! Emitting with no subscribers returns an error which callers ignore.

use crate::reactor::{LoopMode, TaskId};
use core_async::sync::broadcast::{self, error::SendError, Receiver};
use std::fmt;

/// Lifecycle notifications from a reactor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactorEvent {
    /// A loop start was claimed
    Starting { mode: LoopMode },
    /// The loop is dispatching tasks
    Running { mode: LoopMode },
    /// A stop was requested; scheduling is now rejected
    Stopping,
    /// The loop has exited
    Stopped { dropped_tasks: usize },
    /// A task failed; the failure was logged and discarded
    TaskFailed { task_id: TaskId, message: String },
}

impl ReactorEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> String {
        match self {
            ReactorEvent::Starting { mode } => format!("Event loop starting ({})", mode),
            ReactorEvent::Running { mode } => format!("Event loop running ({})", mode),
            ReactorEvent::Stopping => "Event loop stopping".to_string(),
            ReactorEvent::Stopped { dropped_tasks: 0 } => "Event loop stopped".to_string(),
            ReactorEvent::Stopped { dropped_tasks } => {
                format!("Event loop stopped, {} queued tasks dropped", dropped_tasks)
            }
            ReactorEvent::TaskFailed { task_id, message } => {
                format!("Task {} failed: {}", task_id, message)
            }
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            ReactorEvent::TaskFailed { .. } => EventSeverity::Error,
            ReactorEvent::Stopped { dropped_tasks } if *dropped_tasks > 0 => {
                EventSeverity::Warning
            }
            ReactorEvent::Starting { .. }
            | ReactorEvent::Running { .. }
            | ReactorEvent::Stopping
            | ReactorEvent::Stopped { .. } => EventSeverity::Info,
        }
    }
}

/// Event severity levels for filtering and prioritization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSeverity {
    Info,
    Warning,
    Error,
}

/// Central broadcast channel for reactor events.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ReactorEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0; `ReactorConfig::validate` rejects that.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are none.
    pub fn emit(&self, event: ReactorEvent) -> Result<usize, SendError<ReactorEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<ReactorEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
