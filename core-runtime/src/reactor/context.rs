//! Thread-local marker for "this code runs on a loop thread, inside its
//! `LocalSet`". Nested scheduling uses it to spawn in place instead of going
//! through the queue.

use core_async::task::TaskTracker;
use std::cell::RefCell;

#[derive(Clone)]
pub(crate) struct LoopContext {
    pub(crate) reactor_id: u64,
    pub(crate) tracker: TaskTracker,
}

thread_local! {
    static CURRENT: RefCell<Option<LoopContext>> = const { RefCell::new(None) };
}

/// Installs a context for the lifetime of the guard.
pub(crate) struct ContextGuard {
    previous: Option<LoopContext>,
}

impl ContextGuard {
    pub(crate) fn enter(context: LoopContext) -> Self {
        let previous = CURRENT.with(|current| current.replace(Some(context)));
        Self { previous }
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT.with(|current| {
            *current.borrow_mut() = previous;
        });
    }
}

/// The context of the loop driving this thread, if any.
pub(crate) fn current() -> Option<LoopContext> {
    CURRENT.with(|current| current.borrow().clone())
}

/// Whether the calling code runs on some reactor's loop thread.
pub fn in_context() -> bool {
    CURRENT.with(|current| current.borrow().is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_restores_previous_context() {
        assert!(!in_context());

        {
            let _outer = ContextGuard::enter(LoopContext {
                reactor_id: 1,
                tracker: TaskTracker::new(),
            });
            assert_eq!(current().map(|c| c.reactor_id), Some(1));

            {
                let _inner = ContextGuard::enter(LoopContext {
                    reactor_id: 2,
                    tracker: TaskTracker::new(),
                });
                assert_eq!(current().map(|c| c.reactor_id), Some(2));
            }

            assert_eq!(current().map(|c| c.reactor_id), Some(1));
        }

        assert!(!in_context());
    }
}
