//! Records where a guarded task panicked.
//!
//! `catch_unwind` only hands back the payload; by then the stack of the
//! panicking task is gone. A process-wide panic hook, installed once, takes
//! the backtrace and location at the panic site while a guarded poll is in
//! progress and parks them in a thread-local for the guard to pick up.
//! Panics outside a guarded poll go to the previously installed hook.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::future::Future;
use std::panic;
use std::pin::Pin;
use std::sync::Once;
use std::task::{Context, Poll};

static INSTALL: Once = Once::new();

thread_local! {
    static GUARDED: Cell<usize> = const { Cell::new(0) };
    static CAPTURED: RefCell<Option<PanicSite>> = const { RefCell::new(None) };
}

/// Backtrace and source location of a panic, rendered at the panic site.
#[derive(Debug, Clone)]
pub(crate) struct PanicSite {
    pub(crate) location: Option<String>,
    pub(crate) backtrace: String,
}

/// Installs the capturing hook on top of whatever hook is current.
pub(crate) fn install() {
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if GUARDED.with(Cell::get) == 0 {
                previous(info);
                return;
            }

            let site = PanicSite {
                location: info.location().map(|l| l.to_string()),
                backtrace: Backtrace::force_capture().to_string(),
            };
            CAPTURED.with(|captured| *captured.borrow_mut() = Some(site));
        }));
    });
}

/// Takes the site recorded for the most recent guarded panic on this thread.
pub(crate) fn take() -> Option<PanicSite> {
    CAPTURED.with(|captured| captured.borrow_mut().take())
}

struct Scope;

impl Scope {
    fn enter() -> Self {
        GUARDED.with(|depth| depth.set(depth.get() + 1));
        Scope
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        GUARDED.with(|depth| depth.set(depth.get() - 1));
    }
}

/// Marks every poll of the inner future as guarded.
///
/// Only the polls count: other tasks interleaving on the loop thread between
/// them are not covered.
pub(crate) struct Guarded<F> {
    inner: Pin<Box<F>>,
}

impl<F: Future> Guarded<F> {
    pub(crate) fn new(inner: F) -> Self {
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl<F: Future> Future for Guarded<F> {
    type Output = F::Output;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let _scope = Scope::enter();
        self.inner.as_mut().poll(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;

    #[inline(never)]
    fn spin_the_platter() {
        panic!("needle skipped");
    }

    #[test]
    fn test_guarded_panic_records_site() {
        install();

        let outcome = core_async::runtime::block_on(
            Guarded::new(AssertUnwindSafe(async { spin_the_platter() }).catch_unwind()),
        );
        assert!(outcome.is_err());

        let site = take().expect("site recorded");
        assert!(site.backtrace.contains("spin_the_platter"), "{}", site.backtrace);
        assert!(site.location.unwrap().contains("panic_capture.rs"));
        assert!(take().is_none());
    }

    #[test]
    fn test_unguarded_panic_records_nothing() {
        install();

        let outcome = panic::catch_unwind(|| panic!("outside any task"));
        assert!(outcome.is_err());
        assert!(take().is_none());
    }
}
