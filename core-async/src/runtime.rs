//! Runtime utilities that abstract over the underlying async executor.
//!
//! We wrap Tokio's runtime primitives so that downstream crates never need to
//! depend on Tokio directly.

pub use tokio::runtime::{Builder, Handle, Runtime, TryCurrentError};

/// Runs the provided future to completion using a lightweight runtime.
///
/// # Panics
///
/// Panics if the runtime cannot be built or when called from within another
/// runtime. Use [`build_current_thread`] where the caller has to recover.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Builds a single-threaded runtime with timers and I/O enabled.
pub fn build_current_thread() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Returns `true` when the calling thread is already driven by a runtime.
pub fn inside_runtime() -> bool {
    Handle::try_current().is_ok()
}
