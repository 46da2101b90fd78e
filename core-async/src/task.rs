//! Task spawning and execution abstractions.
//!
//! Two flavours of task exist:
//! - [`spawn`]: `Send` futures on whichever runtime is current
//! - [`spawn_local`]: `!Send` futures pinned to the thread that owns the
//!   current [`LocalSet`]; this is how work runs on the event loop
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! async fn example() {
//!     let handle = task::spawn(async { 42 });
//!     let result = handle.await.unwrap();
//!     assert_eq!(result, 42);
//! }
//! ```

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle, LocalSet};
pub use tokio_util::task::TaskTracker;

/// Spawns a new asynchronous task using the Tokio runtime.
///
/// The spawned task may run on a different thread.
///
/// # Examples
///
/// ```rust
/// use core_async::task::spawn;
///
/// # async fn example() {
/// let handle = spawn(async { 42 });
/// assert_eq!(handle.await.unwrap(), 42);
/// # }
/// ```
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

/// Spawns a `!Send` future on the current [`LocalSet`].
///
/// # Panics
///
/// Panics when called outside of a `LocalSet` context.
pub fn spawn_local<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + 'static,
    F::Output: 'static,
{
    tokio::task::spawn_local(future)
}

/// Result type for task operations.
pub type Result<T> = std::result::Result<T, JoinError>;
