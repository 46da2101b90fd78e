//! Synchronization primitives.
//!
//! Async-aware primitives from `tokio::sync` plus cancellation from
//! `tokio_util`. All of them are `Send + Sync` and safe to share between the
//! loop thread and foreground threads.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::Mutex;
//!
//! async fn example() {
//!     let mutex = Mutex::new(42);
//!     let mut guard = mutex.lock().await;
//!     *guard += 1;
//! }
//! ```

pub use tokio::sync::{broadcast, mpsc, oneshot, watch, Mutex, MutexGuard, Notify};
pub use tokio_util::sync::CancellationToken;
