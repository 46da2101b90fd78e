//! Async runtime abstraction layer for Turntabler.
//!
//! Every other crate in the workspace goes through this crate instead of
//! depending on tokio directly. The event loop in `core-runtime` is built
//! from the pieces exported here: a current-thread [`runtime::Builder`], a
//! [`task::LocalSet`] for tasks that never leave the loop thread, a
//! [`task::TaskTracker`] for in-flight bookkeeping and a
//! [`sync::CancellationToken`] for stop requests.
//!
//! # Modules
//!
//! - `runtime`: Runtime construction and `block_on`
//! - `task`: Task spawning (thread-safe and loop-local)
//! - `time`: Sleep, timeout and instants
//! - `sync`: Channels, notification and cancellation primitives
//!
//! # Examples
//!
//! ```rust
//! use core_async::task::{self, LocalSet};
//! use core_async::runtime::Builder;
//!
//! let runtime = Builder::new_current_thread().enable_all().build().unwrap();
//! let local = LocalSet::new();
//! let value = local.block_on(&runtime, async {
//!     task::spawn_local(async { 42 }).await.unwrap()
//! });
//! assert_eq!(value, 42);
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use tokio::select;

pub use task::{spawn, spawn_local};
pub use time::{sleep, Duration, Instant};
