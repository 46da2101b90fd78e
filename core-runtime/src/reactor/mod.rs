//! # Reactor
//!
//! A single-threaded cooperative event loop ([`Reactor`]) and the guarded
//! task scheduler on top of it ([`Runner`]).
//!
//! The loop runs either on a dedicated thread ([`Reactor::start_detached`],
//! for interactive consoles) or on the caller's thread until stopped
//! ([`Reactor::start_blocking`], or implicitly through [`Runner::run`]).
//! Tasks are dispatched in submission order and interleave only at their
//! suspension points.
//!
//! ```no_run
//! use core_runtime::config::ReactorConfig;
//! use core_runtime::reactor::{Reactor, Runner};
//!
//! let runner = Runner::new(Reactor::new(ReactorConfig::default()));
//! runner.interactive().unwrap();
//!
//! let reactor = runner.reactor().clone();
//! runner
//!     .run(move || async move {
//!         println!("on the loop");
//!         reactor.stop();
//!     })
//!     .unwrap();
//!
//! runner.reactor().wait_stopped().unwrap();
//! ```

mod context;
mod event_loop;
mod failure;
mod job;
mod panic_capture;
mod runner;
mod state;

pub use context::in_context;
pub use event_loop::Reactor;
pub use failure::{TaskFailure, TaskOutput};
pub use job::TaskId;
pub use runner::{Runner, FAILURE_TARGET};
pub use state::{LoopMode, LoopState};
