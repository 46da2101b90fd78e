//! # Core Runtime Module
//!
//! Provides the runtime infrastructure every Turntabler client builds on:
//! - Logging and tracing infrastructure, including the process-wide
//!   [`SharedLogger`](logging::SharedLogger)
//! - The cooperative event loop ([`Reactor`](reactor::Reactor)) and the
//!   guarded task [`Runner`](reactor::Runner)
//! - Reactor configuration
//! - Lifecycle event bus
//!
//! ## Overview
//!
//! All client work (socket round trips, room updates, user lookups) runs as
//! `async` tasks on one single-threaded loop. The loop is either hosted on a
//! dedicated thread, leaving the foreground free for an interactive console,
//! or driven on the calling thread until it is told to stop. Failures inside
//! tasks are caught at the scheduling boundary and written to the shared
//! logger; they never take the loop down.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod reactor;

pub use error::{Error, Result};
