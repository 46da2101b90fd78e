//! # Host Bridge Traits
//!
//! Contract between the Turntabler core and the host application for
//! diagnostics.
//!
//! ## Overview
//!
//! The core reports everything it recovers from (most importantly failures of
//! scheduled tasks) through a [`LoggerSink`](logging::LoggerSink). Hosts pick
//! the sink: the default [`ConsoleLogger`](logging::ConsoleLogger) writes to
//! stdout, [`MemoryLogger`](logging::MemoryLogger) keeps entries for later
//! inspection, and anything else (files, syslog, an in-app console) can be
//! plugged in by implementing the trait.
//!
//! ## Error Handling
//!
//! Sinks report problems with [`BridgeError`](error::BridgeError). The core
//! never lets a sink error interrupt the event loop; it falls back to stderr.
//!
//! ## Thread Safety
//!
//! Sinks require `Send + Sync`: the same sink is written from the event loop
//! thread and from foreground threads.

pub mod error;
pub mod logging;

pub use error::BridgeError;

pub use logging::{ConsoleFormat, ConsoleLogger, LogEntry, LogLevel, LoggerSink, MemoryLogger};
