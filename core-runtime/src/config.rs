//! # Reactor Configuration
//!
//! Settings for a [`Reactor`](crate::reactor::Reactor), built with
//! [`ReactorConfig::builder()`] and validated up front so that a bad value
//! surfaces as an [`Error::Config`] instead of a panic on the loop thread.
//! Fields are read-only once built, so every `ReactorConfig` in existence
//! has passed validation.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::ReactorConfig;
//!
//! let config = ReactorConfig::builder()
//!     .thread_name("tt-loop")
//!     .stop_when_idle(true)
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.thread_name(), "tt-loop");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::ReactorConfig;
//!
//! let config = ReactorConfig::builder()
//!     .thread_name("")
//!     .build()
//!     .expect("Should fail - empty thread name");
//! ```

use crate::error::{Error, Result};
use crate::logging::SharedLogger;

/// Default name of the dedicated loop thread in interactive mode.
pub const DEFAULT_THREAD_NAME: &str = "turntabler-reactor";

/// Default buffer size of the lifecycle event bus.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

const MAX_EVENT_CAPACITY: usize = 10_000;
const MAX_THREAD_NAME_LEN: usize = 64;

/// Configuration for one event loop.
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    thread_name: String,
    stop_when_idle: bool,
    event_capacity: usize,
    logger: SharedLogger,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stop_when_idle: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
            logger: SharedLogger::default(),
        }
    }
}

impl ReactorConfig {
    /// Creates a new builder for constructing a `ReactorConfig`.
    pub fn builder() -> ReactorConfigBuilder {
        ReactorConfigBuilder::default()
    }

    /// Replaces the failure logger. Cannot invalidate the configuration.
    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Name given to the loop thread when running detached
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Stop a blocking-mode loop once nothing is queued or in flight.
    ///
    /// Never applies to detached loops, which run until stopped.
    pub fn stop_when_idle(&self) -> bool {
        self.stop_when_idle
    }

    /// Buffer size of the lifecycle event bus
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }

    /// Logger that receives task failure reports
    pub fn logger(&self) -> &SharedLogger {
        &self.logger
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Thread name is non-empty, free of NUL bytes and at most 64 bytes
    /// - Event capacity is within 1..=10,000
    pub fn validate(&self) -> Result<()> {
        if self.thread_name.trim().is_empty() {
            return Err(Error::Config("Thread name cannot be empty".to_string()));
        }

        if self.thread_name.contains('\0') {
            return Err(Error::Config(
                "Thread name cannot contain NUL bytes".to_string(),
            ));
        }

        if self.thread_name.len() > MAX_THREAD_NAME_LEN {
            return Err(Error::Config(format!(
                "Thread name exceeds maximum of {} bytes",
                MAX_THREAD_NAME_LEN
            )));
        }

        if self.event_capacity == 0 {
            return Err(Error::Config(
                "Event capacity must be greater than 0".to_string(),
            ));
        }

        if self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(Error::Config(format!(
                "Event capacity exceeds maximum of {}",
                MAX_EVENT_CAPACITY
            )));
        }

        Ok(())
    }
}

/// Builder for constructing [`ReactorConfig`] instances.
#[derive(Default)]
pub struct ReactorConfigBuilder {
    thread_name: Option<String>,
    stop_when_idle: Option<bool>,
    event_capacity: Option<usize>,
    logger: Option<SharedLogger>,
}

impl ReactorConfigBuilder {
    /// Sets the name of the detached loop thread.
    ///
    /// Default: `turntabler-reactor`
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = Some(name.into());
        self
    }

    /// Stop blocking-mode loops once idle.
    ///
    /// Default: `false`
    pub fn stop_when_idle(mut self, enabled: bool) -> Self {
        self.stop_when_idle = Some(enabled);
        self
    }

    /// Sets the lifecycle event buffer size.
    ///
    /// Default: 64
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Injects the logger that receives task failure reports.
    ///
    /// Default: a fresh console logger
    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the final [`ReactorConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when any value fails validation.
    pub fn build(self) -> Result<ReactorConfig> {
        let defaults = ReactorConfig::default();

        let config = ReactorConfig {
            thread_name: self.thread_name.unwrap_or(defaults.thread_name),
            stop_when_idle: self.stop_when_idle.unwrap_or(defaults.stop_when_idle),
            event_capacity: self.event_capacity.unwrap_or(defaults.event_capacity),
            logger: self.logger.unwrap_or(defaults.logger),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ReactorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thread_name(), DEFAULT_THREAD_NAME);
        assert!(!config.stop_when_idle());
        assert_eq!(config.event_capacity(), DEFAULT_EVENT_CAPACITY);
    }

    #[test]
    fn test_builder_overrides() {
        let logger = SharedLogger::default();
        let config = ReactorConfig::builder()
            .thread_name("tt-loop")
            .stop_when_idle(true)
            .event_capacity(8)
            .logger(logger.clone())
            .build()
            .unwrap();

        assert_eq!(config.thread_name(), "tt-loop");
        assert!(config.stop_when_idle());
        assert_eq!(config.event_capacity(), 8);
        assert!(config.logger().same_slot(&logger));
    }

    #[test]
    fn test_rejects_bad_thread_names() {
        for name in ["", "   ", "tt\0loop"] {
            let err = ReactorConfig::builder().thread_name(name).build();
            assert!(matches!(err, Err(Error::Config(_))), "accepted {:?}", name);
        }

        let long = "x".repeat(MAX_THREAD_NAME_LEN + 1);
        assert!(ReactorConfig::builder().thread_name(long).build().is_err());
    }

    #[test]
    fn test_rejects_bad_event_capacity() {
        assert!(ReactorConfig::builder().event_capacity(0).build().is_err());
        assert!(ReactorConfig::builder()
            .event_capacity(MAX_EVENT_CAPACITY + 1)
            .build()
            .is_err());
        assert!(ReactorConfig::builder()
            .event_capacity(MAX_EVENT_CAPACITY)
            .build()
            .is_ok());
    }

    #[test]
    fn test_with_logger_keeps_defaults() {
        let logger = SharedLogger::default();
        let config = ReactorConfig::default().with_logger(logger.clone());

        assert!(config.logger().same_slot(&logger));
        assert_eq!(config.thread_name(), DEFAULT_THREAD_NAME);
        assert!(config.validate().is_ok());
    }
}
