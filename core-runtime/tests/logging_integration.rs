//! Integration tests for logging system

use anyhow::anyhow;
use bridge_traits::logging::{LogLevel, MemoryLogger};
use core_runtime::config::ReactorConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig, SharedLogger};
use core_runtime::reactor::{Reactor, Runner, FAILURE_TARGET};
use core_runtime::Error;
use std::sync::Arc;

#[test]
fn test_mirrored_sink_sees_lifecycle_and_single_failure() {
    // The global subscriber can be installed once per process, so everything
    // that depends on it lives in this one test.
    let memory = Arc::new(MemoryLogger::new());
    let shared = SharedLogger::new(memory.clone());

    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Info)
            .with_logger_sink(Arc::new(shared.clone())),
    )
    .unwrap();

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::Config(_))));

    let config = ReactorConfig::builder()
        .stop_when_idle(true)
        .logger(shared)
        .build()
        .unwrap();
    let runner = Runner::new(Reactor::new(config));

    runner
        .run(|| async { Err::<(), _>(anyhow!("boom")) })
        .unwrap();

    let entries = memory.entries();
    let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"Starting event loop"), "{:?}", messages);
    assert!(messages.contains(&"Event loop stopped"), "{:?}", messages);

    // Failures bypass tracing, so the mirror holds exactly one report.
    let errors = memory.entries_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].target, FAILURE_TARGET);
    assert!(errors[0].message.contains("boom"));

    let starting = entries
        .iter()
        .find(|e| e.message == "Starting event loop")
        .unwrap();
    assert_eq!(starting.level, LogLevel::Info);
    assert_eq!(starting.fields.get("mode").map(String::as_str), Some("blocking"));
}

#[test]
fn test_format_selection() {
    // Debug builds should default to Pretty
    #[cfg(debug_assertions)]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
    }

    // Release builds should default to JSON
    #[cfg(not(debug_assertions))]
    {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Json);
    }
}

#[test]
fn test_filter_configuration() {
    let config = LoggingConfig::default().with_filter("core_runtime=debug,turntabler=trace");

    assert_eq!(
        config.filter,
        Some("core_runtime=debug,turntabler=trace".to_string())
    );
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(config.logger_sink.is_none());
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}
