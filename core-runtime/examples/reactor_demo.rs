//! Event loop demonstration
//!
//! Starts the loop on a background thread the way an interactive console
//! would, schedules a few cooperating tasks (one of which fails) and shuts
//! down.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example reactor_demo
//!
//! # JSON format
//! cargo run --example reactor_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run --example reactor_demo -- compact "core_runtime=trace"
//! ```

use anyhow::{anyhow, Context};
use bridge_traits::logging::LogLevel;
use core_runtime::config::ReactorConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_runtime::reactor::{Reactor, Runner};
use core_async::time::{sleep, Duration};
use std::env;
use tracing::{info, instrument};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_spans(true);

    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config).context("Failed to initialize logging")?;

    let runner = Runner::new(Reactor::new(
        ReactorConfig::builder().thread_name("demo-loop").build()?,
    ));
    runner.interactive()?;
    info!(running = runner.reactor().is_running(), "Loop started in the background");

    for room in ["lobby", "indie", "jazz"] {
        runner.run(move || join_room(room))?;
    }

    runner.run(|| async {
        sleep(Duration::from_millis(5)).await;
        Err::<(), _>(anyhow!("connection to chat server reset"))
    })?;

    // The foreground stays free while the loop works.
    std::thread::sleep(std::time::Duration::from_millis(100));

    runner.reactor().shutdown()?;
    info!(starts = runner.reactor().starts(), "Loop shut down");
    Ok(())
}

#[instrument]
async fn join_room(room: &'static str) -> anyhow::Result<()> {
    info!("Joining room");
    sleep(Duration::from_millis(20)).await;
    info!(listeners = room.len() * 7, "Joined room");
    Ok(())
}
