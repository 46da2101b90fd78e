//! A panic escaping the detached loop thread must take the process down.
//! The failing half runs in a child copy of this test binary.

use bridge_traits::logging::MemoryLogger;
use core_runtime::config::ReactorConfig;
use core_runtime::logging::SharedLogger;
use core_runtime::reactor::{Reactor, Runner};
use std::process::Command;
use std::sync::{mpsc, Arc};
use std::time::Duration;

const CHILD_ENV: &str = "TURNTABLER_FATAL_LOOP_CHILD";
const TEST_NAME: &str = "test_detached_loop_panic_aborts_process";

/// Panics when the loop discards the task holding it.
struct ExplodesOnDrop;

impl Drop for ExplodesOnDrop {
    fn drop(&mut self) {
        panic!("record player on fire");
    }
}

fn crash_loop_thread() {
    let memory = Arc::new(MemoryLogger::new());
    let config = ReactorConfig::builder()
        .logger(SharedLogger::new(memory))
        .build()
        .unwrap();
    let runner = Runner::new(Reactor::new(config));
    runner.interactive().unwrap();

    let (started_tx, started_rx) = mpsc::channel();
    let (proceed_tx, proceed_rx) = mpsc::channel::<()>();
    let reactor = runner.reactor().clone();
    runner
        .run(move || async move {
            started_tx.send(()).unwrap();
            proceed_rx.recv().unwrap();
            reactor.stop();
        })
        .unwrap();
    started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    // Stays queued, then gets dropped on the loop thread during teardown.
    let bomb = ExplodesOnDrop;
    runner
        .run(move || {
            let _bomb = bomb;
            async {}
        })
        .unwrap();
    proceed_tx.send(()).unwrap();

    runner.reactor().wait_stopped().unwrap();
    // Only reached if the panic did not abort the process.
    std::thread::sleep(Duration::from_secs(1));
}

#[test]
fn test_detached_loop_panic_aborts_process() {
    if std::env::var_os(CHILD_ENV).is_some() {
        crash_loop_thread();
        return;
    }

    let output = Command::new(std::env::current_exe().unwrap())
        .args(["--exact", TEST_NAME, "--nocapture", "--test-threads=1"])
        .env(CHILD_ENV, "1")
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!output.status.success(), "child survived: {}", stderr);
    assert!(
        stderr.contains("Event loop thread panicked"),
        "stderr: {}",
        stderr
    );

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        assert_eq!(output.status.signal(), Some(6), "stderr: {}", stderr);
    }
}
