//! The process-wide loop is a singleton, so the whole lifecycle runs as one
//! sequential test.

use anyhow::anyhow;
use std::sync::{mpsc, Arc};
use std::time::Duration;
use turntabler::{LogLevel, MemoryLogger};

#[test]
fn test_process_wide_loop_lifecycle() {
    let memory = Arc::new(MemoryLogger::new());
    turntabler::set_logger(memory.clone());

    assert!(turntabler::logger().same_slot(turntabler::runner().logger()));
    assert!(!turntabler::is_running());
    assert!(!turntabler::in_context());

    // Interactive: the loop lives on its own thread.
    turntabler::interactive().unwrap();
    turntabler::interactive().unwrap();
    assert!(turntabler::is_running());
    assert_eq!(turntabler::runner().reactor().starts(), 1);

    let (tx, rx) = mpsc::channel();
    turntabler::run(|| async { Err::<(), _>(anyhow!("boom")) }).unwrap();
    turntabler::run(move || async move { tx.send(turntabler::in_context()).unwrap() }).unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(5)).unwrap());

    turntabler::shutdown().unwrap();
    assert!(!turntabler::is_running());

    let errors = memory.entries_at(LogLevel::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("boom"));

    // Blocking: the first run drives the loop until a task stops it.
    memory.clear();
    let id = turntabler::run(|| async {
        assert!(turntabler::is_running());
        turntabler::stop();
    })
    .unwrap();

    assert!(!turntabler::is_running());
    assert_eq!(turntabler::runner().reactor().starts(), 2);
    assert!(memory.is_empty(), "task {} failed: {:?}", id, memory.entries());
    assert!(!turntabler::stop());
}
