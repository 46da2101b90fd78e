use thiserror::Error;

use crate::reactor::TaskFailure;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event loop is already running")]
    AlreadyRunning,

    #[error("Event loop is stopping; no further tasks are accepted")]
    Stopped,

    #[error("Cannot drive a blocking event loop from inside another async runtime")]
    NestedRuntime,

    #[error("Task failed: {0}")]
    Task(#[from] TaskFailure),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
