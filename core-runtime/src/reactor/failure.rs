use super::panic_capture;
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use thiserror::Error;

/// What a task body may return.
///
/// Implemented for `()` and for `Result<(), E>` with any error convertible
/// into `anyhow::Error`, so task bodies can use `?` freely.
pub trait TaskOutput {
    fn into_result(self) -> anyhow::Result<()>;
}

impl TaskOutput for () {
    fn into_result(self) -> anyhow::Result<()> {
        Ok(())
    }
}

impl<E> TaskOutput for Result<(), E>
where
    E: Into<anyhow::Error>,
{
    fn into_result(self) -> anyhow::Result<()> {
        self.map_err(Into::into)
    }
}

/// Why a task did not complete.
#[derive(Debug, Error)]
pub enum TaskFailure {
    /// The task returned an error
    #[error("{0:#}")]
    Failed(anyhow::Error),

    /// The task panicked
    #[error("task panicked: {message}")]
    Panicked {
        message: String,
        /// `file:line:col` of the panic, when known
        location: Option<String>,
        /// Rendered stack of the panicking task, when captured
        trace: Option<String>,
    },
}

impl TaskFailure {
    /// Wraps a panic payload caught at the scheduling boundary.
    ///
    /// Inside a guarded task the stack was recorded at the panic site.
    /// Otherwise a backtrace is taken here, which only happens when
    /// `RUST_BACKTRACE`/`RUST_LIB_BACKTRACE` enable capture.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(text) = payload.downcast_ref::<&'static str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        };

        let (location, trace) = match panic_capture::take() {
            Some(site) => (site.location, Some(site.backtrace)),
            None => {
                let backtrace = Backtrace::capture();
                let trace = (backtrace.status() == BacktraceStatus::Captured)
                    .then(|| backtrace.to_string());
                (None, trace)
            }
        };

        TaskFailure::Panicked {
            message,
            location,
            trace,
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, TaskFailure::Panicked { .. })
    }

    /// One-line summary, including the error's cause chain.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Full diagnostic text: the message, causes and any captured backtrace,
    /// newline-joined.
    pub fn report(&self) -> String {
        match self {
            // anyhow's Debug output lists the cause chain and, when
            // captured, the backtrace below the message.
            TaskFailure::Failed(err) => format!("{:?}", err),
            TaskFailure::Panicked {
                location, trace, ..
            } => {
                let mut report = self.to_string();
                if let Some(location) = location {
                    report.push_str(&format!("\n  at {}", location));
                }
                if let Some(trace) = trace {
                    report.push('\n');
                    report.push_str(trace.trim_end());
                }
                report
            }
        }
    }
}

impl From<anyhow::Error> for TaskFailure {
    fn from(err: anyhow::Error) -> Self {
        TaskFailure::Failed(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn test_unit_output_is_success() {
        assert!(().into_result().is_ok());
    }

    #[test]
    fn test_result_output_converts_errors() {
        let io: Result<(), std::io::Error> = Err(std::io::Error::other("socket closed"));
        let err = io.into_result().unwrap_err();
        assert_eq!(err.to_string(), "socket closed");
    }

    #[test]
    fn test_failed_message_includes_cause_chain() {
        let err = Err::<(), _>(anyhow!("connection reset"))
            .context("loading room")
            .unwrap_err();
        let failure = TaskFailure::from(err);

        assert_eq!(failure.message(), "loading room: connection reset");
        let report = failure.report();
        assert!(report.starts_with("loading room"));
        assert!(report.contains("connection reset"));
        assert!(!failure.is_panic());
    }

    #[test]
    fn test_panic_payloads() {
        let failure = TaskFailure::from_panic(Box::new("boom"));
        assert!(failure.is_panic());
        assert_eq!(failure.message(), "task panicked: boom");
        assert!(failure.report().starts_with("task panicked: boom"));

        let failure = TaskFailure::from_panic(Box::new(String::from("kaboom")));
        assert_eq!(failure.message(), "task panicked: kaboom");

        let failure = TaskFailure::from_panic(Box::new(17_u32));
        assert_eq!(failure.message(), "task panicked: non-string panic payload");
    }
}
