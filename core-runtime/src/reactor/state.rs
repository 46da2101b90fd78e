use std::fmt;

/// Where the event loop is in its lifecycle.
///
/// `Stopped → Starting → Running → Stopping → Stopped`. A stop requested
/// while `Starting` goes straight to `Stopping`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoopState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl LoopState {
    /// Only a running loop accepts tasks on its queue.
    pub fn accepts_tasks(&self) -> bool {
        matches!(self, LoopState::Running)
    }

    /// `Starting` and `Stopping` resolve on their own; callers wait them out.
    pub fn is_transient(&self) -> bool {
        matches!(self, LoopState::Starting | LoopState::Stopping)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopState::Stopped => "stopped",
            LoopState::Starting => "starting",
            LoopState::Running => "running",
            LoopState::Stopping => "stopping",
        })
    }
}

/// Which thread hosts the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopMode {
    /// Dedicated thread; the foreground stays free (interactive consoles)
    Detached,
    /// The caller's thread, until the loop stops
    Blocking,
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoopMode::Detached => "detached",
            LoopMode::Blocking => "blocking",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_running_accepts_tasks() {
        assert!(LoopState::Running.accepts_tasks());
        assert!(!LoopState::Stopped.accepts_tasks());
        assert!(!LoopState::Starting.accepts_tasks());
        assert!(!LoopState::Stopping.accepts_tasks());
    }

    #[test]
    fn test_transient_states() {
        assert!(LoopState::Starting.is_transient());
        assert!(LoopState::Stopping.is_transient());
        assert!(!LoopState::Running.is_transient());
        assert!(!LoopState::Stopped.is_transient());
    }
}
