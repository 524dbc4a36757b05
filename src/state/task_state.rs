/// Fetch task state definitions
///
/// A fetch task is single-use: it moves forward through these states once and
/// is never restarted.
use crate::CrawlError;
use std::fmt;

/// Represents the current state of a fetch task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Task has been spawned but has not started its fetch yet
    Started,

    /// Task is fetching, scanning and handing content to the sink
    Running,

    // ===== Terminal States =====
    /// Task finished and reported its links to the coordinator
    Done,

    /// Task aborted; no links were reported
    Failed,
}

impl TaskState {
    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Legal transitions: Started -> Running, Started -> Failed,
    /// Running -> Done, Running -> Failed.
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        matches!(
            (self, next),
            (Self::Started, Self::Running)
                | (Self::Started, Self::Failed)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Failed)
        )
    }

    /// Performs a transition, rejecting illegal ones
    pub fn transition(self, next: TaskState) -> Result<TaskState, CrawlError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CrawlError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    /// Short lowercase name used in log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
