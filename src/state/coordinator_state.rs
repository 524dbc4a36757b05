use std::fmt;

/// Lifecycle of the coordinator
///
/// The coordinator starts `Idle`, becomes `Active` on the first link batch and
/// stays there for every later batch. Running out of work does not stop it;
/// only an explicit shutdown moves it to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinatorState {
    Idle,
    Active,
    Stopped,
}

impl CoordinatorState {
    /// State after a link batch has been received
    pub fn on_batch(self) -> Self {
        match self {
            Self::Idle | Self::Active => Self::Active,
            Self::Stopped => Self::Stopped,
        }
    }

    /// Returns true while the coordinator still accepts messages
    pub fn is_running(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Stopped => "stopped",
        };
        write!(f, "{}", name)
    }
}
