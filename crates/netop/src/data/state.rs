use std::fmt;

/// Lifecycle state of a [`NetworkOperation`](crate::NetworkOperation).
///
/// `Idle` is the only initial state. `Finished`, `Failed` and `Cancelled`
/// are terminal. `TimedOut` is transient: it resolves into a new `Started`
/// attempt, `Failed`, or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OperationState {
    #[default]
    Idle,
    Started,
    Finished,
    Failed,
    TimedOut,
    Cancelled,
}

impl OperationState {
    pub fn is_terminal(self) -> bool { matches!(self, Self::Finished | Self::Failed | Self::Cancelled) }

    /// Admitted and not yet terminal.
    pub fn is_executing(self) -> bool { matches!(self, Self::Started | Self::TimedOut) }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: OperationState) -> bool {
        use OperationState::*;
        match (self, next) {
            (Idle, Started) => true,
            (Started, Finished | Failed | TimedOut) => true,
            (TimedOut, Started | Failed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OperationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Started => "started",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
