use crate::error::TrialError;

/// Lifecycle of a single trial.
///
/// Every trial walks `Inactive -> Activating -> AwaitingEvent -> Completed`
/// and never skips a step.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum TrialPhase {
    #[default]
    Inactive,
    Activating,
    AwaitingEvent,
    Completed,
}

impl TrialPhase {
    pub fn next(&self) -> Option<Self> {
        use TrialPhase::*;
        Some(match self {
            Inactive => Activating,
            Activating => AwaitingEvent,
            AwaitingEvent => Completed,
            Completed => return None,
        })
    }

    /// Moves to `to`, which must be the immediate successor of `self`.
    pub fn advance_to(self, to: TrialPhase) -> Result<TrialPhase, TrialError> {
        if self.next() == Some(to) {
            Ok(to)
        } else {
            Err(TrialError::InvalidTransition { from: self, to })
        }
    }

    pub fn allows_input(&self) -> bool {
        matches!(self, Self::AwaitingEvent)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    pub fn has_started(&self) -> bool {
        !matches!(self, Self::Inactive)
    }
}
