//! Error types shared by every legere crate

use thiserror::Error;

use crate::phase::TrialPhase;

/// The stimulus design is not a balanced Latin square or could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DesignError {
    #[error("Design contains no stimulus items")]
    Empty,

    #[error("All items need the same number of sentences: item {item} has {found}, item {reference} has {expected}")]
    UnequalItemSizes {
        item: u32,
        found: usize,
        reference: u32,
        expected: usize,
    },

    #[error("Condition {condition:?} appears more than once in item {item}")]
    DuplicateCondition { item: u32, condition: String },

    #[error("Design looks unbalanced: item {item} has conditions {found:?}, expected {expected:?}")]
    UnbalancedConditions {
        item: u32,
        found: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Unknown list label: {0}")]
    UnknownList(String),

    #[error("Cannot read stimulus file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Malformed stimulus row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },
}

/// Failures raised while a trial is running.
#[derive(Error, Debug)]
pub enum TrialError {
    /// Results requested, or deactivation attempted, out of sequence.
    #[error("{trial_type} is not ready: trial is {phase:?}")]
    NotReady {
        trial_type: &'static str,
        phase: TrialPhase,
    },

    #[error("Invalid trial transition: {from:?} -> {to:?}")]
    InvalidTransition { from: TrialPhase, to: TrialPhase },

    #[error("Text extends beyond window boundaries ({needed:.0} > {available:.0}): {stimulus}")]
    LayoutOverflow {
        stimulus: String,
        needed: f32,
        available: f32,
    },

    #[error("Protocol violation in {trial_type}: {detail}")]
    ProtocolViolation {
        trial_type: &'static str,
        detail: String,
    },

    /// The participant closed the session; unwinds to the session runner.
    #[error("Session aborted")]
    SessionAbort,

    #[error("Eye tracker failure: {0}")]
    Tracker(String),

    #[error("Presentation failure: {0}")]
    Presentation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrialError {
    pub fn is_session_abort(&self) -> bool {
        matches!(self, TrialError::SessionAbort)
    }
}
