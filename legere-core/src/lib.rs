pub mod error;
pub mod phase;
pub mod signal;
pub mod stimulus;
pub mod trial;

pub use error::{DesignError, TrialError};
pub use phase::TrialPhase;
pub use signal::Signal;
pub use stimulus::{load_stimuli, parse_stimuli, StimulusItem};
pub use trial::{TrialKind, TrialRecord, ABORTED, LOG_COLUMNS};
