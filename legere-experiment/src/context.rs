use std::path::PathBuf;

use legere_timing::{Clock, SessionClock};

use crate::config::ExperimentConfig;

/// Per-session state handed to every trial.
#[derive(Debug)]
pub struct SessionContext {
    pub clock: SessionClock,
    pub session_id: String,
    pub config: ExperimentConfig,
    /// Set by the subject ID page once entered.
    pub participant_id: Option<String>,
    /// Number of progress-counting trials completed so far.
    pub progress_index: usize,
}

impl SessionContext {
    /// Starts the session clock now.
    pub fn start(clock: Box<dyn Clock>, session_id: impl Into<String>, config: ExperimentConfig) -> Self {
        Self {
            clock: SessionClock::start(clock),
            session_id: session_id.into(),
            config,
            participant_id: None,
            progress_index: 0,
        }
    }

    pub fn now(&self) -> f64 {
        self.clock.elapsed_secs()
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.config.data_dir
    }
}
