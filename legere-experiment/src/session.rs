//! Drives a trial sequence from first screen to log file.

use std::path::{Path, PathBuf};

use legere_core::{TrialError, TrialRecord};
use legere_timing::Clock;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::allocator::{AllocationError, StimulusAllocator};
use crate::config::ExperimentConfig;
use crate::context::SessionContext;
use crate::log::write_session_log;
use crate::station::Station;
use crate::trial::Trial;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Every trial completed; `committed` is the ledger label written, if any.
    Completed {
        log_path: PathBuf,
        committed: Option<String>,
    },
    /// The participant closed the session; the log holds the completed prefix.
    Aborted { log_path: PathBuf },
}

impl SessionOutcome {
    pub fn log_path(&self) -> &Path {
        match self {
            SessionOutcome::Completed { log_path, .. } | SessionOutcome::Aborted { log_path } => {
                log_path
            }
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            SessionOutcome::Completed { .. } => 0,
            SessionOutcome::Aborted { .. } => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Cannot prepare data directory {path}: {source}")]
    Setup {
        path: String,
        source: std::io::Error,
    },

    /// A trial failed for a reason other than a session abort. The partial
    /// log was written to `log_path` when possible.
    #[error("{source}")]
    Trial {
        source: TrialError,
        log_path: Option<PathBuf>,
    },

    #[error("Cannot write session log {path}: {source}")]
    Log {
        path: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    Ledger(#[from] AllocationError),
}

impl SessionError {
    pub fn partial_log(&self) -> Option<&Path> {
        match self {
            SessionError::Trial { log_path, .. } => log_path.as_deref(),
            _ => None,
        }
    }
}

/// The list a session was allocated, committed only on normal completion.
#[derive(Debug, Clone)]
pub struct Allocation {
    pub allocator: StimulusAllocator,
    pub label: String,
}

pub struct SessionRunner {
    config: ExperimentConfig,
    station: Station,
    clock: Box<dyn Clock>,
    session_id: String,
    allocation: Option<Allocation>,
}

impl SessionRunner {
    pub fn new(
        config: ExperimentConfig,
        station: Station,
        clock: Box<dyn Clock>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            config,
            station,
            clock,
            session_id: session_id.into(),
            allocation: None,
        }
    }

    pub fn with_allocation(mut self, allocator: StimulusAllocator, label: impl Into<String>) -> Self {
        self.allocation = Some(Allocation {
            allocator,
            label: label.into(),
        });
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}_log.tsv", self.session_id))
    }

    /// Runs `trials` in order.
    ///
    /// A session abort is an outcome, not an error: the completed prefix is
    /// logged and nothing is committed. Any other failure also logs the
    /// prefix and is then returned.
    pub fn run(self, trials: &mut [Box<dyn Trial>]) -> Result<SessionOutcome, SessionError> {
        let log_path = self.log_path();
        let SessionRunner {
            config,
            mut station,
            clock,
            session_id,
            allocation,
        } = self;

        std::fs::create_dir_all(&config.data_dir).map_err(|source| SessionError::Setup {
            path: config.data_dir.display().to_string(),
            source,
        })?;

        let mut ctx = SessionContext::start(clock, session_id, config);
        info!(session = %ctx.session_id, trials = trials.len(), "session started");

        match drive(&mut ctx, &mut station, trials) {
            Ok(()) => {
                let records = match trials
                    .iter()
                    .map(|t| t.get_data())
                    .collect::<Result<Vec<TrialRecord>, TrialError>>()
                {
                    Ok(records) => records,
                    Err(source) => {
                        return Err(SessionError::Trial {
                            log_path: flush_partial(&log_path, trials),
                            source,
                        })
                    }
                };
                write_session_log(&log_path, &records).map_err(|source| SessionError::Log {
                    path: log_path.display().to_string(),
                    source,
                })?;

                let committed = match allocation {
                    Some(Allocation { allocator, label }) => {
                        allocator.commit(&label)?;
                        Some(label)
                    }
                    None => None,
                };
                info!("Experiment finished. Session log stored in: {}", log_path.display());
                Ok(SessionOutcome::Completed {
                    log_path,
                    committed,
                })
            }
            Err(TrialError::SessionAbort) => {
                info!("Experiment aborted.");
                match flush_partial(&log_path, trials) {
                    Some(log_path) => Ok(SessionOutcome::Aborted { log_path }),
                    None => Err(SessionError::Log {
                        path: log_path.display().to_string(),
                        source: std::io::Error::other("partial log could not be written"),
                    }),
                }
            }
            Err(source) => {
                error!("An error occurred: {source}");
                Err(SessionError::Trial {
                    log_path: flush_partial(&log_path, trials),
                    source,
                })
            }
        }
    }
}

fn drive(
    ctx: &mut SessionContext,
    station: &mut Station,
    trials: &mut [Box<dyn Trial>],
) -> Result<(), TrialError> {
    let total = trials.iter().filter(|t| t.kind().counts_progress()).count();
    for trial in trials.iter_mut() {
        let pno = ctx.progress_index;
        trial.activate(ctx, station, pno)?;
        if trial.kind().counts_progress() {
            ctx.progress_index += 1;
            station.surface.progress(ctx.progress_index, total);
        }
    }
    Ok(())
}

/// Records of the completed prefix: stops at the first trial that did not
/// complete, even if later ones did.
pub fn completed_prefix(trials: &[Box<dyn Trial>]) -> Vec<TrialRecord> {
    trials.iter().map_while(|t| t.get_data().ok()).collect()
}

fn flush_partial(log_path: &Path, trials: &[Box<dyn Trial>]) -> Option<PathBuf> {
    let records = completed_prefix(trials);
    match write_session_log(log_path, &records) {
        Ok(()) => {
            info!("Session log stored in: {}", log_path.display());
            Some(log_path.to_path_buf())
        }
        Err(e) => {
            warn!("Emergency save of {} failed: {e}", log_path.display());
            None
        }
    }
}
