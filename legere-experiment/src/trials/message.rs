use legere_core::{TrialError, TrialKind};

use crate::context::SessionContext;
use crate::station::Station;
use crate::trial::{Trial, TrialCore};

/// Timestamped note in the log; nothing is shown.
#[derive(Debug, Clone)]
pub struct Message {
    core: TrialCore,
}

impl Message {
    pub fn new(note: impl Into<String>) -> Self {
        let mut core = TrialCore::new(TrialKind::Message).without_end_time();
        core.fields().metadata1 = Some(note.into());
        Self { core }
    }
}

impl Trial for Message {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, _ctx: &mut SessionContext, _station: &mut Station) -> Result<(), TrialError> {
        Ok(())
    }

    fn wait(&mut self, _ctx: &mut SessionContext, _station: &mut Station) -> Result<(), TrialError> {
        Ok(())
    }
}
