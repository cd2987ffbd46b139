use legere_core::{Signal, TrialError, TrialKind};

use crate::context::SessionContext;
use crate::event_loop::wait_for_signal;
use crate::station::{Screen, Station};
use crate::trial::{Trial, TrialCore};

/// Asks the experimenter for the participant ID. The entry is stored as is.
#[derive(Debug, Clone)]
pub struct SubjectIdPage {
    core: TrialCore,
}

impl SubjectIdPage {
    pub fn new() -> Self {
        Self {
            core: TrialCore::new(TrialKind::SubjectIdPage),
        }
    }
}

impl Default for SubjectIdPage {
    fn default() -> Self {
        Self::new()
    }
}

impl Trial for SubjectIdPage {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, _ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        station.surface.show(&Screen::Entry {
            prompt: "Please enter participant ID:".into(),
        })?;
        station.surface.refresh()
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        let entered = wait_for_signal(ctx, station, |s| match s {
            Signal::Submit(text) => Some(text.clone()),
            _ => None,
        })?;
        ctx.participant_id = Some(entered.clone());
        self.core.fields().response = Some(entered);
        Ok(())
    }
}
