use legere_core::{Signal, TrialError, TrialKind};
use tracing::info;

use crate::context::SessionContext;
use crate::event_loop::wait_for_signal;
use crate::station::{Screen, Station};
use crate::trial::{Trial, TrialCore};

/// Runs the tracker's calibration routine, then waits for the space bar.
#[derive(Debug, Clone)]
pub struct GazeCalibration {
    core: TrialCore,
}

impl GazeCalibration {
    pub fn new() -> Self {
        Self {
            core: TrialCore::new(TrialKind::GazeCalibration),
        }
    }
}

impl Default for GazeCalibration {
    fn default() -> Self {
        Self::new()
    }
}

impl Trial for GazeCalibration {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, _ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        station.surface.show(&Screen::Calibration {
            message: "Calibrating eye tracker…".into(),
        })?;
        station.surface.refresh()?;

        let summary = station.tracker()?.calibrate()?;
        info!("Calibration: {summary}");
        self.core.fields().metadata1 = Some(summary);

        station.surface.show(&Screen::Text {
            lines: vec!["Calibration finished.".into()],
            prompt: "Press space bar to continue.".into(),
        })?;
        station.surface.refresh()
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        wait_for_signal(ctx, station, |s| matches!(s, Signal::Confirm).then_some(()))
    }
}
