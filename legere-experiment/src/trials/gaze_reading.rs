use legere_core::{StimulusItem, TrialError, TrialKind, ABORTED};
use tracing::info;

use crate::config::GazeTriggerConfig;
use crate::context::SessionContext;
use crate::event_loop::{wait_for_gaze, GazeOutcome, GazeTrigger};
use crate::log::write_samples;
use crate::station::Station;
use crate::trial::{Trial, TrialCore};
use crate::trials::ReadingTrial;

/// Reading trial that ends when the participant looks at the trigger
/// point, with gaze recorded for the whole trial.
#[derive(Debug, Clone)]
pub struct GazeContingentReadingTrial {
    reading: ReadingTrial,
    trigger_config: Option<GazeTriggerConfig>,
    trigger: Option<GazeTrigger>,
}

impl GazeContingentReadingTrial {
    pub fn new(item_id: u32, condition: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            reading: ReadingTrial::with_kind(
                TrialKind::GazeContingentReadingTrial,
                item_id,
                condition.into(),
                text.into(),
            ),
            trigger_config: None,
            trigger: None,
        }
    }

    pub fn from_item(item: &StimulusItem) -> Self {
        Self::new(item.item_id, item.condition.clone(), item.text.clone())
    }

    /// Trigger geometry for this trial instead of the session default.
    pub fn with_trigger(mut self, config: GazeTriggerConfig) -> Self {
        self.trigger_config = Some(config);
        self
    }

    pub fn trigger(&self) -> Option<&GazeTrigger> {
        self.trigger.as_ref()
    }

    fn recording_name(&self, ctx: &SessionContext) -> String {
        let record = self.reading.core().peek();
        format!(
            "{}_{}_{:03}_{}.tsv",
            ctx.session_id,
            record.trial_type.name(),
            record.item_id.unwrap_or_default(),
            record.condition.as_deref().unwrap_or_default(),
        )
    }
}

impl Trial for GazeContingentReadingTrial {
    fn core(&self) -> &TrialCore {
        self.reading.core()
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        self.reading.core_mut()
    }

    fn prelude(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        // fail before the blink if there is nothing to read gaze from
        station.tracker()?;
        let config = self.trigger_config.as_ref().unwrap_or(&ctx.config.gaze);
        let trigger = GazeTrigger::from_config(config, station.surface.display_size());
        self.trigger = Some(trigger);

        self.reading.reveal(ctx, station, Some(trigger.point))?;
        station.tracker()?.start_recording()
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        let trigger = match self.trigger {
            Some(trigger) => trigger,
            None => GazeTrigger::from_config(&ctx.config.gaze, station.surface.display_size()),
        };
        match wait_for_gaze(ctx, station, &trigger)? {
            GazeOutcome::Triggered { at } => {
                info!("  Gaze trigger at ({:.0}, {:.0})", at.0, at.1);
            }
            GazeOutcome::Cancelled => {
                self.core_mut().fields().response = Some(ABORTED.to_string());
                info!("  Page aborted.");
            }
        }
        Ok(())
    }

    fn teardown(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        let samples = station.tracker()?.stop_recording()?;
        let name = self.recording_name(ctx);
        write_samples(&ctx.data_dir().join(&name), &samples)?;
        self.core_mut().fields().metadata2 = Some(name);
        Ok(())
    }
}
