use legere_core::{TrialError, TrialKind, TrialPhase, TrialRecord};
use tracing::{info, warn};

use crate::context::SessionContext;
use crate::station::Station;

/// Lifecycle bookkeeping shared by every trial kind: phase and record.
#[derive(Debug, Clone)]
pub struct TrialCore {
    phase: TrialPhase,
    record: TrialRecord,
    records_end_time: bool,
}

impl TrialCore {
    pub fn new(kind: TrialKind) -> Self {
        Self {
            phase: TrialPhase::Inactive,
            record: TrialRecord::new(kind),
            records_end_time: true,
        }
    }

    /// Bookkeeping-only trials carry a start time but no end time.
    pub fn without_end_time(mut self) -> Self {
        self.records_end_time = false;
        self
    }

    pub fn kind(&self) -> TrialKind {
        self.record.trial_type
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Fields a trial fills in while it runs.
    pub fn fields(&mut self) -> &mut TrialRecord {
        &mut self.record
    }

    pub fn peek(&self) -> &TrialRecord {
        &self.record
    }

    fn begin(&mut self, pno: usize, now: f64) -> Result<(), TrialError> {
        self.phase = self.phase.advance_to(TrialPhase::Activating)?;
        self.record.pno = Some(pno);
        self.record.start_time = Some(now);
        Ok(())
    }

    fn await_input(&mut self) -> Result<(), TrialError> {
        self.phase = self.phase.advance_to(TrialPhase::AwaitingEvent)?;
        Ok(())
    }

    fn ensure_started(&self) -> Result<(), TrialError> {
        if self.phase.has_started() {
            Ok(())
        } else {
            Err(self.not_ready())
        }
    }

    fn ensure_awaiting(&self) -> Result<(), TrialError> {
        if self.phase.allows_input() {
            Ok(())
        } else {
            Err(self.not_ready())
        }
    }

    fn finish(&mut self, now: f64) -> Result<(), TrialError> {
        self.ensure_started()?;
        self.phase = self.phase.advance_to(TrialPhase::Completed)?;
        if self.records_end_time {
            self.record.end_time = Some(now);
        }
        Ok(())
    }

    pub fn record(&self) -> Result<TrialRecord, TrialError> {
        if self.phase.is_completed() {
            Ok(self.record.clone())
        } else {
            Err(self.not_ready())
        }
    }

    fn not_ready(&self) -> TrialError {
        TrialError::NotReady {
            trial_type: self.kind().name(),
            phase: self.phase,
        }
    }
}

/// One screen of the session.
///
/// Kinds differ in `prelude`, `wait` and `teardown`; the lifecycle methods
/// are shared and should not be overridden.
pub trait Trial {
    fn core(&self) -> &TrialCore;
    fn core_mut(&mut self) -> &mut TrialCore;

    fn kind(&self) -> TrialKind {
        self.core().kind()
    }

    fn phase(&self) -> TrialPhase {
        self.core().phase()
    }

    /// One-time setup once the trial is on screen. May block.
    fn prelude(&mut self, _ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        station.surface.refresh()
    }

    /// The wait policy: returns once the trial's exit condition is met.
    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError>;

    /// Runs before the end time is taken.
    fn teardown(&mut self, _ctx: &mut SessionContext, _station: &mut Station) -> Result<(), TrialError> {
        Ok(())
    }

    /// `Inactive -> Activating -> AwaitingEvent`: stamps the start time and
    /// runs the prelude, but does not wait.
    fn present(
        &mut self,
        ctx: &mut SessionContext,
        station: &mut Station,
        pno: usize,
    ) -> Result<(), TrialError> {
        let now = ctx.now();
        self.core_mut().begin(pno, now)?;
        log_activation(self.core().peek());
        self.prelude(ctx, station)?;
        self.core_mut().await_input()
    }

    /// Presents the trial and waits until it completes.
    fn activate(
        &mut self,
        ctx: &mut SessionContext,
        station: &mut Station,
        pno: usize,
    ) -> Result<(), TrialError> {
        self.present(ctx, station, pno)?;
        self.handle_event(ctx, station)
    }

    /// Waits for the trial's exit condition, then deactivates. Only valid
    /// once `present` has run.
    fn handle_event(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        self.core().ensure_awaiting()?;
        self.wait(ctx, station)?;
        self.deactivate(ctx, station)
    }

    /// `AwaitingEvent -> Completed`: screenshot, teardown, end time.
    fn deactivate(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        self.core().ensure_started()?;
        if self.kind().is_experimental() {
            take_screenshot(self.core_mut(), ctx, station);
        }
        self.teardown(ctx, station)?;
        station.surface.hide()?;
        let now = ctx.now();
        self.core_mut().finish(now)
    }

    fn get_data(&self) -> Result<TrialRecord, TrialError> {
        self.core().record()
    }
}

/// `<session>_<pno>_<type>_<item>_<condition>.png`, stored in the data dir.
fn take_screenshot(core: &mut TrialCore, ctx: &SessionContext, station: &mut Station) {
    let Some(camera) = station.camera.as_mut() else {
        return;
    };
    let record = core.fields();
    let name = format!(
        "{}_{:03}_{}_{:03}_{}.png",
        ctx.session_id,
        record.pno.unwrap_or_default(),
        record.trial_type.name(),
        record.item_id.unwrap_or_default(),
        record.condition.as_deref().unwrap_or_default(),
    );
    if let Err(e) = camera.capture(&ctx.data_dir().join(&name)) {
        warn!("Screenshot failed: {name}: {e}");
    }
    record.screenshot = Some(name);
}

fn log_activation(record: &TrialRecord) {
    let stim = abbreviate(record.stimulus.as_deref().unwrap_or_default(), 50);
    let pno = record.pno.unwrap_or_default();
    let kind = record.trial_type;
    match (record.item_id, record.condition.as_deref()) {
        (Some(item), Some(condition)) => info!("{pno}, {kind} ({item}, {condition}): {stim}"),
        _ if !stim.is_empty() => info!("{pno}, {kind}: {stim}"),
        _ => info!("{pno}, {kind}"),
    }
}

/// Drops newlines and cuts to `max` characters, ending in an ellipsis.
pub fn abbreviate(text: &str, max: usize) -> String {
    let flat: String = text.chars().filter(|c| *c != '\n').collect();
    if flat.chars().count() > max {
        let mut cut: String = flat.chars().take(max.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviation_keeps_short_text() {
        assert_eq!(abbreviate("While Bill\nhunted", 50), "While Billhunted");
        let long = "x".repeat(60);
        let cut = abbreviate(&long, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn core_refuses_out_of_order_use() {
        let mut core = TrialCore::new(TrialKind::Instructions);
        assert!(matches!(core.finish(0.0), Err(TrialError::NotReady { .. })));
        assert!(matches!(core.record(), Err(TrialError::NotReady { .. })));

        core.begin(0, 1.0).unwrap();
        assert!(matches!(
            core.finish(2.0),
            Err(TrialError::InvalidTransition { .. })
        ));
        core.await_input().unwrap();
        core.finish(2.0).unwrap();
        let record = core.record().unwrap();
        assert_eq!(record.start_time, Some(1.0));
        assert_eq!(record.end_time, Some(2.0));
    }
}
