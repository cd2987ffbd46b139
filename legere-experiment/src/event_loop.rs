//! Cooperative polling: every wait is a loop of bounded `poll` ticks, so a
//! close request is seen within one tick wherever the engine is blocked.

use std::time::Duration;

use legere_core::{Signal, TrialError};
use tracing::{debug, trace, warn};

use crate::config::GazeTriggerConfig;
use crate::context::SessionContext;
use crate::station::Station;

/// Polls until `accept` maps a signal to a value. Close aborts the session;
/// signals `accept` rejects are dropped.
pub fn wait_for_signal<T>(
    ctx: &SessionContext,
    station: &mut Station,
    mut accept: impl FnMut(&Signal) -> Option<T>,
) -> Result<T, TrialError> {
    let tick = ctx.config.poll_interval();
    loop {
        match station.input.poll(tick)? {
            None => continue,
            Some(signal) if signal.is_close() => return Err(TrialError::SessionAbort),
            Some(signal) => match accept(&signal) {
                Some(value) => return Ok(value),
                None => trace!(?signal, "ignored"),
            },
        }
    }
}

/// Keeps polling for `duration` of session time, honouring only Close.
pub fn idle(ctx: &SessionContext, station: &mut Station, duration: Duration) -> Result<(), TrialError> {
    let tick = ctx.config.poll_interval();
    let deadline = ctx.clock.elapsed() + duration;
    loop {
        let now = ctx.clock.elapsed();
        if now >= deadline {
            return Ok(());
        }
        let timeout = (deadline - now).min(tick);
        if station.input.poll(timeout)?.is_some_and(|s| s.is_close()) {
            return Err(TrialError::SessionAbort);
        }
    }
}

/// Circular trigger zone in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeTrigger {
    pub point: (f32, f32),
    pub radius: f32,
    pub settle: Duration,
}

impl GazeTrigger {
    pub fn from_config(config: &GazeTriggerConfig, display: (f32, f32)) -> Self {
        Self {
            point: config.trigger_point(display),
            radius: config.radius,
            settle: config.settle(),
        }
    }

    pub fn distance(&self, pos: (f32, f32)) -> f32 {
        let dx = pos.0 - self.point.0;
        let dy = pos.1 - self.point.1;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn contains(&self, pos: (f32, f32)) -> bool {
        self.distance(pos) <= self.radius
    }
}

/// Tracker space (centered, y up) to display space (top-left, y down).
pub fn to_display(gaze: (f32, f32), display: (f32, f32)) -> (f32, f32) {
    (gaze.0 + display.0 / 2.0, display.1 / 2.0 - gaze.1)
}

/// Tracker-space point that maps onto `pos` in display space.
pub fn to_tracker(pos: (f32, f32), display: (f32, f32)) -> (f32, f32) {
    (pos.0 - display.0 / 2.0, display.1 / 2.0 - pos.1)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeOutcome {
    /// Gaze entered the trigger zone at this display position.
    Triggered { at: (f32, f32) },
    /// Escape pressed; the trial ends with the sentinel response.
    Cancelled,
}

/// Waits for the participant to look into the trigger zone.
///
/// Tracker state is refreshed on every tick, but gaze is only sampled once
/// `trigger.settle` has passed since the wait began. Close flushes tracker
/// state and then aborts the session.
pub fn wait_for_gaze(
    ctx: &SessionContext,
    station: &mut Station,
    trigger: &GazeTrigger,
) -> Result<GazeOutcome, TrialError> {
    let tick = ctx.config.poll_interval();
    let display = station.surface.display_size();
    let started = ctx.clock.elapsed();
    let mut ticks = 0u64;

    loop {
        ticks += 1;
        match station.input.poll(tick)? {
            Some(Signal::Close) => {
                flush_tracker(station);
                return Err(TrialError::SessionAbort);
            }
            Some(Signal::Cancel) => return Ok(GazeOutcome::Cancelled),
            _ => {}
        }
        let tracker = station.tracker()?;
        tracker.refresh_state()?;
        if ctx.clock.elapsed().saturating_sub(started) < trigger.settle {
            continue;
        }

        let pos = to_display(tracker.current_gaze()?.midpoint(), display);
        if trigger.contains(pos) {
            debug!(ticks, x = pos.0, y = pos.1, "gaze trigger reached");
            return Ok(GazeOutcome::Triggered { at: pos });
        }
    }
}

fn flush_tracker(station: &mut Station) {
    if let Some(tracker) = station.tracker.as_mut() {
        if let Err(e) = tracker.refresh_state() {
            warn!("Tracker flush before abort failed: {e}");
        }
    }
}
