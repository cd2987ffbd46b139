use legere_core::{Signal, TrialError, TrialKind};

use crate::context::SessionContext;
use crate::event_loop::wait_for_signal;
use crate::station::{Screen, Station};
use crate::trial::{Trial, TrialCore};

const CONTINUE: &str = "Press space bar to continue.";
const CONSENT: &str = "Press space bar to consent.";

/// Static text page dismissed with the space bar. Also used for consent
/// forms and the bare "continue" page between trials.
#[derive(Debug, Clone)]
pub struct Instructions {
    core: TrialCore,
    lines: Vec<String>,
    prompt: &'static str,
}

impl Instructions {
    pub fn new(text: impl Into<String>) -> Self {
        Self::build(TrialKind::Instructions, text.into(), CONTINUE)
    }

    pub fn consent(text: impl Into<String>) -> Self {
        Self::build(TrialKind::ConsentForm, text.into(), CONSENT)
    }

    /// Navigation-only page; left out of the session log.
    pub fn next() -> Self {
        Self::build(TrialKind::Next, String::new(), CONTINUE)
    }

    /// Sets how much of the text is kept in the `stimulus` column.
    pub fn with_preview(mut self, max_chars: usize) -> Self {
        let text = self.lines.join(" ");
        self.core.fields().stimulus = preview(&text, max_chars);
        self
    }

    fn build(kind: TrialKind, text: String, prompt: &'static str) -> Self {
        let mut core = TrialCore::new(kind);
        core.fields().stimulus = preview(&text, 40);
        let lines = text.lines().map(str::to_string).collect();
        Self {
            core,
            lines,
            prompt,
        }
    }
}

/// Whitespace-collapsed text, cut to `max_chars` with a trailing " …".
fn preview(text: &str, max_chars: usize) -> Option<String> {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.is_empty() {
        return None;
    }
    if flat.chars().count() > max_chars {
        let cut: String = flat.chars().take(max_chars).collect();
        Some(format!("{} …", cut.trim_end()))
    } else {
        Some(flat)
    }
}

impl Trial for Instructions {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, _ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        station.surface.show(&Screen::Text {
            lines: self.lines.clone(),
            prompt: self.prompt.to_string(),
        })?;
        station.surface.refresh()
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        wait_for_signal(ctx, station, |s| matches!(s, Signal::Confirm).then_some(()))
    }
}
