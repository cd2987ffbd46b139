use std::time::Duration;

use legere_core::{Signal, StimulusItem, TrialError, TrialKind, ABORTED};
use legere_layout::{layout_words, WordBox};
use tracing::info;

use crate::context::SessionContext;
use crate::event_loop::{idle, wait_for_signal};
use crate::station::{Screen, Station};
use crate::trial::{Trial, TrialCore};

/// On/off durations of the fixation-cross blink: each step is shorter than
/// the last until the base interval drops to 10 ms.
pub fn blink_schedule() -> Vec<(Duration, Duration)> {
    let mut steps = Vec::new();
    let mut t = 200.0f64;
    while t > 10.0 {
        steps.push((ms(30.0 + t), ms(30.0 + t / 2.0)));
        t *= 0.55;
    }
    steps
}

fn ms(v: f64) -> Duration {
    Duration::from_micros((v * 1000.0).round() as u64)
}

/// Single-sentence self-paced reading screen.
#[derive(Debug, Clone)]
pub struct ReadingTrial {
    core: TrialCore,
    words: Vec<String>,
    boxes: Vec<WordBox>,
}

impl ReadingTrial {
    pub fn new(item_id: u32, condition: impl Into<String>, text: impl Into<String>) -> Self {
        Self::with_kind(TrialKind::ReadingTrial, item_id, condition.into(), text.into())
    }

    pub fn from_item(item: &StimulusItem) -> Self {
        Self::new(item.item_id, item.condition.clone(), item.text.clone())
    }

    pub(crate) fn with_kind(kind: TrialKind, item_id: u32, condition: String, text: String) -> Self {
        let words = text.split_whitespace().map(str::to_string).collect();
        let mut core = TrialCore::new(kind);
        let fields = core.fields();
        fields.item_id = Some(item_id);
        fields.condition = Some(condition);
        fields.stimulus = Some(text);
        Self {
            core,
            words,
            boxes: Vec::new(),
        }
    }

    /// Word areas of interest, available once the text was revealed.
    pub fn word_boxes(&self) -> &[WordBox] {
        &self.boxes
    }

    /// Blinks the fixation cross, lays out and shows the sentence, and
    /// records the word boxes in `metadata1`.
    pub(crate) fn reveal(
        &mut self,
        ctx: &mut SessionContext,
        station: &mut Station,
        trigger: Option<(f32, f32)>,
    ) -> Result<(), TrialError> {
        for (on, off) in blink_schedule() {
            station.surface.show(&Screen::Fixation { visible: true })?;
            idle(ctx, station, on)?;
            station.surface.show(&Screen::Fixation { visible: false })?;
            idle(ctx, station, off)?;
        }

        let display = station.surface.display_size();
        let laid_out = {
            let metrics = station.surface.metrics();
            let origin = (
                ctx.config.fixation_cross_size,
                (display.1 - metrics.line_height()) / 2.0,
            );
            let words: Vec<&str> = self.words.iter().map(String::as_str).collect();
            layout_words(&words, metrics, origin, ctx.config.word_spacing, display.0)
        };
        self.boxes = match laid_out {
            Ok(boxes) => boxes,
            Err(overflow) => {
                ctx.clock.sleep(ctx.config.layout_grace());
                return Err(TrialError::LayoutOverflow {
                    stimulus: self.core.peek().stimulus.clone().unwrap_or_default(),
                    needed: overflow.needed,
                    available: overflow.available,
                });
            }
        };

        station.surface.show(&Screen::Reading {
            words: self.words.iter().cloned().zip(self.boxes.iter().copied()).collect(),
            trigger,
        })?;
        station.surface.refresh()?;

        let aois: Vec<String> = self.boxes.iter().map(WordBox::to_string).collect();
        self.core.fields().metadata1 = Some(aois.join(";"));
        Ok(())
    }
}

impl Trial for ReadingTrial {
    fn core(&self) -> &TrialCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TrialCore {
        &mut self.core
    }

    fn prelude(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        self.reveal(ctx, station, None)
    }

    fn wait(&mut self, ctx: &mut SessionContext, station: &mut Station) -> Result<(), TrialError> {
        let aborted = wait_for_signal(ctx, station, |s| match s {
            Signal::Confirm => Some(false),
            Signal::Cancel => Some(true),
            _ => None,
        })?;
        if aborted {
            self.core.fields().response = Some(ABORTED.to_string());
            info!("  Page aborted.");
        }
        Ok(())
    }
}
