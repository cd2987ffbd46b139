use thiserror::Error;
use tracing::debug;

use crate::metrics::TextMetrics;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("line needs {needed:.0} units but only {available:.0} are available")]
pub struct LayoutOverflow {
    pub needed: f32,
    pub available: f32,
}

/// Screen-space box around one word, used as an area of interest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WordBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl WordBox {
    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }
}

impl std::fmt::Display for WordBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.x0.round() as i64,
            self.y0.round() as i64,
            self.x1.round() as i64,
            self.y1.round() as i64
        )
    }
}

/// Lays `words` out on one line starting at `origin`, each word padded by
/// half the word spacing on either side.
///
/// Fails when the last word would end past `available_width`.
pub fn layout_words(
    words: &[&str],
    metrics: &dyn TextMetrics,
    origin: (f32, f32),
    word_spacing: f32,
    available_width: f32,
) -> Result<Vec<WordBox>, LayoutOverflow> {
    let pad = word_spacing / 2.0;
    let height = metrics.line_height();
    let (mut pen_x, y0) = origin;

    let mut boxes = Vec::with_capacity(words.len());
    for word in words {
        let x0 = pen_x + pad;
        let x1 = x0 + metrics.advance(word);
        boxes.push(WordBox {
            x0,
            y0,
            x1,
            y1: y0 + height,
        });
        pen_x = x1 + pad;
    }

    let needed = boxes.last().map(|b| b.x1).unwrap_or(origin.0);
    debug!(words = words.len(), needed, available_width, "laid out line");
    if needed > available_width {
        return Err(LayoutOverflow {
            needed,
            available: available_width,
        });
    }
    Ok(boxes)
}
