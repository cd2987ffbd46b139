use ab_glyph::{Font, FontVec, InvalidFont, PxScale, ScaleFont};

/// Measures rendered text in display units.
pub trait TextMetrics {
    fn advance(&self, text: &str) -> f32;
    fn line_height(&self) -> f32;
}

/// Fixed-width cells, e.g. a terminal or a Courier-like font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    pub char_width: f32,
    pub line_height: f32,
}

impl MonospaceMetrics {
    pub fn new(char_width: f32, line_height: f32) -> Self {
        Self {
            char_width,
            line_height,
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn advance(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.char_width
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}

/// Metrics taken from an outline font at a given pixel size.
pub struct GlyphMetrics {
    font: FontVec,
    scale: PxScale,
}

impl GlyphMetrics {
    pub fn from_bytes(bytes: Vec<u8>, size_px: f32) -> Result<Self, InvalidFont> {
        Ok(Self {
            font: FontVec::try_from_vec(bytes)?,
            scale: PxScale::from(size_px),
        })
    }
}

impl TextMetrics for GlyphMetrics {
    fn advance(&self, text: &str) -> f32 {
        let sf = self.font.as_scaled(self.scale);
        let mut pen_x = 0.0f32;
        let mut prev = None;
        for ch in text.chars() {
            let id = self.font.glyph_id(ch);
            if let Some(prev) = prev {
                pen_x += sf.kern(prev, id);
            }
            pen_x += sf.h_advance(id);
            prev = Some(id);
        }
        pen_x
    }

    fn line_height(&self) -> f32 {
        let sf = self.font.as_scaled(self.scale);
        sf.height() + sf.line_gap()
    }
}

impl std::fmt::Debug for GlyphMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphMetrics")
            .field("scale", &self.scale)
            .finish()
    }
}
