pub mod line;
pub mod metrics;

pub use line::{layout_words, LayoutOverflow, WordBox};
pub use metrics::{GlyphMetrics, MonospaceMetrics, TextMetrics};
