use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where the gaze trigger point sits on the display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerAnchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    /// Absolute display coordinates.
    Point { x: f32, y: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeTriggerConfig {
    pub anchor: TriggerAnchor,
    /// Distance of the trigger point from the anchoring corner, along both axes.
    pub inset: f32,
    pub radius: f32,
    pub settle_ms: u64,
}

impl Default for GazeTriggerConfig {
    fn default() -> Self {
        Self {
            anchor: TriggerAnchor::BottomRight,
            inset: 19.0,
            radius: 200.0,
            settle_ms: 500,
        }
    }
}

impl GazeTriggerConfig {
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Trigger point in display coordinates for a display of `size`.
    pub fn trigger_point(&self, size: (f32, f32)) -> (f32, f32) {
        let (w, h) = size;
        let i = self.inset;
        match self.anchor {
            TriggerAnchor::TopLeft => (i, i),
            TriggerAnchor::TopRight => (w - i, i),
            TriggerAnchor::BottomLeft => (i, h - i),
            TriggerAnchor::BottomRight => (w - i, h - i),
            TriggerAnchor::Point { x, y } => (x, y),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub data_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub poll_interval_ms: u64,
    pub yes_key: char,
    pub no_key: char,
    pub word_spacing: f32,
    pub font_size: f32,
    pub font_path: Option<PathBuf>,
    pub fixation_cross_size: f32,
    pub layout_grace_ms: u64,
    pub instruction_preview_chars: usize,
    pub question_probability: f64,
    pub gaze: GazeTriggerConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            ledger_path: PathBuf::from("tested_latin_square_lists.txt"),
            poll_interval_ms: 10,
            yes_key: 'j',
            no_key: 'f',
            word_spacing: 18.0,
            font_size: 22.0,
            font_path: None,
            fixation_cross_size: 38.0,
            layout_grace_ms: 1000,
            instruction_preview_chars: 40,
            question_probability: 0.5,
            gaze: GazeTriggerConfig::default(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

impl ExperimentConfig {
    /// Defaults, overlaid with the JSON file at `path` when given, then with
    /// `LEGERE_DATA_DIR` / `LEGERE_LEDGER` from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
                serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            None => ExperimentConfig::default(),
        };

        if let Ok(v) = std::env::var("LEGERE_DATA_DIR") {
            config.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LEGERE_LEDGER") {
            config.ledger_path = PathBuf::from(v);
        }
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn layout_grace(&self) -> Duration {
        Duration::from_millis(self.layout_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: ExperimentConfig =
            serde_json::from_str(r#"{"poll_interval_ms": 5, "gaze": {"radius": 120.0}}"#).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.gaze.radius, 120.0);
        assert_eq!(config.gaze.anchor, TriggerAnchor::BottomRight);
        assert_eq!(config.yes_key, 'j');
    }

    #[test]
    fn explicit_trigger_point() {
        let config: GazeTriggerConfig =
            serde_json::from_str(r#"{"anchor": {"point": {"x": 10.0, "y": 20.0}}}"#).unwrap();
        assert_eq!(config.trigger_point((800.0, 600.0)), (10.0, 20.0));
    }

    #[test]
    fn corner_trigger_is_inset() {
        let gaze = GazeTriggerConfig::default();
        assert_eq!(gaze.trigger_point((1920.0, 1080.0)), (1901.0, 1061.0));
    }
}
