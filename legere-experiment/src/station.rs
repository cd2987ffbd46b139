//! Collaborators the engine drives but does not implement: the screen, the
//! input source, the eye tracker and the screenshot tool.

use std::path::Path;
use std::time::Duration;

use legere_core::{Signal, TrialError};
use legere_layout::{TextMetrics, WordBox};

/// What a trial wants on screen right now.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Blank,
    /// Centered paragraphs with a prompt line at the bottom.
    Text { lines: Vec<String>, prompt: String },
    /// Fixation cross at the start of the reading line.
    Fixation { visible: bool },
    /// Sentence revealed word by word at precomputed positions, plus the
    /// cross marking the gaze trigger when there is one.
    Reading {
        words: Vec<(String, WordBox)>,
        trigger: Option<(f32, f32)>,
    },
    Question { text: String, hint: String },
    /// Statement and question with the two answer options in display order.
    Choice {
        statement: String,
        question: String,
        options: [String; 2],
        hint: String,
    },
    Entry { prompt: String },
    Calibration { message: String },
}

pub trait Presentation {
    fn show(&mut self, screen: &Screen) -> Result<(), TrialError>;
    fn hide(&mut self) -> Result<(), TrialError>;
    fn refresh(&mut self) -> Result<(), TrialError>;
    /// Usable drawing area in display units.
    fn display_size(&self) -> (f32, f32);
    fn metrics(&self) -> &dyn TextMetrics;
    fn progress(&mut self, _done: usize, _total: usize) {}
}

pub trait InputSource {
    /// Waits at most `timeout` for one signal; `None` is not an error.
    fn poll(&mut self, timeout: Duration) -> Result<Option<Signal>, TrialError>;
}

/// Binocular gaze in tracker coordinates: origin at the display center,
/// y pointing up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GazeSample {
    pub left: (f32, f32),
    pub right: (f32, f32),
}

impl GazeSample {
    pub fn new(left_x: f32, left_y: f32, right_x: f32, right_y: f32) -> Self {
        Self {
            left: (left_x, left_y),
            right: (right_x, right_y),
        }
    }

    pub fn midpoint(&self) -> (f32, f32) {
        (
            (self.left.0 + self.right.0) / 2.0,
            (self.left.1 + self.right.1) / 2.0,
        )
    }
}

/// A gaze sample with its tracker time tag, as buffered during recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedSample {
    pub time_tag: f64,
    pub gaze: GazeSample,
}

pub trait EyeTracker {
    /// Pulls fresh state from the device; call before sampling.
    fn refresh_state(&mut self) -> Result<(), TrialError>;
    fn current_gaze(&mut self) -> Result<GazeSample, TrialError>;
    /// Runs the device calibration routine, returning a short summary.
    fn calibrate(&mut self) -> Result<String, TrialError>;
    fn start_recording(&mut self) -> Result<(), TrialError>;
    fn stop_recording(&mut self) -> Result<Vec<RecordedSample>, TrialError>;
}

pub trait Screenshotter {
    fn capture(&mut self, path: &Path) -> std::io::Result<()>;
}

/// Everything attached to the lab station for one session.
pub struct Station {
    pub surface: Box<dyn Presentation>,
    pub input: Box<dyn InputSource>,
    pub tracker: Option<Box<dyn EyeTracker>>,
    pub camera: Option<Box<dyn Screenshotter>>,
}

impl Station {
    pub fn new(surface: Box<dyn Presentation>, input: Box<dyn InputSource>) -> Self {
        Self {
            surface,
            input,
            tracker: None,
            camera: None,
        }
    }

    pub fn with_tracker(mut self, tracker: Box<dyn EyeTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    pub fn with_camera(mut self, camera: Box<dyn Screenshotter>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn tracker(&mut self) -> Result<&mut dyn EyeTracker, TrialError> {
        match self.tracker.as_mut() {
            Some(tracker) => Ok(tracker.as_mut()),
            None => Err(TrialError::Tracker("no eye tracker attached".into())),
        }
    }
}
