#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use legere_core::{Signal, TrialError};
use legere_experiment::{
    EyeTracker, ExperimentConfig, GazeSample, InputSource, Presentation, RecordedSample, Screen,
    Screenshotter, SessionContext, Station,
};
use legere_layout::{MonospaceMetrics, TextMetrics};
use legere_timing::{ManualTimer, Timer};

pub const DISPLAY: (f32, f32) = (1000.0, 800.0);

/// Input that delivers each scripted signal once session time reaches its
/// timestamp. Every poll advances the shared timer by the poll timeout.
/// Once the script is used up and an hour has passed, it closes the session
/// so a broken test fails instead of hanging.
pub struct ScriptedInput {
    timer: ManualTimer,
    script: Vec<(Duration, Signal)>,
    pub polls: Rc<Cell<usize>>,
}

impl ScriptedInput {
    pub fn new(timer: &ManualTimer) -> Self {
        Self {
            timer: timer.clone(),
            script: Vec::new(),
            polls: Rc::new(Cell::new(0)),
        }
    }

    pub fn at(mut self, secs: f64, signal: Signal) -> Self {
        self.script.push((Duration::from_secs_f64(secs), signal));
        self.script.sort_by_key(|(t, _)| *t);
        self
    }
}

impl InputSource for ScriptedInput {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Signal>, TrialError> {
        self.polls.set(self.polls.get() + 1);
        self.timer.advance(timeout);
        let now = Duration::from_nanos(self.timer.now());
        match self.script.first() {
            Some((due, _)) if *due <= now => Ok(Some(self.script.remove(0).1)),
            Some(_) => Ok(None),
            None if now > Duration::from_secs(3600) => Ok(Some(Signal::Close)),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub struct SurfaceLog {
    pub screens: Vec<Screen>,
    pub hides: usize,
    pub progress: Vec<(usize, usize)>,
}

pub struct RecordingSurface {
    size: (f32, f32),
    metrics: MonospaceMetrics,
    pub log: Rc<RefCell<SurfaceLog>>,
}

impl RecordingSurface {
    pub fn new(size: (f32, f32)) -> Self {
        Self {
            size,
            metrics: MonospaceMetrics::new(10.0, 20.0),
            log: Rc::new(RefCell::new(SurfaceLog::default())),
        }
    }
}

impl Presentation for RecordingSurface {
    fn show(&mut self, screen: &Screen) -> Result<(), TrialError> {
        self.log.borrow_mut().screens.push(screen.clone());
        Ok(())
    }
    fn hide(&mut self) -> Result<(), TrialError> {
        self.log.borrow_mut().hides += 1;
        Ok(())
    }
    fn refresh(&mut self) -> Result<(), TrialError> {
        Ok(())
    }
    fn display_size(&self) -> (f32, f32) {
        self.size
    }
    fn metrics(&self) -> &dyn TextMetrics {
        &self.metrics
    }
    fn progress(&mut self, done: usize, total: usize) {
        self.log.borrow_mut().progress.push((done, total));
    }
}

#[derive(Default)]
pub struct TrackerLog {
    pub refreshes: usize,
    pub samples: usize,
    pub calibrations: usize,
    pub recording: bool,
    pub recordings: usize,
}

/// Tracker whose gaze never moves.
pub struct FixedGaze {
    gaze: GazeSample,
    pub log: Rc<RefCell<TrackerLog>>,
}

impl FixedGaze {
    pub fn new(gaze: GazeSample) -> Self {
        Self {
            gaze,
            log: Rc::new(RefCell::new(TrackerLog::default())),
        }
    }
}

impl EyeTracker for FixedGaze {
    fn refresh_state(&mut self) -> Result<(), TrialError> {
        self.log.borrow_mut().refreshes += 1;
        Ok(())
    }
    fn current_gaze(&mut self) -> Result<GazeSample, TrialError> {
        self.log.borrow_mut().samples += 1;
        Ok(self.gaze)
    }
    fn calibrate(&mut self) -> Result<String, TrialError> {
        self.log.borrow_mut().calibrations += 1;
        Ok("9 points, error 0.4 deg".into())
    }
    fn start_recording(&mut self) -> Result<(), TrialError> {
        self.log.borrow_mut().recording = true;
        Ok(())
    }
    fn stop_recording(&mut self) -> Result<Vec<RecordedSample>, TrialError> {
        let mut log = self.log.borrow_mut();
        log.recording = false;
        log.recordings += 1;
        Ok(vec![
            RecordedSample {
                time_tag: 0.002,
                gaze: self.gaze,
            },
            RecordedSample {
                time_tag: 0.004,
                gaze: self.gaze,
            },
        ])
    }
}

pub struct RecordingCamera {
    pub shots: Rc<RefCell<Vec<PathBuf>>>,
    pub fail: bool,
}

impl RecordingCamera {
    pub fn new(fail: bool) -> Self {
        Self {
            shots: Rc::new(RefCell::new(Vec::new())),
            fail,
        }
    }
}

impl Screenshotter for RecordingCamera {
    fn capture(&mut self, path: &Path) -> std::io::Result<()> {
        self.shots.borrow_mut().push(path.to_path_buf());
        if self.fail {
            Err(std::io::Error::other("no display server"))
        } else {
            Ok(())
        }
    }
}

pub fn config(data_dir: &Path) -> ExperimentConfig {
    ExperimentConfig {
        data_dir: data_dir.to_path_buf(),
        ledger_path: data_dir.join("ledger.txt"),
        ..ExperimentConfig::default()
    }
}

pub fn context(timer: &ManualTimer, data_dir: &Path) -> SessionContext {
    SessionContext::start(Box::new(timer.clone()), "20260101_120000", config(data_dir))
}

/// Station with a recording surface; handles to its logs are returned.
pub fn station(input: ScriptedInput) -> (Station, Rc<RefCell<SurfaceLog>>) {
    let surface = RecordingSurface::new(DISPLAY);
    let log = surface.log.clone();
    (Station::new(Box::new(surface), Box::new(input)), log)
}
