//! Terminal front-end: draws screens with crossterm, turns key and mouse
//! events into signals, and lets the mouse pointer stand in for gaze.

use std::cell::{Cell, RefCell};
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::process::Command;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use legere_core::{Signal, TrialError};
use legere_experiment::event_loop::to_tracker;
use legere_experiment::{
    EyeTracker, GazeSample, InputSource, Presentation, RecordedSample, Screen, Screenshotter,
};
use legere_layout::TextMetrics;
use tracing::debug;

/// Display units per terminal cell.
pub const CELL: (f32, f32) = (12.0, 24.0);

fn term_err(e: io::Error) -> TrialError {
    TrialError::Presentation(e.to_string())
}

/// Raw mode plus alternate screen for as long as the guard lives.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            Hide,
            Clear(ClearType::All)
        )?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        execute!(io::stdout(), Show, DisableMouseCapture, LeaveAlternateScreen).ok();
        terminal::disable_raw_mode().ok();
    }
}

/// Last mouse cell, written by the input and read by the gaze stand-in.
#[derive(Debug, Default)]
pub struct Pointer {
    cell: Cell<(u16, u16)>,
}

impl Pointer {
    /// Center of the pointer's cell in display units.
    pub fn position(&self) -> (f32, f32) {
        let (col, row) = self.cell.get();
        (
            (col as f32 + 0.5) * CELL.0,
            (row as f32 + 0.5) * CELL.1,
        )
    }
}

/// Text typed on an entry screen. The surface opens the field when it
/// shows an `Entry` screen and closes it on any other screen.
#[derive(Debug, Default)]
pub struct EntryField {
    open: Cell<bool>,
    text: RefCell<String>,
}

impl EntryField {
    fn set_open(&self, open: bool) {
        self.open.set(open);
        self.text.borrow_mut().clear();
    }

    fn is_open(&self) -> bool {
        self.open.get()
    }
}

pub struct TerminalSurface {
    out: Stdout,
    entry: Rc<EntryField>,
    cols: u16,
    rows: u16,
    metrics: Box<dyn TextMetrics>,
    current: Screen,
    done: (usize, usize),
}

impl TerminalSurface {
    pub fn new(metrics: Box<dyn TextMetrics>, entry: Rc<EntryField>) -> io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out: io::stdout(),
            entry,
            cols,
            rows,
            metrics,
            current: Screen::Blank,
            done: (0, 0),
        })
    }

    /// Rows usable for screens; the last one holds the progress bar.
    fn body_rows(&self) -> u16 {
        self.rows.saturating_sub(1)
    }

    fn cell_of(&self, pos: (f32, f32)) -> (u16, u16) {
        let col = (pos.0 / CELL.0).max(0.0) as u16;
        let row = (pos.1 / CELL.1).max(0.0) as u16;
        (
            col.min(self.cols.saturating_sub(1)),
            row.min(self.body_rows().saturating_sub(1)),
        )
    }

    fn centered(&mut self, row: u16, text: &str) -> io::Result<()> {
        let width = text.chars().count() as u16;
        let col = self.cols.saturating_sub(width) / 2;
        queue!(self.out, MoveTo(col, row), Print(text))
    }

    fn draw(&mut self) -> io::Result<()> {
        queue!(self.out, MoveTo(0, 0), Clear(ClearType::FromCursorDown))?;
        let middle = self.body_rows() / 2;
        let bottom = self.body_rows().saturating_sub(2);

        match self.current.clone() {
            Screen::Blank => {}
            Screen::Text { lines, prompt } => {
                let top = middle.saturating_sub(lines.len() as u16 / 2);
                for (i, line) in lines.iter().enumerate() {
                    self.centered(top + i as u16, line)?;
                }
                self.centered(bottom, &prompt)?;
            }
            Screen::Fixation { visible } => {
                if visible {
                    let (col, row) = self.cell_of((CELL.0, (self.display_size().1 - CELL.1) / 2.0));
                    queue!(self.out, MoveTo(col, row), Print("+"))?;
                }
            }
            Screen::Reading { words, trigger } => {
                for (word, b) in &words {
                    let (col, row) = self.cell_of((b.x0, b.y0));
                    queue!(self.out, MoveTo(col, row), Print(word))?;
                }
                if let Some(point) = trigger {
                    let (col, row) = self.cell_of(point);
                    queue!(self.out, MoveTo(col, row), Print("x"))?;
                }
            }
            Screen::Question { text, hint } => {
                self.centered(middle, &text)?;
                self.centered(bottom, &hint)?;
            }
            Screen::Choice {
                statement,
                question,
                options,
                hint,
            } => {
                self.centered(middle.saturating_sub(3), &statement)?;
                self.centered(middle, &question)?;
                let quarter = self.cols / 4;
                queue!(
                    self.out,
                    MoveTo(quarter, middle + 3),
                    Print(&options[0]),
                    MoveTo(self.cols - quarter, middle + 3),
                    Print(&options[1])
                )?;
                self.centered(bottom, &hint)?;
            }
            Screen::Entry { prompt } => {
                self.centered(middle.saturating_sub(1), &prompt)?;
            }
            Screen::Calibration { message } => {
                queue!(self.out, SetAttribute(Attribute::Bold))?;
                self.centered(middle, &message)?;
                queue!(self.out, SetAttribute(Attribute::Reset))?;
            }
        }
        self.draw_progress()
    }

    fn draw_progress(&mut self) -> io::Result<()> {
        let (done, total) = self.done;
        let width = self.cols as usize;
        let filled = (done * width).checked_div(total).unwrap_or(0).min(width);
        let bar = format!("{}{}", "█".repeat(filled), " ".repeat(width - filled));
        queue!(self.out, MoveTo(0, self.rows.saturating_sub(1)), Print(bar))
    }
}

impl Presentation for TerminalSurface {
    fn show(&mut self, screen: &Screen) -> Result<(), TrialError> {
        self.entry.set_open(matches!(screen, Screen::Entry { .. }));
        self.current = screen.clone();
        self.draw().map_err(term_err)
    }

    fn hide(&mut self) -> Result<(), TrialError> {
        self.entry.set_open(false);
        self.current = Screen::Blank;
        self.draw().map_err(term_err)
    }

    fn refresh(&mut self) -> Result<(), TrialError> {
        self.out.flush().map_err(term_err)
    }

    fn display_size(&self) -> (f32, f32) {
        (
            self.cols as f32 * CELL.0,
            self.body_rows() as f32 * CELL.1,
        )
    }

    fn metrics(&self) -> &dyn TextMetrics {
        self.metrics.as_ref()
    }

    fn progress(&mut self, done: usize, total: usize) {
        self.done = (done, total);
        if let Err(e) = self.draw_progress().and_then(|_| self.out.flush()) {
            debug!("progress bar not drawn: {e}");
        }
    }
}

/// Keyboard and mouse input. While the entry field is open, typed
/// characters, spaces included, go into it and Enter submits it.
pub struct TerminalInput {
    pointer: Rc<Pointer>,
    entry: Rc<EntryField>,
}

impl TerminalInput {
    pub fn new(pointer: Rc<Pointer>, entry: Rc<EntryField>) -> Self {
        Self { pointer, entry }
    }

    fn key(&self, key: KeyEvent) -> Option<Signal> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Signal::Close),
            KeyCode::Esc => Some(Signal::Cancel),
            _ if self.entry.is_open() => self.type_into_entry(key.code),
            KeyCode::Char(' ') => Some(Signal::Confirm),
            KeyCode::Char(c) => Some(Signal::Key(c)),
            _ => None,
        }
    }

    fn type_into_entry(&self, code: KeyCode) -> Option<Signal> {
        let mut text = self.entry.text.borrow_mut();
        match code {
            KeyCode::Enter => return Some(Signal::Submit(std::mem::take(&mut *text))),
            KeyCode::Backspace => {
                text.pop();
            }
            KeyCode::Char(c) => text.push(c),
            _ => return None,
        }
        echo(&text);
        None
    }
}

/// Redraws the typed text one row below the entry prompt.
fn echo(text: &str) {
    let (cols, rows) = terminal::size().unwrap_or((80, 24));
    let row = rows.saturating_sub(1) / 2 + 1;
    let line = format!("> {text}");
    let col = cols.saturating_sub(line.chars().count() as u16) / 2;
    execute!(
        io::stdout(),
        MoveTo(0, row),
        Clear(ClearType::CurrentLine),
        MoveTo(col, row),
        Print(line)
    )
    .ok();
}

impl InputSource for TerminalInput {
    fn poll(&mut self, timeout: Duration) -> Result<Option<Signal>, TrialError> {
        if !event::poll(timeout).map_err(term_err)? {
            return Ok(None);
        }
        match event::read().map_err(term_err)? {
            Event::Key(key) => Ok(self.key(key)),
            Event::Mouse(mouse) => {
                if matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                    self.pointer.cell.set((mouse.column, mouse.row));
                }
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

/// Eye-tracker stand-in that reports the mouse pointer as both eyes' gaze.
pub struct PointerGaze {
    pointer: Rc<Pointer>,
    display: (f32, f32),
    recording: Option<(Instant, Vec<RecordedSample>)>,
}

impl PointerGaze {
    pub fn new(pointer: Rc<Pointer>, display: (f32, f32)) -> Self {
        Self {
            pointer,
            display,
            recording: None,
        }
    }
}

impl EyeTracker for PointerGaze {
    fn refresh_state(&mut self) -> Result<(), TrialError> {
        Ok(())
    }

    fn current_gaze(&mut self) -> Result<GazeSample, TrialError> {
        let (x, y) = to_tracker(self.pointer.position(), self.display);
        let gaze = GazeSample::new(x, y, x, y);
        if let Some((started, samples)) = self.recording.as_mut() {
            samples.push(RecordedSample {
                time_tag: started.elapsed().as_secs_f64(),
                gaze,
            });
        }
        Ok(gaze)
    }

    fn calibrate(&mut self) -> Result<String, TrialError> {
        Ok("pointer-driven gaze, no calibration needed".into())
    }

    fn start_recording(&mut self) -> Result<(), TrialError> {
        self.recording = Some((Instant::now(), Vec::new()));
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<Vec<RecordedSample>, TrialError> {
        match self.recording.take() {
            Some((_, samples)) => Ok(samples),
            None => Err(TrialError::Tracker("recording was never started".into())),
        }
    }
}

/// Runs an external program with the target path as its last argument.
pub struct CommandScreenshotter {
    program: String,
    args: Vec<String>,
}

impl CommandScreenshotter {
    /// Splits `command` on whitespace, e.g. `"scrot -o"`.
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl Screenshotter for CommandScreenshotter {
    fn capture(&mut self, path: &Path) -> io::Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!("{} exited with {status}", self.program)))
        }
    }
}
