//! `legere`: runs self-paced reading sessions in the terminal.
//!
//! ## Commands
//!
//! - `run`: allocate the next list, run a session, commit the list on success
//! - `allocate`: show which list the next session would get
//! - `check`: validate a stimulus design

mod terminal;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legere_core::{load_stimuli, StimulusItem};
use legere_experiment::{
    build_lists, build_session, validate, ExperimentConfig, PlanOptions, Presentation,
    SessionOutcome, SessionRunner, StimulusAllocator, Station, UsageLedger,
};
use legere_layout::{GlyphMetrics, MonospaceMetrics, TextMetrics};
use legere_timing::HighPrecisionTimer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use terminal::{
    CommandScreenshotter, EntryField, Pointer, PointerGaze, TerminalGuard, TerminalInput, TerminalSurface, CELL,
};

#[derive(Parser)]
#[command(name = "legere")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Self-paced reading experiments with Latin-square list allocation", long_about = None)]
struct Cli {
    /// JSON config file; LEGERE_DATA_DIR and LEGERE_LEDGER override it
    #[arg(short, long, global = true, env = "LEGERE_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one session
    Run {
        /// Experimental design (TSV: item, condition, sentence, question)
        design: PathBuf,

        /// Filler sentences, shown to every participant
        #[arg(long)]
        fillers: Option<PathBuf>,

        /// Practice sentences, shown first
        #[arg(long)]
        practice: Option<PathBuf>,

        /// Text file with a consent form
        #[arg(long)]
        consent: Option<PathBuf>,

        /// Gaze-contingent reading, with the mouse pointer as gaze
        #[arg(long)]
        gaze: bool,

        /// Ask comprehension questions instead of yes/no questions
        #[arg(long)]
        comprehension: bool,

        /// Screenshot command; the target path is appended, e.g. "scrot -o"
        #[arg(long)]
        screenshot: Option<String>,

        /// Seed for item order and question sampling
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show the list the next session would get, without recording it
    Allocate {
        design: PathBuf,
    },

    /// Validate a design and print its lists
    Check {
        design: PathBuf,
    },
}

struct RunArgs {
    design: PathBuf,
    fillers: Option<PathBuf>,
    practice: Option<PathBuf>,
    consent: Option<PathBuf>,
    gaze: bool,
    comprehension: bool,
    screenshot: Option<String>,
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match dispatch(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn dispatch(cli: Cli) -> Result<u8> {
    let config = ExperimentConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Run {
            design,
            fillers,
            practice,
            consent,
            gaze,
            comprehension,
            screenshot,
            seed,
        } => run(
            config,
            cli.verbose,
            RunArgs {
                design,
                fillers,
                practice,
                consent,
                gaze,
                comprehension,
                screenshot,
                seed,
            },
        ),
        Commands::Allocate { design } => {
            init_tracing(cli.verbose, None)?;
            let design = load_stimuli(&design)?;
            let allocator = StimulusAllocator::new(UsageLedger::new(&config.ledger_path));
            let (label, list) = allocator.next_list(&design)?;
            println!("Next list: {label}");
            print_list(&list);
            Ok(0)
        }
        Commands::Check { design } => {
            init_tracing(cli.verbose, None)?;
            let path = design;
            let design = load_stimuli(&path)?;
            let (items, conditions) = validate(&design)?;
            println!(
                "{}: {} items x {} conditions ({})",
                path.display(),
                items.len(),
                conditions.len(),
                conditions.join(", ")
            );
            for (label, list) in build_lists(&design)? {
                println!("List {label}:");
                print_list(&list);
            }
            Ok(0)
        }
    }
}

fn print_list(list: &[StimulusItem]) {
    for item in list {
        println!("  {:>3} {:<8} {}", item.item_id, item.condition, item.text);
    }
}

/// Trace output goes to `log_file` when given, since the session owns the
/// terminal; otherwise to stderr.
fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Cannot create trace log {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_optional(path: Option<&Path>) -> Result<Vec<StimulusItem>> {
    match path {
        Some(path) => Ok(load_stimuli(path)?),
        None => Ok(Vec::new()),
    }
}

fn metrics(config: &ExperimentConfig) -> Result<Box<dyn TextMetrics>> {
    match &config.font_path {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Cannot read font {}", path.display()))?;
            let font = GlyphMetrics::from_bytes(bytes, config.font_size)
                .with_context(|| format!("Invalid font {}", path.display()))?;
            Ok(Box::new(font))
        }
        None => Ok(Box::new(MonospaceMetrics::new(CELL.0, CELL.1))),
    }
}

fn run(config: ExperimentConfig, verbose: bool, args: RunArgs) -> Result<u8> {
    let session_id = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Cannot create data directory {}", config.data_dir.display()))?;
    init_tracing(
        verbose,
        Some(&config.data_dir.join(format!("{session_id}_trace.log"))),
    )?;

    let design = load_stimuli(&args.design)?;
    let fillers = load_optional(args.fillers.as_deref())?;
    let practice = load_optional(args.practice.as_deref())?;
    let allocator = StimulusAllocator::new(UsageLedger::new(&config.ledger_path));
    let (label, list) = allocator.next_list(&design)?;

    let mut options = PlanOptions::from_config(&config);
    options.gaze = args.gaze;
    options.comprehension = args.comprehension;
    if let Some(path) = &args.consent {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read consent form {}", path.display()))?;
        options.consent = Some(text);
    }
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut trials = build_session(&list, &fillers, &practice, &options, &mut rng);
    info!(session = %session_id, list = %label, trials = trials.len(), "session planned");

    let metrics = metrics(&config)?;
    let guard = TerminalGuard::enter().context("Cannot take over the terminal")?;
    let pointer = Rc::new(Pointer::default());
    let entry = Rc::new(EntryField::default());
    let surface = TerminalSurface::new(metrics, entry.clone())?;
    let display = surface.display_size();
    let mut station = Station::new(
        Box::new(surface),
        Box::new(TerminalInput::new(pointer.clone(), entry)),
    );
    if args.gaze {
        station = station.with_tracker(Box::new(PointerGaze::new(pointer, display)));
    }
    if let Some(camera) = args.screenshot.as_deref().and_then(CommandScreenshotter::parse) {
        station = station.with_camera(Box::new(camera));
    }

    let runner = SessionRunner::new(config, station, Box::new(HighPrecisionTimer::new()), session_id)
        .with_allocation(allocator, label);
    let result = runner.run(&mut trials);
    drop(guard);

    match result {
        Ok(outcome) => {
            match &outcome {
                SessionOutcome::Completed { log_path, committed } => {
                    println!("Experiment finished. Session log: {}", log_path.display());
                    if let Some(label) = committed {
                        println!("Latin square list {label} recorded as used.");
                    }
                }
                SessionOutcome::Aborted { log_path } => {
                    println!("Experiment aborted. Partial log: {}", log_path.display());
                }
            }
            Ok(outcome.exit_code())
        }
        Err(e) => {
            eprintln!("An error occurred: {e}");
            if let Some(path) = e.partial_log() {
                eprintln!("Partial log: {}", path.display());
            }
            Ok(2)
        }
    }
}
