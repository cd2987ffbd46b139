pub mod allocator;
pub mod config;
pub mod context;
pub mod event_loop;
pub mod log;
pub mod plan;
pub mod session;
pub mod station;
pub mod trial;
pub mod trials;

pub use allocator::{build_lists, validate, AllocationError, CounterbalancedLists, StimulusAllocator, UsageLedger};
pub use config::{ExperimentConfig, GazeTriggerConfig, TriggerAnchor};
pub use context::SessionContext;
pub use event_loop::{GazeOutcome, GazeTrigger};
pub use plan::{build_session, PlanOptions};
pub use session::{SessionError, SessionOutcome, SessionRunner};
pub use station::{EyeTracker, GazeSample, InputSource, Presentation, RecordedSample, Screen, Screenshotter, Station};
pub use trial::{Trial, TrialCore};
