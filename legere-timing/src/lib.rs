pub mod clock;
pub mod timer;

pub use clock::{Clock, SessionClock};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
