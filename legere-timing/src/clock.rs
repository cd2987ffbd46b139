use std::time::Duration;

use crate::timer::Timer;

/// Object-safe view of a nanosecond `Timer`, so trials can be boxed.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
    fn pause(&self, d: Duration);
}

impl<T> Clock for T
where
    T: Timer<Timestamp = u64>,
{
    fn now_ns(&self) -> u64 {
        self.now()
    }
    fn pause(&self, d: Duration) {
        self.sleep(d)
    }
}

/// Session-relative clock: elapsed seconds since the session started.
pub struct SessionClock {
    clock: Box<dyn Clock>,
    origin_ns: u64,
}

impl SessionClock {
    /// Starts counting from the clock's current reading.
    pub fn start(clock: Box<dyn Clock>) -> Self {
        let origin_ns = clock.now_ns();
        Self { clock, origin_ns }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.clock.now_ns().saturating_sub(self.origin_ns))
    }

    /// Elapsed seconds rounded to the millisecond.
    pub fn elapsed_secs(&self) -> f64 {
        round_ms(self.elapsed().as_secs_f64())
    }

    pub fn sleep(&self, d: Duration) {
        self.clock.pause(d)
    }
}

impl std::fmt::Debug for SessionClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClock")
            .field("origin_ns", &self.origin_ns)
            .finish()
    }
}

pub fn round_ms(secs: f64) -> f64 {
    (secs * 1000.0).round() / 1000.0
}
