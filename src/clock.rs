use core::convert::TryFrom;
use embedded_time::duration::{Generic, Milliseconds};

/// Milliseconds since boot, truncated to a wrapping `u32` counter.
pub trait Uptime {
    /// `None` when the clock cannot be read.
    fn uptime_ms(&self) -> Option<u32>;
}

impl<Clock> Uptime for Clock
    where
        Clock: embedded_time::Clock,
        Milliseconds<u64>: TryFrom<Generic<Clock::T>>,
{
    fn uptime_ms(&self) -> Option<u32> {
        let now = self.try_now().ok()?;
        let elapsed = Milliseconds::<u64>::try_from(now.duration_since_epoch()).ok()?;
        Some(elapsed.0 as u32)
    }
}
