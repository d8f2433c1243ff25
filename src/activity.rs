//! Detection of the other bus master through its chip-select line.
//!
//! The foreign controller never announces itself. Every falling edge on the
//! shared chip-select line that we did not cause ourselves pushes the
//! exclusion deadline out to `now + blockout`; until then the local side
//! keeps its hands off the bus.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;
use embedded_time::duration::Milliseconds;

use crate::clock::Uptime;

pub const DEFAULT_BLOCKOUT: Milliseconds<u32> = Milliseconds(20_000u32);

/// State shared between the edge interrupt and the foreground loop.
///
/// Meant to live in a `static` for the whole life of the firmware. The
/// interrupt only ever writes `deadline`; only the [`Arbiter`] writes
/// `local`.
///
/// [`Arbiter`]: crate::arbiter::Arbiter
pub struct BusActivity {
    deadline: AtomicU32,
    local: AtomicBool,
    blockout: u32,
}

impl BusActivity {
    pub const fn new(blockout: Milliseconds<u32>) -> Self {
        Self {
            deadline: AtomicU32::new(0),
            local: AtomicBool::new(false),
            blockout: blockout.0,
        }
    }

    pub fn blockout(&self) -> Milliseconds<u32> {
        Milliseconds(self.blockout)
    }

    /// Uptime (ms, wrapping) before which the bus must be left alone.
    pub fn deadline(&self) -> u32 {
        self.deadline.load(Ordering::Acquire)
    }

    /// Time left in the exclusion window.
    ///
    /// Uptime wraps every 2^32 ms, so the window is "deadline no more than
    /// one blockout ahead of now". A deadline that went stale across a wrap
    /// can read as active for at most one blockout.
    pub fn remaining(&self, now: u32) -> Milliseconds<u32> {
        let ahead = self.deadline().wrapping_sub(now);
        if ahead <= self.blockout {
            Milliseconds(ahead)
        } else {
            Milliseconds(0)
        }
    }

    pub fn is_contended(&self, now: u32) -> bool {
        self.remaining(now).0 > 0
    }

    /// True while the local side drives the shared lines.
    pub fn is_owned_locally(&self) -> bool {
        self.local.load(Ordering::Acquire)
    }

    pub(crate) fn claim(&self) {
        self.local.store(true, Ordering::Release);
    }

    pub(crate) fn relinquish(&self) {
        self.local.store(false, Ordering::Release);
    }

    fn record_edge(&self, now: u32) {
        if !self.local.load(Ordering::Acquire) {
            self.deadline
                .store(now.wrapping_add(self.blockout), Ordering::Release);
        }
    }
}

impl Default for BusActivity {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKOUT)
    }
}

/// Input wired to the shared chip-select line.
pub trait SenseLine: InputPin {
    /// Arm the pin's falling-edge interrupt.
    fn listen_falling_edge(&mut self);
}

/// The only thing the platform interrupt is allowed to call.
///
/// Reads the clock and stores one word. Never blocks, never logs.
pub struct EdgeHandler<'a, Clock> {
    activity: &'a BusActivity,
    clock: &'a Clock,
}

impl<Clock> Clone for EdgeHandler<'_, Clock> {
    fn clone(&self) -> Self {
        Self {
            activity: self.activity,
            clock: self.clock,
        }
    }
}

impl<Clock> Copy for EdgeHandler<'_, Clock> {}

impl<'a, Clock> EdgeHandler<'a, Clock>
    where Clock: Uptime
{
    #[inline]
    pub fn on_edge(&self) {
        // an unreadable clock leaves the current window as is
        if let Some(now) = self.clock.uptime_ms() {
            self.activity.record_edge(now);
        }
    }
}

pub struct Monitor<'a, Pin, Clock>
    where Pin: SenseLine,
          Clock: Uptime,
{
    pin: Pin,
    activity: &'a BusActivity,
    clock: &'a Clock,
}

impl<'a, Pin, Clock> Monitor<'a, Pin, Clock>
    where Pin: SenseLine,
          Clock: Uptime,
{
    pub fn new(pin: Pin, activity: &'a BusActivity, clock: &'a Clock) -> Self {
        Self {
            pin,
            activity,
            clock,
        }
    }

    /// Arm edge detection, then give the other master one blockout period
    /// to claim the bus before anything local touches it.
    ///
    /// The returned handler must be invoked from the sense pin's interrupt.
    pub fn setup<D>(&mut self, delay: &mut D) -> EdgeHandler<'a, Clock>
        where D: DelayMs<u32>
    {
        self.pin.listen_falling_edge();
        if self.is_asserted() {
            log::info!("chip-select already asserted by the other master");
        }
        log::info!("holding off the bus for {} ms", self.activity.blockout);
        delay.delay_ms(self.activity.blockout);
        self.handler()
    }

    pub fn handler(&self) -> EdgeHandler<'a, Clock> {
        EdgeHandler {
            activity: self.activity,
            clock: self.clock,
        }
    }

    /// Current level of the sense line; chip-select is active low.
    pub fn is_asserted(&self) -> bool {
        self.pin.is_low().unwrap_or(false)
    }
}
