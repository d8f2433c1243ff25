use crate::activity::BusActivity;

/// The SPI data/clock lines plus the card's select line.
pub trait SharedLines {
    /// Hand MISO/MOSI/SCLK to the SPI peripheral and drive card-select as an
    /// output.
    fn drive(&mut self);

    /// Put every shared line back into high-impedance input mode.
    fn float(&mut self);
}

/// Electrical ownership of the shared SPI lines.
///
/// Does not wait for the other master; callers check the exclusion window
/// first.
pub struct Arbiter<'a, Lines>
    where Lines: SharedLines
{
    lines: Lines,
    activity: &'a BusActivity,
}

impl<'a, Lines> Arbiter<'a, Lines>
    where Lines: SharedLines
{
    /// Construct the arbiter and leave the lines floating (unowned).
    pub fn new(mut lines: Lines, activity: &'a BusActivity) -> Self {
        lines.float();
        activity.relinquish();
        Self {
            lines,
            activity,
        }
    }

    /// Take the bus until the returned guard is dropped.
    pub fn acquire<'bus>(&'bus mut self) -> Owned<'bus, 'a, Lines> {
        Owned::new(self)
    }

    pub fn is_owned(&self) -> bool {
        self.activity.is_owned_locally()
    }
}

pub struct Owned<'bus, 'a, Lines>
    where Lines: SharedLines
{
    arbiter: &'bus mut Arbiter<'a, Lines>,
}

impl<'bus, 'a, Lines> Owned<'bus, 'a, Lines>
    where Lines: SharedLines
{
    fn new(arbiter: &'bus mut Arbiter<'a, Lines>) -> Self {
        // flag first, so our own select line toggling is never read as the
        // other master
        arbiter.activity.claim();
        arbiter.lines.drive();
        Self {
            arbiter
        }
    }
}

impl<Lines> Drop for Owned<'_, '_, Lines>
    where Lines: SharedLines
{
    fn drop(&mut self) {
        self.arbiter.lines.float();
        self.arbiter.activity.relinquish();
    }
}
