use embedded_time::duration::Milliseconds;

use crate::activity::BusActivity;
use crate::arbiter::{Arbiter, SharedLines};
use crate::clock::Uptime;
use crate::server::{CardInit, FileServer};
use crate::station::LinkState;

/// Why a waiting client was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InitFailed,
    BusBusy,
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::InitFailed => "Failed to initialize SD card",
            Rejection::BusBusy => "Other bus master is using the SD card",
        }
    }
}

/// Outcome of one admission poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No network link yet.
    Offline,
    /// Nobody is waiting.
    Idle,
    Rejected(Rejection),
    /// One request cycle may run.
    Admitted,
}

pub struct Gate<'a, Clock>
    where Clock: Uptime
{
    activity: &'a BusActivity,
    clock: &'a Clock,
}

impl<'a, Clock> Gate<'a, Clock>
    where Clock: Uptime
{
    pub fn new(activity: &'a BusActivity, clock: &'a Clock) -> Self {
        Self {
            activity,
            clock,
        }
    }

    /// True while the other master may be on the bus. An unreadable clock
    /// counts as busy.
    pub fn is_contended(&self) -> bool {
        self.remaining().map(|left| left.0 > 0).unwrap_or(true)
    }

    /// Time left in the exclusion window, `None` if the clock is unreadable.
    pub fn remaining(&self) -> Option<Milliseconds<u32>> {
        self.clock.uptime_ms().map(|now| self.activity.remaining(now))
    }

    /// Decide without side effects on the bus. Only asks the server whether
    /// a client waits once the link is up.
    pub fn check<S>(&self, link: LinkState, card: CardInit, server: &mut S) -> Decision
        where S: FileServer
    {
        if link != LinkState::Connected {
            return Decision::Offline;
        }
        if !server.is_client_waiting() {
            return Decision::Idle;
        }
        if card == CardInit::Failed {
            return Decision::Rejected(Rejection::InitFailed);
        }
        if self.is_contended() {
            return Decision::Rejected(Rejection::BusBusy);
        }
        Decision::Admitted
    }

    /// Run the decision: reject the client, or fence exactly one request
    /// cycle with bus ownership.
    pub fn poll<S, Lines>(
        &self,
        link: LinkState,
        card: CardInit,
        server: &mut S,
        arbiter: &mut Arbiter<'_, Lines>,
    ) -> Result<Decision, S::Error>
        where
            S: FileServer,
            Lines: SharedLines,
    {
        let decision = self.check(link, card, server);
        match decision {
            Decision::Rejected(rejection) => {
                log::debug!("rejecting client: {}", rejection.reason());
                if let (Rejection::BusBusy, Some(left)) = (rejection, self.remaining()) {
                    log::debug!("bus busy for another {} ms", left.0);
                }
                server.reject_client(rejection.reason());
            }
            Decision::Admitted => {
                let _owned = arbiter.acquire();
                server.handle_client()?;
            }
            Decision::Offline | Decision::Idle => {}
        }
        Ok(decision)
    }
}
