//! Serve an SD card over WiFi while another, unaware controller shares the
//! card's SPI bus.
//!
//! The other master is only ever observed through falling edges on the
//! shared chip-select line. Each one opens an exclusion window during which
//! waiting clients are turned away; outside of it a single request cycle is
//! run with the bus lines taken over for its duration.
//!
//! Typical wiring:
//!
//! ```ignore
//! static ACTIVITY: BusActivity = BusActivity::new(DEFAULT_BLOCKOUT);
//!
//! let mut monitor = Monitor::new(cs_sense, &ACTIVITY, &CLOCK);
//! let on_edge = monitor.setup(&mut delay);   // call on_edge.on_edge() from the pin ISR
//!
//! let mut network = Network::new(wifi, dav, config, lines, &ACTIVITY, &CLOCK, Settings::default());
//! network.start(&mut delay).ok();
//! loop {
//!     network.handle().ok();
//! }
//! ```

#![cfg_attr(not(test), no_std)]

pub mod activity;
pub mod arbiter;
pub mod clock;
pub mod config;
pub mod gate;
pub mod network;
mod parser;
pub mod server;
pub mod station;

#[cfg(test)]
mod mock;

pub use activity::{BusActivity, EdgeHandler, Monitor, SenseLine, DEFAULT_BLOCKOUT};
pub use arbiter::{Arbiter, Owned, SharedLines};
pub use clock::Uptime;
pub use config::{ConfigError, ConfigStore, CredentialStorage, Credentials, Persisted, Settings};
pub use gate::{Decision, Gate, Rejection};
pub use network::{Network, StartError};
pub use server::{CardInit, FileServer, ServerOptions, SpiSpeed};
pub use station::{JoinError, LinkState, LinkStatus, PhyMode, Station};
