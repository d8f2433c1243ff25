use std::cell::{Cell, RefCell};
use std::rc::Rc;

use core::convert::Infallible;

use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::digital::v2::InputPin;
use embedded_time::{clock, fraction::Fraction, Instant};

use crate::activity::{BusActivity, EdgeHandler, SenseLine};
use crate::arbiter::SharedLines;
use crate::config::{ConfigStore, CredentialStorage, Credentials};
use crate::server::{FileServer, ServerOptions};
use crate::station::{LinkStatus, PhyMode, Station};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Millisecond clock that only moves when told to.
pub struct MockClock {
    now: Cell<u64>,
    running: Cell<bool>,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            now: Cell::new(0),
            running: Cell::new(true),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms as u64);
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get() + ms as u64);
    }

    /// Jump to an uptime past the 32-bit millisecond range.
    pub fn set_wide(&self, ms: u64) {
        self.now.set(ms);
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    pub fn stop(&self) {
        self.running.set(false);
    }
}

impl embedded_time::Clock for MockClock {
    type T = u64;
    const SCALING_FACTOR: Fraction = Fraction::new(1, 1_000);

    fn try_now(&self) -> Result<Instant<Self>, clock::Error> {
        if self.running.get() {
            Ok(Instant::new(self.now.get()))
        } else {
            Err(clock::Error::NotRunning)
        }
    }
}

pub struct MockDelay<'a> {
    clock: &'a MockClock,
}

impl<'a> MockDelay<'a> {
    pub fn new(clock: &'a MockClock) -> Self {
        Self { clock }
    }
}

impl DelayMs<u32> for MockDelay<'_> {
    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(ms);
    }
}

pub struct MockSense {
    armed: Rc<Cell<bool>>,
}

impl MockSense {
    pub fn new() -> Self {
        Self { armed: Rc::new(Cell::new(false)) }
    }

    pub fn armed(&self) -> Rc<Cell<bool>> {
        self.armed.clone()
    }
}

impl InputPin for MockSense {
    type Error = Infallible;

    fn is_high(&self) -> Result<bool, Self::Error> {
        Ok(true)
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

impl SenseLine for MockSense {
    fn listen_falling_edge(&mut self) {
        self.armed.set(true);
    }
}

/// Line reconfiguration, with the ownership flag seen at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEvent {
    Drive { owned: bool },
    Float { owned: bool },
}

pub struct MockLines<'a> {
    activity: &'a BusActivity,
    events: Rc<RefCell<Vec<LineEvent>>>,
}

impl<'a> MockLines<'a> {
    pub fn new(activity: &'a BusActivity) -> Self {
        Self {
            activity,
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn events(&self) -> Rc<RefCell<Vec<LineEvent>>> {
        self.events.clone()
    }
}

impl SharedLines for MockLines<'_> {
    fn drive(&mut self) {
        let owned = self.activity.is_owned_locally();
        self.events.borrow_mut().push(LineEvent::Drive { owned });
    }

    fn float(&mut self) {
        let owned = self.activity.is_owned_locally();
        self.events.borrow_mut().push(LineEvent::Float { owned });
    }
}

#[derive(Default)]
pub struct MockServer<'a> {
    pub waiting: bool,
    pub waiting_queries: usize,
    pub handled: usize,
    pub inits: usize,
    pub rejections: Vec<String>,
    pub fail_init: bool,
    pub fail_handling: bool,
    pub owned_while_init: Vec<bool>,
    pub owned_while_handling: Vec<bool>,
    pub edge_on_handle: Option<EdgeHandler<'a, MockClock>>,
    activity: Option<&'a BusActivity>,
}

impl<'a> MockServer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the ownership flag whenever the card would be touched.
    pub fn watching(activity: &'a BusActivity) -> Self {
        Self {
            activity: Some(activity),
            ..Self::default()
        }
    }

    fn owned(&self) -> bool {
        self.activity.map(|a| a.is_owned_locally()).unwrap_or(false)
    }
}

impl FileServer for MockServer<'_> {
    type Error = MockError;

    fn init(&mut self, _options: &ServerOptions) -> Result<(), Self::Error> {
        self.inits += 1;
        let owned = self.owned();
        self.owned_while_init.push(owned);
        if self.fail_init {
            Err(MockError)
        } else {
            Ok(())
        }
    }

    fn is_client_waiting(&mut self) -> bool {
        self.waiting_queries += 1;
        self.waiting
    }

    fn handle_client(&mut self) -> Result<(), Self::Error> {
        self.handled += 1;
        if let Some(handler) = self.edge_on_handle {
            handler.on_edge();
        }
        let owned = self.owned();
        self.owned_while_handling.push(owned);
        if self.fail_handling {
            Err(MockError)
        } else {
            Ok(())
        }
    }

    fn reject_client(&mut self, reason: &str) {
        self.rejections.push(reason.to_string());
    }
}

/// Replays a scripted status sequence, repeating the last entry.
pub struct MockStation {
    script: Vec<LinkStatus>,
    polls: usize,
    pub hostname: Option<String>,
    pub auto_connect: Option<bool>,
    pub station_mode: bool,
    pub phy_mode: Option<PhyMode>,
    pub joined: Option<(String, String)>,
}

impl MockStation {
    pub fn new(script: &[LinkStatus]) -> Self {
        Self {
            script: script.to_vec(),
            polls: 0,
            hostname: None,
            auto_connect: None,
            station_mode: false,
            phy_mode: None,
            joined: None,
        }
    }
}

impl Station for MockStation {
    type Address = &'static str;

    fn set_hostname(&mut self, hostname: &str) {
        self.hostname = Some(hostname.to_string());
    }

    fn set_auto_connect(&mut self, enabled: bool) {
        self.auto_connect = Some(enabled);
    }

    fn set_station_mode(&mut self) {
        self.station_mode = true;
    }

    fn set_phy_mode(&mut self, mode: PhyMode) {
        self.phy_mode = Some(mode);
    }

    fn begin(&mut self, ssid: &str, password: &str) {
        self.joined = Some((ssid.to_string(), password.to_string()));
    }

    fn status(&mut self) -> LinkStatus {
        let index = self.polls.min(self.script.len().saturating_sub(1));
        self.polls += 1;
        self.script.get(index).copied().unwrap_or(LinkStatus::Pending)
    }

    fn local_address(&self) -> Self::Address {
        "192.168.1.42"
    }

    fn signal_strength(&self) -> i8 {
        -61
    }
}

pub struct MockConfig {
    ssid: String,
    password: String,
    pub saves: usize,
    pub fail_save: bool,
}

impl MockConfig {
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: ssid.to_string(),
            password: password.to_string(),
            saves: 0,
            fail_save: false,
        }
    }
}

impl ConfigStore for MockConfig {
    type Error = MockError;

    fn ssid(&self) -> &str {
        &self.ssid
    }

    fn password(&self) -> &str {
        &self.password
    }

    fn save(&mut self) -> Result<(), Self::Error> {
        self.saves += 1;
        if self.fail_save {
            Err(MockError)
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
pub struct MockStorage {
    pub stored: Vec<Credentials>,
    pub fail: bool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStorage for MockStorage {
    type Error = MockError;

    fn store(&mut self, credentials: &Credentials) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockError);
        }
        self.stored.push(credentials.clone());
        Ok(())
    }
}
