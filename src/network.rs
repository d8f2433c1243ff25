use embedded_hal::blocking::delay::DelayMs;

use crate::activity::BusActivity;
use crate::arbiter::{Arbiter, SharedLines};
use crate::clock::Uptime;
use crate::config::{ConfigStore, Settings};
use crate::gate::{Decision, Gate};
use crate::server::{CardInit, FileServer};
use crate::station::{self, JoinError, LinkState, Station};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartError {
    Join(JoinError),
    /// Associated, but the card could not be brought up. Waiting clients
    /// will be rejected.
    CardInit,
}

impl From<JoinError> for StartError {
    fn from(e: JoinError) -> Self {
        StartError::Join(e)
    }
}

/// The file server front end sharing the card bus with a foreign master.
pub struct Network<'a, Wifi, Server, Config, Lines, Clock>
    where
        Wifi: Station,
        Server: FileServer,
        Config: ConfigStore,
        Lines: SharedLines,
        Clock: Uptime,
{
    station: Wifi,
    server: Server,
    config: Config,
    arbiter: Arbiter<'a, Lines>,
    gate: Gate<'a, Clock>,
    settings: Settings<'a>,
    link: LinkState,
    card: Option<CardInit>,
}

impl<'a, Wifi, Server, Config, Lines, Clock> Network<'a, Wifi, Server, Config, Lines, Clock>
    where
        Wifi: Station,
        Server: FileServer,
        Config: ConfigStore,
        Lines: SharedLines,
        Clock: Uptime,
{
    pub fn new(
        station: Wifi,
        server: Server,
        config: Config,
        lines: Lines,
        activity: &'a BusActivity,
        clock: &'a Clock,
        settings: Settings<'a>,
    ) -> Self {
        Self {
            station,
            server,
            config,
            arbiter: Arbiter::new(lines, activity),
            gate: Gate::new(activity, clock),
            settings,
            link: LinkState::NotConnected,
            card: None,
        }
    }

    /// Associate, persist the working configuration and bring up the card.
    ///
    /// Makes a single association attempt; retrying is up to the caller.
    pub fn start<D>(&mut self, delay: &mut D) -> Result<(), StartError>
        where D: DelayMs<u32>
    {
        self.link = LinkState::NotConnected;
        self.join(delay)?;

        log::info!("connected to {}", self.config.ssid());
        log::info!("IP address: {}", self.station.local_address());
        log::info!("RSSI: {} dBm", self.station.signal_strength());
        log::info!("mode: {:?}", self.settings.phy_mode);
        log::info!("share: \\\\{}\\DavWWWRoot", self.station.local_address());

        self.link = LinkState::Connected;

        if let Err(e) = self.config.save() {
            log::warn!("failed to save configuration: {:?}", e);
        }

        match self.start_server(delay) {
            CardInit::Ok => Ok(()),
            CardInit::Failed => Err(StartError::CardInit),
        }
    }

    fn join<D>(&mut self, delay: &mut D) -> Result<(), JoinError>
        where D: DelayMs<u32>
    {
        let ssid = self.config.ssid();
        if ssid.is_empty() || ssid.len() > 32 {
            return Err(JoinError::InvalidSsid);
        }
        if self.config.password().len() > 64 {
            return Err(JoinError::InvalidPassword);
        }

        let hostname = self.config.hostname().unwrap_or(self.settings.hostname);
        self.station.set_hostname(hostname);
        // no unattended reconnects; keeps the startup surge current down
        self.station.set_auto_connect(false);
        self.station.set_station_mode();
        self.station.set_phy_mode(self.settings.phy_mode);
        self.station.begin(self.config.ssid(), self.config.password());

        let attempts = self.settings.steps(self.settings.connect_timeout);
        let mut polls = 0;
        loop {
            match station::poll_join(&mut self.station) {
                Ok(()) => return Ok(()),
                Err(nb::Error::Other(e)) => {
                    log::warn!("association with {} failed", self.config.ssid());
                    return Err(e);
                }
                Err(nb::Error::WouldBlock) => {
                    polls += 1;
                    if polls > attempts {
                        log::warn!("timed out joining {}", self.config.ssid());
                        return Err(JoinError::Timeout);
                    }
                    delay.delay_ms(self.settings.poll_interval.0);
                }
            }
        }
    }

    fn start_server<D>(&mut self, delay: &mut D) -> CardInit
        where D: DelayMs<u32>
    {
        if let Some(card) = self.card {
            return card;
        }

        let card = if self.await_idle_bus(delay) {
            let result = {
                let _owned = self.arbiter.acquire();
                self.server.init(&self.settings.server)
            };
            match result {
                Ok(()) => {
                    log::info!("file server started on port {}", self.settings.server.port);
                    CardInit::Ok
                }
                Err(e) => {
                    log::error!("failed to initialize SD card: {:?}", e);
                    CardInit::Failed
                }
            }
        } else {
            log::error!("bus never went idle, SD card left uninitialized");
            CardInit::Failed
        };

        self.card = Some(card);
        card
    }

    fn await_idle_bus<D>(&self, delay: &mut D) -> bool
        where D: DelayMs<u32>
    {
        let steps = self.settings.steps(self.settings.init_wait);
        for _ in 0..steps {
            if !self.gate.is_contended() {
                return true;
            }
            delay.delay_ms(self.settings.poll_interval.0);
        }
        !self.gate.is_contended()
    }

    /// One admission poll; call once per main-loop iteration.
    pub fn handle(&mut self) -> Result<Decision, Server::Error> {
        let card = self.card.unwrap_or(CardInit::Failed);
        self.gate.poll(self.link, card, &mut self.server, &mut self.arbiter)
    }

    pub fn is_connected(&self) -> bool {
        self.link == LinkState::Connected
    }

    pub fn link_state(&self) -> LinkState {
        self.link
    }

    /// `None` until the first successful association.
    pub fn card_state(&self) -> Option<CardInit> {
        self.card
    }

    pub fn station(&self) -> &Wifi {
        &self.station
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    pub fn server_mut(&mut self) -> &mut Server {
        &mut self.server
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
