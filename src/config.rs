use core::fmt::Debug;

use embedded_time::duration::Milliseconds;
use heapless::{consts::*, ArrayLength, String};

use crate::parser;
use crate::server::ServerOptions;
use crate::station::PhyMode;

pub const DEFAULT_HOSTNAME: &str = "sd-webdav";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    Encoding,
    InvalidSsid,
    InvalidPassword,
    InvalidHostname,
    MissingSsid,
}

/// Persistent storage of the network credentials.
pub trait ConfigStore {
    type Error: Debug;

    fn ssid(&self) -> &str;
    fn password(&self) -> &str;

    /// Persist the credentials that just produced a working link.
    fn save(&mut self) -> Result<(), Self::Error>;

    /// Hostname to announce; `None` falls back to [`Settings::hostname`].
    fn hostname(&self) -> Option<&str> {
        None
    }
}

/// Non-volatile home of the credentials (EEPROM, flash page, setup file).
pub trait CredentialStorage {
    type Error: Debug;

    fn store(&mut self, credentials: &Credentials) -> Result<(), Self::Error>;
}

/// Credentials loaded at boot together with the storage they are saved to.
pub struct Persisted<Storage>
    where Storage: CredentialStorage
{
    credentials: Credentials,
    storage: Storage,
}

impl<Storage> Persisted<Storage>
    where Storage: CredentialStorage
{
    pub fn new(credentials: Credentials, storage: Storage) -> Self {
        Self {
            credentials,
            storage,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }
}

impl<Storage> ConfigStore for Persisted<Storage>
    where Storage: CredentialStorage
{
    type Error = Storage::Error;

    fn ssid(&self) -> &str {
        self.credentials.ssid()
    }

    fn password(&self) -> &str {
        self.credentials.password()
    }

    fn save(&mut self) -> Result<(), Self::Error> {
        self.storage.store(&self.credentials)
    }

    fn hostname(&self) -> Option<&str> {
        self.credentials.hostname()
    }
}

/// Validated station credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct Credentials {
    ssid: String<U32>,
    password: String<U64>,
    hostname: Option<String<U32>>,
}

fn bounded<N>(value: &str, error: ConfigError) -> Result<String<N>, ConfigError>
    where N: ArrayLength<u8>
{
    let mut out = String::new();
    out.push_str(value).map_err(|_| error)?;
    Ok(out)
}

impl Credentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, ConfigError> {
        if ssid.is_empty() {
            return Err(ConfigError::InvalidSsid);
        }
        Ok(Self {
            ssid: bounded(ssid, ConfigError::InvalidSsid)?,
            password: bounded(password, ConfigError::InvalidPassword)?,
            hostname: None,
        })
    }

    pub fn with_hostname(mut self, hostname: &str) -> Result<Self, ConfigError> {
        let valid = !hostname.is_empty()
            && !hostname.starts_with('-')
            && hostname.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
        if !valid {
            return Err(ConfigError::InvalidHostname);
        }
        self.hostname = Some(bounded(hostname, ConfigError::InvalidHostname)?);
        Ok(self)
    }

    /// Load from an INI-style setup file:
    ///
    /// ```text
    /// SSID=workshop
    /// PASSWORD=hunter22
    /// HOSTNAME=printer-sd
    /// ```
    ///
    /// Keys are case-insensitive, unknown keys are ignored and a missing
    /// `PASSWORD` means an open network.
    pub fn parse(text: &[u8]) -> Result<Self, ConfigError> {
        let text = core::str::from_utf8(text).map_err(|_| ConfigError::Encoding)?;

        let mut ssid = None;
        let mut password = "";
        let mut hostname = None;
        for setting in parser::settings(text) {
            if setting.key.eq_ignore_ascii_case("ssid") {
                ssid = Some(setting.value);
            } else if setting.key.eq_ignore_ascii_case("password") {
                password = setting.value;
            } else if setting.key.eq_ignore_ascii_case("hostname") {
                hostname = Some(setting.value);
            } else {
                log::debug!("ignoring setup key {}", setting.key);
            }
        }

        let credentials = Self::new(ssid.ok_or(ConfigError::MissingSsid)?, password)?;
        match hostname {
            Some(hostname) => credentials.with_hostname(hostname),
            None => Ok(credentials),
        }
    }

    pub fn ssid(&self) -> &str {
        self.ssid.as_str()
    }

    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_ref().map(|h| h.as_str())
    }
}

/// Fixed parameters of the bootstrap sequence.
#[derive(Debug, Clone)]
pub struct Settings<'a> {
    pub hostname: &'a str,
    pub phy_mode: PhyMode,
    /// Upper bound on the association wait.
    pub connect_timeout: Milliseconds<u32>,
    /// Step between association (and bus-idle) polls.
    pub poll_interval: Milliseconds<u32>,
    /// Upper bound on waiting for the other master before the card is
    /// first initialized.
    pub init_wait: Milliseconds<u32>,
    pub server: ServerOptions,
}

impl Settings<'_> {
    /// Number of `poll_interval` steps that fit in `budget`, at least one.
    pub(crate) fn steps(&self, budget: Milliseconds<u32>) -> u32 {
        match self.poll_interval.0 {
            0 => 1,
            step => (budget.0 / step).max(1),
        }
    }
}

impl Default for Settings<'static> {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME,
            phy_mode: PhyMode::N,
            connect_timeout: Milliseconds(30_000u32),
            poll_interval: Milliseconds(100u32),
            init_wait: Milliseconds(60_000u32),
            server: ServerOptions::default(),
        }
    }
}
