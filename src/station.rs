use core::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    NotConnected,
    Connected,
}

/// Association progress as reported by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    Connected,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhyMode {
    B,
    G,
    N,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinError {
    InvalidSsid,
    InvalidPassword,
    UnableToAssociate,
    Timeout,
}

/// A WiFi interface in station mode.
pub trait Station {
    type Address: Display;

    fn set_hostname(&mut self, hostname: &str);
    fn set_auto_connect(&mut self, enabled: bool);
    fn set_station_mode(&mut self);
    fn set_phy_mode(&mut self, mode: PhyMode);
    fn begin(&mut self, ssid: &str, password: &str);
    fn status(&mut self) -> LinkStatus;
    fn local_address(&self) -> Self::Address;
    /// RSSI in dBm.
    fn signal_strength(&self) -> i8;
}

pub(crate) fn poll_join<S: Station>(station: &mut S) -> nb::Result<(), JoinError> {
    match station.status() {
        LinkStatus::Connected => Ok(()),
        LinkStatus::Pending => Err(nb::Error::WouldBlock),
        LinkStatus::Failed => Err(nb::Error::Other(JoinError::UnableToAssociate)),
    }
}
