//! Contract of the file-server engine that serves the card over the network.

/// SPI clock setting handed to the card driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpiSpeed {
    Full,
    Half,
    Quarter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerOptions {
    /// GPIO number of the card's select line.
    pub card_select: u8,
    pub speed: SpiSpeed,
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            card_select: 4,
            speed: SpiSpeed::Full,
            port: 80,
        }
    }
}

/// Outcome of the one-time card and engine initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardInit {
    Ok,
    Failed,
}

/// A single-client request engine. Every method that may touch the card
/// is only called while the local side owns the bus.
pub trait FileServer {
    type Error: core::fmt::Debug;

    /// Mount the card and start listening.
    fn init(&mut self, options: &ServerOptions) -> Result<(), Self::Error>;

    fn is_client_waiting(&mut self) -> bool;

    /// Perform one unit of protocol work for the waiting client.
    fn handle_client(&mut self) -> Result<(), Self::Error>;

    /// Turn the waiting client away without serving it.
    fn reject_client(&mut self, reason: &str);
}
