//! MAC engine interface
//!
//! The LoRaWAN MAC engine (join procedure, duty cycle, frame encoding, radio
//! scheduling) lives outside this crate. This module describes what the node
//! needs from it:
//! - Control operations (reset, transmit, data rate, link check)
//! - A run quantum that reports events by code
//! - Read access to the tx/rx flags and frame buffer after a transmission

/// Event codes and the closed set of known event kinds
pub mod event;

/// Tx/rx flags and downlink extraction
pub mod frame;

pub use event::{EventCode, EventKind};
pub use frame::{AckOutcome, Downlink, FrameError, FrameView, TxRxFlags};

/// Capacity of the engine's frame buffer in bytes
pub const MAX_LEN_FRAME: usize = 64;

/// Data rate selector, numbered as the engine's regional table numbers it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataRate(pub u8);

impl DataRate {
    /// SF12 / 125 kHz
    pub const SF12: DataRate = DataRate(0);
    /// SF11 / 125 kHz
    pub const SF11: DataRate = DataRate(1);
    /// SF10 / 125 kHz
    pub const SF10: DataRate = DataRate(2);
    /// SF9 / 125 kHz
    pub const SF9: DataRate = DataRate(3);
    /// SF8 / 125 kHz
    pub const SF8: DataRate = DataRate(4);
    /// SF7 / 125 kHz
    pub const SF7: DataRate = DataRate(5);
    /// SF7 / 250 kHz
    pub const SF7B: DataRate = DataRate(6);
    /// FSK 50 kbps
    pub const FSK: DataRate = DataRate(7);

    /// Raw selector value
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// LMIC-style MAC engine
///
/// Every node attached to a registry shares one engine. Implementations own the
/// frame buffer; the node only copies into it through [`MacEngine::transmit`] and
/// out of it through [`MacEngine::frame`].
pub trait MacEngine {
    /// Error type for engine operations
    type Error;

    /// Reset the MAC state
    fn reset(&mut self);

    /// Queue `payload` for transmission on `port`
    ///
    /// The engine copies the payload into its pending frame; actual transmission
    /// timing is up to the engine and its duty-cycle limits.
    fn transmit(&mut self, port: u8, payload: &[u8], confirmed: bool) -> Result<(), Self::Error>;

    /// Select the data rate and transmit power (dBm)
    fn set_data_rate(&mut self, data_rate: DataRate, tx_power: i8);

    /// Currently selected data rate
    fn data_rate(&self) -> DataRate;

    /// Enable or disable link check mode
    fn set_link_check(&mut self, enabled: bool);

    /// Whether link check mode is enabled
    fn link_check_enabled(&self) -> bool;

    /// Advance the engine by one quantum
    ///
    /// Each state transition is reported through `emit`, in order, together
    /// with the flags and frame buffer as they stand at that moment. The
    /// engine may reuse the buffer once `emit` returns.
    fn run_once(&mut self, emit: &mut dyn FnMut(EventCode, FrameView<'_>));

    /// Engine-reported wait before the next transmission may be scheduled
    fn duty_cycle_wait(&self) -> u32;

    /// Flags and frame buffer as they stand now
    fn frame(&self) -> FrameView<'_>;
}
