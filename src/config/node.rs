use crate::mac::DataRate;

/// Port used when a send does not name one
pub const DEFAULT_PORT: u8 = 1;

/// Transmit power forwarded with every data rate change, in dBm
pub const DEFAULT_TX_POWER_DBM: i8 = 14;

/// Events one engine quantum may emit before the rest are dropped
pub const MAX_EVENTS_PER_RUN: usize = 8;

/// Node configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeConfig {
    /// Uplink port for the port-less send forms
    pub default_port: u8,
    /// Transmit power used by `set_spread_factor`
    pub tx_power_dbm: i8,
    /// Data rate selected when the node is created
    pub data_rate: DataRate,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            tx_power_dbm: DEFAULT_TX_POWER_DBM,
            data_rate: DataRate::SF7,
        }
    }
}
