//! Node and tick source configuration
//!
//! This module contains the tunables for the two halves of the crate:
//! - Node defaults (uplink port, transmit power, initial data rate)
//! - Tick source timing (tick scale, fold-back period, due window)

/// Tick source timing
pub mod hal;

/// Node defaults
pub mod node;

pub use hal::TickConfig;
pub use node::NodeConfig;
