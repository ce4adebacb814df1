//! Simple LoRaWAN node adapter
//!
//! This crate puts a callback-based event API in front of an LMIC-style LoRaWAN MAC
//! engine, and provides the hardware abstraction layer that engine schedules against.
//!
//! # Features
//! - One handler slot per MAC event kind, plus a catch-all handler
//! - Downlink payload and port extraction on transmit-complete
//! - Registry fan-out of engine events to every live node, in insertion order
//! - Free-running tick counter with periodic overflow fold-back
//! - Interrupt-nesting-safe critical sections and wraparound-safe deadlines
//!
//! # Example
//! ```no_run
//! use core::cell::RefCell;
//! use simple_lorawan::{
//!     mac::{DataRate, EventCode, FrameView, MacEngine},
//!     node::{Node, Registry},
//! };
//!
//! # struct Engine;
//! # impl MacEngine for Engine {
//! #     type Error = ();
//! #     fn reset(&mut self) {}
//! #     fn transmit(&mut self, _: u8, _: &[u8], _: bool) -> Result<(), ()> { Ok(()) }
//! #     fn set_data_rate(&mut self, _: DataRate, _: i8) {}
//! #     fn data_rate(&self) -> DataRate { DataRate::SF7 }
//! #     fn set_link_check(&mut self, _: bool) {}
//! #     fn link_check_enabled(&self) -> bool { false }
//! #     fn run_once(&mut self, _: &mut dyn FnMut(EventCode, FrameView<'_>)) {}
//! #     fn duty_cycle_wait(&self) -> u32 { 0 }
//! #     fn frame(&self) -> FrameView<'_> { FrameView::empty() }
//! # }
//! // The engine is supplied by the MAC library
//! let engine = RefCell::new(Engine);
//! let registry: Registry<2> = Registry::new();
//!
//! let node = Node::new(&engine, &registry).unwrap();
//! node.set_joined_handler(|| { /* start sending */ });
//! node.set_receive_handler(|port, payload| {
//!     let _ = (port, payload);
//! });
//! node.set_event_handler(|event: EventCode| {
//!     let _ = event;
//! });
//!
//! node.send(b"hello").unwrap();
//! loop {
//!     node.process().unwrap();
//! }
//! ```

#![warn(missing_docs)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

#[cfg(feature = "defmt")]
#[allow(unused_imports)]
pub(crate) use defmt::{debug, error, info, warn};

#[cfg(not(feature = "defmt"))]
#[allow(unused_imports)]
pub(crate) use log::{debug, error, info, warn};

/// Node and tick source configuration
pub mod config;

/// Hardware abstraction layer: tick source and interrupt nesting
pub mod hal;

/// MAC engine interface, event codes and frame flags
pub mod mac;

/// Node facade, handler table and registry
pub mod node;
