//! Node: event dispatch and control facade
//!
//! A node turns the engine's single event stream into per-concern callbacks
//! and wraps the engine's control calls:
//! - One handler slot per event kind, plus a catch-all and a downlink handler
//! - Send in canonical and defaulted forms, with a checked payload length
//! - Data rate and link check passthroughs
//! - `process`, the single call the host loop drives

use core::cell::{Ref, RefCell};

use heapless::Vec;

use crate::config::node::{NodeConfig, MAX_EVENTS_PER_RUN};
use crate::mac::{DataRate, Downlink, EventCode, EventKind, MacEngine, MAX_LEN_FRAME};
use crate::{debug, warn};

/// Per-node handler table
pub mod handlers;

/// Registry of live nodes and event fan-out
pub mod registry;

pub use handlers::{EventHandler, Handlers, KindHandler, ReceiveHandler};
pub use registry::{NodeId, Registry};

/// Node error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeError<E> {
    /// Engine error
    Engine(E),
    /// Payload does not fit the engine's frame buffer
    PayloadTooLarge {
        /// Payload length
        len: usize,
        /// Frame buffer capacity
        max: usize,
    },
    /// Registry has no room for another node
    RegistryFull,
    /// Engine accessed while it is running or events are being delivered
    Reentrant,
    /// One engine quantum emitted more events than a run can hold
    ///
    /// The events that fit were delivered; the last `dropped` were not.
    EventOverflow {
        /// Number of events not delivered
        dropped: usize,
    },
}

/// Event emitted during a run, with the downlink it carried
struct Pending {
    event: EventCode,
    downlink: Option<Downlink>,
}

/// Application-facing LoRaWAN node
///
/// All nodes built on the same engine and registry share the engine; each has
/// its own handler table. Dropping a node removes it from the registry.
pub struct Node<'a, E: MacEngine, const N: usize> {
    id: NodeId,
    engine: &'a RefCell<E>,
    registry: &'a Registry<N>,
    config: NodeConfig,
}

impl<'a, E: MacEngine, const N: usize> Node<'a, E, N> {
    /// Create a node with the default configuration
    ///
    /// Joins the registry, then resets the engine and selects SF7.
    pub fn new(engine: &'a RefCell<E>, registry: &'a Registry<N>) -> Result<Self, NodeError<E::Error>> {
        Self::with_config(engine, registry, NodeConfig::default())
    }

    /// Create a node with an explicit configuration
    pub fn with_config(
        engine: &'a RefCell<E>,
        registry: &'a Registry<N>,
        config: NodeConfig,
    ) -> Result<Self, NodeError<E::Error>> {
        // Register first, so a full registry leaves the shared engine untouched.
        let id = registry.register().ok_or(NodeError::RegistryFull)?;
        match engine.try_borrow_mut() {
            Ok(mut engine) => {
                engine.reset();
                engine.set_data_rate(config.data_rate, config.tx_power_dbm);
            }
            Err(_) => {
                registry.unregister(id);
                return Err(NodeError::Reentrant);
            }
        }
        debug!("Creating Simple-LoRaWAN node {}", id.value());

        Ok(Self {
            id,
            engine,
            registry,
            config,
        })
    }

    /// Registry identity of this node
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Active configuration
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Queue `payload` on `port`, optionally requesting an acknowledgment
    ///
    /// Payloads longer than [`MAX_LEN_FRAME`] are rejected before the engine is
    /// touched.
    pub fn transmit(&self, port: u8, payload: &[u8], acknowledge: bool) -> Result<(), NodeError<E::Error>> {
        if payload.len() > MAX_LEN_FRAME {
            return Err(NodeError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_LEN_FRAME,
            });
        }

        debug!(
            "Sending data with length {}, on port {} and acknowledge is {}",
            payload.len(),
            port,
            acknowledge
        );
        self.engine
            .try_borrow_mut()
            .map_err(|_| NodeError::Reentrant)?
            .transmit(port, payload, acknowledge)
            .map_err(NodeError::Engine)
    }

    /// Queue `payload` on the default port without acknowledgment
    pub fn send(&self, payload: &[u8]) -> Result<(), NodeError<E::Error>> {
        self.transmit(self.config.default_port, payload, false)
    }

    /// Queue `payload` on `port` without acknowledgment
    pub fn send_to_port(&self, port: u8, payload: &[u8]) -> Result<(), NodeError<E::Error>> {
        self.transmit(port, payload, false)
    }

    /// Queue `payload` on the default port
    pub fn send_with_ack(&self, payload: &[u8], acknowledge: bool) -> Result<(), NodeError<E::Error>> {
        self.transmit(self.config.default_port, payload, acknowledge)
    }

    /// Run one engine quantum and deliver the events it emitted
    ///
    /// Each transmit-complete downlink is copied out of the frame buffer the
    /// moment the engine emits the event, so the engine may reuse the buffer
    /// within the same quantum. Events are delivered once the engine returns,
    /// which lets handlers send.
    ///
    /// Must be called repeatedly from one context. Calling it from inside a
    /// handler returns [`NodeError::Reentrant`]. A quantum that emits more than
    /// [`MAX_EVENTS_PER_RUN`] events returns [`NodeError::EventOverflow`] after
    /// delivering the ones that fit.
    pub fn process(&self) -> Result<(), NodeError<E::Error>> {
        if self.registry.is_dispatching() {
            return Err(NodeError::Reentrant);
        }

        let mut pending: Vec<Pending, MAX_EVENTS_PER_RUN> = Vec::new();
        let mut dropped = 0;
        self.engine
            .try_borrow_mut()
            .map_err(|_| NodeError::Reentrant)?
            .run_once(&mut |event, frame| {
                let downlink = registry::capture_downlink(event, &frame);
                if pending.push(Pending { event, downlink }).is_err() {
                    warn!("Event queue full, event {} dropped", event.0);
                    dropped += 1;
                }
            });

        for Pending { event, downlink } in pending {
            self.registry.deliver(event, downlink.as_ref());
        }

        if dropped > 0 {
            return Err(NodeError::EventOverflow { dropped });
        }
        Ok(())
    }

    /// Call [`Node::process`] for as long as `keep_going` returns true
    ///
    /// Stops at the first error.
    pub fn process_while(&self, mut keep_going: impl FnMut() -> bool) -> Result<(), NodeError<E::Error>> {
        while keep_going() {
            self.process()?;
        }
        Ok(())
    }

    /// Deliver one event to this node only
    ///
    /// A transmit-complete reads the engine's frame buffer as it stands now.
    pub fn on_event(&self, event: EventCode) {
        let handlers = match self.registry.handlers(self.id) {
            Some(handlers) => handlers,
            None => return,
        };
        let downlink = match self.engine.try_borrow() {
            Ok(engine) => registry::capture_downlink(event, &engine.frame()),
            Err(_) => {
                warn!("Engine busy, event {} delivered without payload", event.0);
                None
            }
        };
        handlers.dispatch(event, downlink.as_ref());
    }

    /// Set the catch-all handler, called with the raw code of every event
    pub fn set_event_handler(&self, handler: EventHandler) {
        debug!("Setting eventhandler");
        self.registry.update(self.id, |h| h.set_event(Some(handler)));
    }

    /// Remove the catch-all handler
    pub fn clear_event_handler(&self) {
        self.registry.update(self.id, |h| h.set_event(None));
    }

    /// Set the handler for `kind`, replacing any previous one
    pub fn set_handler(&self, kind: EventKind, handler: KindHandler) {
        debug!("Setting {} eventhandler", kind.name());
        self.registry.update(self.id, |h| h.set_kind(kind, Some(handler)));
    }

    /// Remove the handler for `kind`
    pub fn clear_handler(&self, kind: EventKind) {
        self.registry.update(self.id, |h| h.set_kind(kind, None));
    }

    /// Set the downlink handler, called with (port, payload)
    pub fn set_receive_handler(&self, handler: ReceiveHandler) {
        debug!("Setting receive eventhandler");
        self.registry.update(self.id, |h| h.set_receive(Some(handler)));
    }

    /// Remove the downlink handler
    pub fn clear_receive_handler(&self) {
        self.registry.update(self.id, |h| h.set_receive(None));
    }

    /// Set the scan timeout handler
    pub fn set_scan_timeout_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::ScanTimeout, handler);
    }

    /// Set the beacon found handler
    pub fn set_beacon_found_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::BeaconFound, handler);
    }

    /// Set the beacon missed handler
    pub fn set_beacon_missed_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::BeaconMissed, handler);
    }

    /// Set the beacon tracked handler
    pub fn set_beacon_tracked_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::BeaconTracked, handler);
    }

    /// Set the joining handler
    pub fn set_joining_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::Joining, handler);
    }

    /// Set the joined handler
    pub fn set_joined_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::Joined, handler);
    }

    /// Set the RFU1 handler
    pub fn set_rfu1_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::Rfu1, handler);
    }

    /// Set the join failed handler
    pub fn set_join_failed_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::JoinFailed, handler);
    }

    /// Set the rejoin failed handler
    pub fn set_rejoin_failed_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::RejoinFailed, handler);
    }

    /// Set the transmit complete handler
    ///
    /// Runs after the downlink handler when the transmission carried a downlink.
    pub fn set_tx_complete_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::TxComplete, handler);
    }

    /// Set the lost time sync handler
    pub fn set_lost_tsync_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::LostTsync, handler);
    }

    /// Set the reset handler
    pub fn set_reset_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::Reset, handler);
    }

    /// Set the receive complete handler
    pub fn set_rx_complete_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::RxComplete, handler);
    }

    /// Set the link dead handler
    pub fn set_link_dead_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::LinkDead, handler);
    }

    /// Set the link alive handler
    pub fn set_link_alive_handler(&self, handler: KindHandler) {
        self.set_handler(EventKind::LinkAlive, handler);
    }

    /// Enable link check mode
    pub fn enable_link_check(&self) -> Result<(), NodeError<E::Error>> {
        self.set_link_check(true)
    }

    /// Disable link check mode
    pub fn disable_link_check(&self) -> Result<(), NodeError<E::Error>> {
        self.set_link_check(false)
    }

    /// Enable or disable link check mode
    pub fn set_link_check(&self, enabled: bool) -> Result<(), NodeError<E::Error>> {
        self.engine
            .try_borrow_mut()
            .map_err(|_| NodeError::Reentrant)?
            .set_link_check(enabled);
        Ok(())
    }

    /// Whether link check mode is enabled, as reported by the engine
    pub fn link_check_enabled(&self) -> Result<bool, NodeError<E::Error>> {
        Ok(self.read_engine()?.link_check_enabled())
    }

    /// Select a data rate at the configured transmit power
    pub fn set_spread_factor(&self, data_rate: DataRate) -> Result<(), NodeError<E::Error>> {
        self.engine
            .try_borrow_mut()
            .map_err(|_| NodeError::Reentrant)?
            .set_data_rate(data_rate, self.config.tx_power_dbm);
        Ok(())
    }

    /// Current data rate, as reported by the engine
    pub fn spread_factor(&self) -> Result<DataRate, NodeError<E::Error>> {
        Ok(self.read_engine()?.data_rate())
    }

    /// Engine-reported wait before the next transmission may be scheduled
    pub fn time_until_next_send(&self) -> Result<u32, NodeError<E::Error>> {
        let wait = self.read_engine()?.duty_cycle_wait();
        debug!("Time: {}", wait);
        Ok(wait)
    }

    fn read_engine(&self) -> Result<Ref<'a, E>, NodeError<E::Error>> {
        self.engine.try_borrow().map_err(|_| NodeError::Reentrant)
    }
}

impl<E: MacEngine, const N: usize> Drop for Node<'_, E, N> {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}
