//! Registry of live nodes
//!
//! The host creates one registry at startup and hands it to every node it
//! builds. Nodes join on construction and leave when dropped. Engine events
//! are fanned out through [`Registry::on_event`] in insertion order.

use core::cell::{Cell, RefCell};

use heapless::Vec;

use super::handlers::Handlers;
use crate::mac::{AckOutcome, Downlink, EventCode, EventKind, FrameView};
use crate::{debug, error, info};

/// Identity of a registered node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeId(u32);

impl NodeId {
    /// Raw identifier
    pub const fn value(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: NodeId,
    handlers: Handlers,
}

/// Registry with room for `N` live nodes
#[derive(Debug)]
pub struct Registry<const N: usize> {
    entries: RefCell<Vec<Entry, N>>,
    next_id: Cell<u32>,
    dispatching: Cell<bool>,
}

impl<const N: usize> Default for Registry<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Registry<N> {
    /// Empty registry
    pub const fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            dispatching: Cell::new(false),
        }
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether no node is registered
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Maximum number of live nodes
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Whether `id` is registered
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.borrow().iter().any(|entry| entry.id == id)
    }

    /// Registered nodes in dispatch order
    pub fn ids(&self) -> Vec<NodeId, N> {
        self.entries.borrow().iter().map(|entry| entry.id).collect()
    }

    /// Copy of the handler table registered for `id`
    pub fn handlers(&self, id: NodeId) -> Option<Handlers> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.handlers)
    }

    /// Whether an event is being delivered right now
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }

    pub(crate) fn register(&self) -> Option<NodeId> {
        let id = NodeId(self.next_id.get());
        let entry = Entry {
            id,
            handlers: Handlers::new(),
        };
        self.entries.borrow_mut().push(entry).ok()?;
        self.next_id.set(self.next_id.get().wrapping_add(1));
        Some(id)
    }

    pub(crate) fn unregister(&self, id: NodeId) -> bool {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    pub(crate) fn update(&self, id: NodeId, f: impl FnOnce(&mut Handlers)) -> bool {
        match self.entries.borrow_mut().iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                f(&mut entry.handlers);
                true
            }
            None => false,
        }
    }

    /// Fan an engine event out to every live node
    ///
    /// `frame` is the engine state at the moment the event was emitted. For
    /// transmit-complete, the acknowledgment outcome is logged and any downlink
    /// is copied out of it before the first handler runs.
    pub fn on_event(&self, event: EventCode, frame: &FrameView<'_>) {
        let downlink = capture_downlink(event, frame);
        self.deliver(event, downlink.as_ref());
    }

    /// Deliver an event, with an already extracted downlink, to every live node
    ///
    /// Handler tables are copied before delivery, so handlers registered while
    /// delivering take effect from the next event.
    pub fn deliver(&self, event: EventCode, downlink: Option<&Downlink>) {
        let snapshot: Vec<Handlers, N> =
            self.entries.borrow().iter().map(|entry| entry.handlers).collect();

        let nested = self.dispatching.replace(true);
        for handlers in &snapshot {
            handlers.dispatch(event, downlink);
        }
        self.dispatching.set(nested);
    }
}

/// Classify a transmit-complete and copy its downlink out of `frame`
pub(crate) fn capture_downlink(event: EventCode, frame: &FrameView<'_>) -> Option<Downlink> {
    if event.kind() != Some(EventKind::TxComplete) {
        return None;
    }

    match frame.flags.ack_outcome() {
        AckOutcome::Acked => debug!("need ACK and got ACK"),
        AckOutcome::NotAcked => debug!("need ACK and got NO ACK"),
        AckOutcome::NotRequested => debug!("NO ACK needed"),
    }

    match frame.downlink() {
        Ok(Some(downlink)) => {
            info!("Data payload received");
            debug!(
                "Received {} bytes of payload on port {}",
                downlink.len(),
                downlink.port
            );
            Some(downlink)
        }
        Ok(None) => {
            debug!("No data received");
            None
        }
        Err(_) => {
            error!(
                "Downlink of {} bytes at offset {} is out of contract, dropped",
                frame.data_len,
                frame.data_beg
            );
            None
        }
    }
}
