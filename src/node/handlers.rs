use core::fmt;

use crate::mac::{Downlink, EventCode, EventKind};
use crate::{debug, info};

/// Catch-all handler, called with the raw code of every event
pub type EventHandler = fn(EventCode);

/// Per-kind handler
pub type KindHandler = fn();

/// Downlink handler, called with the port and payload
pub type ReceiveHandler = fn(u8, &[u8]);

/// Handler table of one node
///
/// One slot per known event kind, plus the catch-all and the downlink slots.
/// Setting a slot overwrites it; an empty slot drops the event.
#[derive(Clone, Copy, Default)]
pub struct Handlers {
    event: Option<EventHandler>,
    kinds: [Option<KindHandler>; EventKind::COUNT],
    receive: Option<ReceiveHandler>,
}

impl Handlers {
    /// Empty table
    pub const fn new() -> Self {
        Self {
            event: None,
            kinds: [None; EventKind::COUNT],
            receive: None,
        }
    }

    /// Set or clear the catch-all handler
    pub fn set_event(&mut self, handler: Option<EventHandler>) {
        self.event = handler;
    }

    /// Set or clear the handler for `kind`
    pub fn set_kind(&mut self, kind: EventKind, handler: Option<KindHandler>) {
        self.kinds[kind.index()] = handler;
    }

    /// Set or clear the downlink handler
    pub fn set_receive(&mut self, handler: Option<ReceiveHandler>) {
        self.receive = handler;
    }

    /// Handler registered for `kind`
    pub fn kind(&self, kind: EventKind) -> Option<KindHandler> {
        self.kinds[kind.index()]
    }

    /// Whether a catch-all handler is registered
    pub fn has_event(&self) -> bool {
        self.event.is_some()
    }

    /// Whether a downlink handler is registered
    pub fn has_receive(&self) -> bool {
        self.receive.is_some()
    }

    /// Deliver one event
    ///
    /// The catch-all handler runs first. For transmit-complete, the downlink
    /// handler runs next when `downlink` is present. The kind handler runs last.
    pub fn dispatch(&self, event: EventCode, downlink: Option<&Downlink>) {
        if let Some(handler) = self.event {
            info!("Event: {}", event.0);
            handler(event);
        }

        let kind = match event.kind() {
            Some(kind) => kind,
            None => return,
        };
        info!("{} event", kind.name());

        if kind == EventKind::TxComplete {
            if let Some(downlink) = downlink {
                if let Some(receive) = self.receive {
                    receive(downlink.port, &downlink.payload);
                } else {
                    debug!("No receive handler, payload dropped");
                }
            }
        }

        if let Some(handler) = self.kinds[kind.index()] {
            handler();
        }
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = self.kinds.iter().filter(|slot| slot.is_some()).count();
        f.debug_struct("Handlers")
            .field("event", &self.event.is_some())
            .field("kinds", &kinds)
            .field("receive", &self.receive.is_some())
            .finish()
    }
}
