use heapless::Vec;

use super::MAX_LEN_FRAME;

/// Tx/rx status flags reported by the engine after a transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TxRxFlags(pub u8);

impl TxRxFlags {
    /// Confirmed uplink was acknowledged
    pub const ACK: u8 = 0x80;
    /// Confirmed uplink was not acknowledged
    pub const NACK: u8 = 0x40;
    /// Downlink carried no port
    pub const NOPORT: u8 = 0x20;
    /// Downlink carried a port, stored right before the payload
    pub const PORT: u8 = 0x10;
    /// Downlink received in RX1
    pub const DNW1: u8 = 0x01;
    /// Downlink received in RX2
    pub const DNW2: u8 = 0x02;
    /// Downlink received in a ping slot
    pub const PING: u8 = 0x04;

    /// Whether every bit of `mask` is set
    pub const fn contains(self, mask: u8) -> bool {
        self.0 & mask == mask
    }

    /// Classify the acknowledgment outcome
    pub const fn ack_outcome(self) -> AckOutcome {
        if self.contains(Self::ACK) {
            AckOutcome::Acked
        } else if self.contains(Self::NACK) {
            AckOutcome::NotAcked
        } else {
            AckOutcome::NotRequested
        }
    }
}

/// Outcome of the acknowledgment exchange for one uplink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckOutcome {
    /// Acknowledgment requested and received
    Acked,
    /// Acknowledgment requested and not received
    NotAcked,
    /// No acknowledgment requested
    NotRequested,
}

/// Downlink extraction error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Reported length exceeds the frame capacity
    Oversized {
        /// Reported length
        len: usize,
    },
    /// Payload or port position lies outside the frame buffer
    OutOfBounds,
}

/// Borrowed view of the engine's state after a transmission
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    /// Tx/rx flags
    pub flags: TxRxFlags,
    /// Frame buffer
    pub frame: &'a [u8],
    /// Offset of the downlink payload in `frame`
    pub data_beg: usize,
    /// Downlink payload length, 0 when nothing was received
    pub data_len: usize,
}

impl<'a> FrameView<'a> {
    /// View with no flags and no downlink
    pub const fn empty() -> Self {
        Self {
            flags: TxRxFlags(0),
            frame: &[],
            data_beg: 0,
            data_len: 0,
        }
    }

    /// Copy out the downlink payload and port, if the engine reports one
    pub fn downlink(&self) -> Result<Option<Downlink>, FrameError> {
        if self.data_len == 0 {
            return Ok(None);
        }
        if self.data_len > MAX_LEN_FRAME {
            return Err(FrameError::Oversized { len: self.data_len });
        }

        let end = self
            .data_beg
            .checked_add(self.data_len)
            .ok_or(FrameError::OutOfBounds)?;
        let bytes = self
            .frame
            .get(self.data_beg..end)
            .ok_or(FrameError::OutOfBounds)?;

        let port = if self.flags.contains(TxRxFlags::PORT) {
            self.data_beg
                .checked_sub(1)
                .and_then(|i| self.frame.get(i))
                .copied()
                .ok_or(FrameError::OutOfBounds)?
        } else {
            0
        };

        let mut payload = Vec::new();
        payload
            .extend_from_slice(bytes)
            .map_err(|_| FrameError::Oversized { len: self.data_len })?;

        Ok(Some(Downlink { port, payload }))
    }
}

/// Downlink payload copied out of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downlink {
    /// Port, 0 when the frame carried none
    pub port: u8,
    /// Payload bytes
    pub payload: Vec<u8, MAX_LEN_FRAME>,
}

impl Downlink {
    /// Payload length
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
