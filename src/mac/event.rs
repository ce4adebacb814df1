/// Raw event code as emitted by the MAC engine
///
/// Codes outside the known set are legal; they only reach the generic handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventCode(pub u8);

impl EventCode {
    /// Known event kind for this code, if any
    pub fn kind(self) -> Option<EventKind> {
        EventKind::from_code(self.0)
    }
}

impl From<EventKind> for EventCode {
    fn from(kind: EventKind) -> Self {
        EventCode(kind as u8)
    }
}

/// Known MAC event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum EventKind {
    /// Beacon scan timed out
    ScanTimeout = 1,
    /// Beacon found during scan
    BeaconFound = 2,
    /// Expected beacon was not received
    BeaconMissed = 3,
    /// Beacon received at the expected time
    BeaconTracked = 4,
    /// Join procedure started
    Joining = 5,
    /// Join procedure succeeded
    Joined = 6,
    /// Reserved for future use
    Rfu1 = 7,
    /// Join procedure failed
    JoinFailed = 8,
    /// Rejoin procedure failed
    RejoinFailed = 9,
    /// Transmission finished, including the receive windows
    TxComplete = 10,
    /// Beacon time synchronization lost
    LostTsync = 11,
    /// MAC state was reset
    Reset = 12,
    /// Data received in a ping slot
    RxComplete = 13,
    /// No confirmation from the network for too long
    LinkDead = 14,
    /// Link with the network restored
    LinkAlive = 15,
}

impl EventKind {
    /// Number of known kinds
    pub const COUNT: usize = 15;

    /// All known kinds in code order
    pub const ALL: [EventKind; EventKind::COUNT] = [
        EventKind::ScanTimeout,
        EventKind::BeaconFound,
        EventKind::BeaconMissed,
        EventKind::BeaconTracked,
        EventKind::Joining,
        EventKind::Joined,
        EventKind::Rfu1,
        EventKind::JoinFailed,
        EventKind::RejoinFailed,
        EventKind::TxComplete,
        EventKind::LostTsync,
        EventKind::Reset,
        EventKind::RxComplete,
        EventKind::LinkDead,
        EventKind::LinkAlive,
    ];

    /// Look up a kind by its engine code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=15 => Some(Self::ALL[code as usize - 1]),
            _ => None,
        }
    }

    /// Engine code of this kind
    pub const fn code(self) -> EventCode {
        EventCode(self as u8)
    }

    /// Position in [`EventKind::ALL`], used to index handler slots
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// Human-readable name for logs
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::ScanTimeout => "Scan timeout",
            EventKind::BeaconFound => "Beacon found",
            EventKind::BeaconMissed => "Beacon missed",
            EventKind::BeaconTracked => "Beacon tracked",
            EventKind::Joining => "Joining",
            EventKind::Joined => "Joined",
            EventKind::Rfu1 => "RFU1",
            EventKind::JoinFailed => "Join failed",
            EventKind::RejoinFailed => "Rejoin failed",
            EventKind::TxComplete => "Transmit complete",
            EventKind::LostTsync => "Lost tsync",
            EventKind::Reset => "Reset",
            EventKind::RxComplete => "Receive complete",
            EventKind::LinkDead => "Link dead",
            EventKind::LinkAlive => "Link alive",
        }
    }
}
