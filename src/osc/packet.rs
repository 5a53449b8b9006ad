//! Packet tree handed to the dispatcher — messages and (nested) bundles.
//!
//! Decoding is done by `rosc`; the `From` impls here convert its packet tree
//! into ours, turning bundle time tags into optional [`SystemTime`]s.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rosc::{OscBundle, OscMessage, OscPacket, OscTime, OscType};

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch.
const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// The reserved time tag meaning "process immediately".
pub const IMMEDIATELY: OscTime = OscTime {
    seconds: 0,
    fractional: 1,
};

/// A decoded OSC packet: either a single message or a bundle of packets.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Message(Message),
    Bundle(Bundle),
}

/// An addressed OSC message. Arguments travel with the message untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub address: String,
    pub args: Vec<OscType>,
}

/// A bundle of packets sharing an optional timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// `None` when the bundle was tagged "immediately".
    pub timestamp: Option<SystemTime>,
    pub packets: Vec<Packet>,
}

impl Message {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(address: impl Into<String>, args: Vec<OscType>) -> Self {
        Self {
            address: address.into(),
            args,
        }
    }
}

impl Bundle {
    pub fn new(timestamp: Option<SystemTime>, packets: Vec<Packet>) -> Self {
        Self { timestamp, packets }
    }
}

impl Packet {
    /// Number of leaf messages in this packet tree.
    pub fn message_count(&self) -> usize {
        match self {
            Packet::Message(_) => 1,
            Packet::Bundle(bundle) => bundle.packets.iter().map(Packet::message_count).sum(),
        }
    }
}

impl From<Message> for Packet {
    fn from(message: Message) -> Self {
        Packet::Message(message)
    }
}

impl From<Bundle> for Packet {
    fn from(bundle: Bundle) -> Self {
        Packet::Bundle(bundle)
    }
}

impl From<OscMessage> for Message {
    fn from(msg: OscMessage) -> Self {
        Self {
            address: msg.addr,
            args: msg.args,
        }
    }
}

impl From<OscBundle> for Bundle {
    fn from(bundle: OscBundle) -> Self {
        Self {
            timestamp: timetag_to_system_time(bundle.timetag),
            packets: bundle.content.into_iter().map(Packet::from).collect(),
        }
    }
}

impl From<OscPacket> for Packet {
    fn from(packet: OscPacket) -> Self {
        match packet {
            OscPacket::Message(msg) => Packet::Message(msg.into()),
            OscPacket::Bundle(bundle) => Packet::Bundle(bundle.into()),
        }
    }
}

/// Convert an OSC time tag to wall-clock time.
///
/// Returns `None` for [`IMMEDIATELY`] and for instants the platform clock
/// cannot represent.
pub fn timetag_to_system_time(tag: OscTime) -> Option<SystemTime> {
    if tag == IMMEDIATELY {
        return None;
    }
    let nanos = ((tag.fractional as u64 * 1_000_000_000) >> 32) as u32;
    let seconds = tag.seconds as u64;
    if seconds >= NTP_UNIX_OFFSET {
        UNIX_EPOCH.checked_add(Duration::new(seconds - NTP_UNIX_OFFSET, nanos))
    } else {
        UNIX_EPOCH
            .checked_sub(Duration::from_secs(NTP_UNIX_OFFSET - seconds))
            .and_then(|t| t.checked_add(Duration::from_nanos(nanos as u64)))
    }
}

/// Convert wall-clock time to an OSC time tag (NTP era 0, truncating).
pub fn system_time_to_timetag(time: SystemTime) -> OscTime {
    let (seconds, nanos) = match time.duration_since(UNIX_EPOCH) {
        Ok(d) => (NTP_UNIX_OFFSET + d.as_secs(), d.subsec_nanos()),
        Err(e) => {
            let before = e.duration();
            let mut secs = NTP_UNIX_OFFSET.saturating_sub(before.as_secs());
            let mut nanos = before.subsec_nanos();
            if nanos > 0 {
                secs = secs.saturating_sub(1);
                nanos = 1_000_000_000 - nanos;
            }
            (secs, nanos)
        }
    };
    OscTime {
        seconds: seconds as u32,
        fractional: (((nanos as u64) << 32) / 1_000_000_000) as u32,
    }
}
