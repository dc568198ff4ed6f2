//! Wire format: discovery beacons and peer messages.
//!
//! Everything on the wire is JSON (serde_json). Beacons travel as single UDP
//! datagrams; peer messages travel as newline-delimited JSON objects over
//! the TCP stream. There is no version field; both endpoints are assumed to
//! run identical protocol logic.

use serde::{Deserialize, Serialize};

use super::error::WireError;
use crate::game::MoveRecord;

/// Discovery beacon: what a device periodically announces while looking for
/// an opponent. `port` is the TCP port its invitation listener accepts on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Beacon {
    pub service: String,
    pub name: String,
    pub port: u16,
}

/// Messages exchanged over a TCP stream, one JSON object per line.
///
/// The invitation timestamp is wall-clock seconds since the epoch; peers
/// treat it as opaque context for tie-breaking and never interpret it as a
/// clock.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Message {
    /// First line on an outgoing connection: ask the peer to play.
    Invite { name: String, timestamp: f64 },
    /// The peer accepted our invitation; sender becomes black.
    Accept { name: String },
    /// An ordered batch of confirmed moves (two records for a castle).
    Moves(Vec<MoveRecord>),
}

pub(crate) fn encode_message(message: &Message) -> Result<String, WireError> {
    serde_json::to_string(message).map_err(WireError::Encode)
}

pub(crate) fn decode_message(line: &str) -> Result<Message, WireError> {
    serde_json::from_str(line.trim_end()).map_err(WireError::Decode)
}

pub(crate) fn encode_beacon(beacon: &Beacon) -> Result<String, WireError> {
    serde_json::to_string(beacon).map_err(WireError::Encode)
}

pub(crate) fn decode_beacon(datagram: &[u8]) -> Result<Beacon, WireError> {
    serde_json::from_slice(datagram).map_err(WireError::Decode)
}
