//! Chorda inter-half link protocol.
//!
//! The right half streams its resolved virtual key events and trackball
//! deltas to the left half over the TRRS serial line, one JSON object per
//! line. The left half injects the items into its own pipeline ahead of the
//! locally resolved events. Framing and decoding live here; the UART
//! transport and the "wait for start" handshake belong to the adapter.

use serde::{Deserialize, Serialize};

/// Line the right half emits once its pipeline is up; the left half
/// discards everything before it.
pub const START_MARKER: &str = "chorda-start";

/// One item on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkItem {
    /// Trackball movement since the previous item.
    MouseMove { dx: i16, dy: i16 },
    /// A resolved virtual key edge on the remote half.
    VKey { serial: u16, pressed: bool },
}

impl LinkItem {
    /// Serialized line, newline terminated.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut line = serde_json::to_vec(self).expect("LinkItem should serialize");
        line.push(b'\n');
        line
    }

    /// Decode one received line. The caller decides what a bad line means;
    /// on the left half it is logged and skipped.
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_a_vkey_edge() {
        let item = LinkItem::VKey {
            serial: 23,
            pressed: true,
        };
        let bytes = item.as_bytes();
        assert_eq!(bytes.last(), Some(&b'\n'));
        let line = core::str::from_utf8(&bytes).unwrap();
        assert_eq!(LinkItem::from_line(line).unwrap(), item);
    }

    #[test]
    fn decodes_mouse_motion() {
        let item = LinkItem::from_line(r#"{"MouseMove":{"dx":-3,"dy":12}}"#).unwrap();
        assert_eq!(item, LinkItem::MouseMove { dx: -3, dy: 12 });
    }

    #[test]
    fn rejects_garbage_lines() {
        assert!(LinkItem::from_line("").is_err());
        assert!(LinkItem::from_line("\x02\x7f").is_err());
        assert!(LinkItem::from_line(r#"{"Telemetry":{}}"#).is_err());
    }
}
