//! The evdev wire record and its binary decoding.
//!
//! The kernel delivers events as fixed-width little-endian records:
//! two kernel-word timestamp fields, then type, code and value. The
//! word width follows the target (8 bytes on 64-bit, 4 on 32-bit), so
//! [`EVENT_SIZE`] is a per-target constant.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ReadError;

#[cfg(target_pointer_width = "64")]
type TimeWord = u64;
#[cfg(target_pointer_width = "32")]
type TimeWord = u32;

const TIME_WIDTH: usize = std::mem::size_of::<TimeWord>();

/// Width in bytes of one wire record on this target.
pub const EVENT_SIZE: usize = 2 * TIME_WIDTH + 8;

/// Number of records one [`Device::read`][crate::Device::read] call
/// asks the kernel for.
pub(crate) const EVENT_BATCH: usize = 16;

/// One decoded input event.
///
/// A plain value: it carries no reference back to the device it was
/// read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InputEvent {
    /// Seconds part of the kernel timestamp.
    pub time_sec: u64,
    /// Microseconds part of the kernel timestamp.
    pub time_usec: u64,
    /// Event-type class (`EV_KEY`, `EV_REL`, ...).
    pub event_type: u16,
    /// Code within the event-type class.
    pub code: u16,
    /// Event payload: key state, axis delta, axis position, ...
    pub value: i32,
}

impl InputEvent {
    /// Decodes one little-endian wire record.
    pub fn from_bytes(bytes: &[u8; EVENT_SIZE]) -> Self {
        let base = 2 * TIME_WIDTH;
        let mut sec = [0u8; TIME_WIDTH];
        sec.copy_from_slice(&bytes[..TIME_WIDTH]);
        let mut usec = [0u8; TIME_WIDTH];
        usec.copy_from_slice(&bytes[TIME_WIDTH..base]);
        let mut ty = [0u8; 2];
        ty.copy_from_slice(&bytes[base..base + 2]);
        let mut code = [0u8; 2];
        code.copy_from_slice(&bytes[base + 2..base + 4]);
        let mut value = [0u8; 4];
        value.copy_from_slice(&bytes[base + 4..base + 8]);
        Self {
            time_sec: TimeWord::from_le_bytes(sec) as u64,
            time_usec: TimeWord::from_le_bytes(usec) as u64,
            event_type: u16::from_le_bytes(ty),
            code: u16::from_le_bytes(code),
            value: i32::from_le_bytes(value),
        }
    }

    /// Encodes this record back into its wire form.
    pub fn to_bytes(&self) -> [u8; EVENT_SIZE] {
        let base = 2 * TIME_WIDTH;
        let mut out = [0u8; EVENT_SIZE];
        out[..TIME_WIDTH].copy_from_slice(&(self.time_sec as TimeWord).to_le_bytes());
        out[TIME_WIDTH..base].copy_from_slice(&(self.time_usec as TimeWord).to_le_bytes());
        out[base..base + 2].copy_from_slice(&self.event_type.to_le_bytes());
        out[base + 2..base + 4].copy_from_slice(&self.code.to_le_bytes());
        out[base + 4..base + 8].copy_from_slice(&self.value.to_le_bytes());
        out
    }
}

/// Decodes a batch buffer of wire records.
///
/// Decoding stops at the first record whose seconds field is zero: a
/// partial kernel read leaves the unfilled tail of the buffer
/// zero-initialized, and the zero record marks where that tail begins.
/// The zero record itself is discarded. The format carries no length
/// prefix, so an event genuinely timestamped at second zero is dropped
/// as padding; that is a known limitation of this rule.
///
/// Fails with [`ReadError::Decode`] when the buffer length is not a
/// multiple of [`EVENT_SIZE`].
pub fn decode_events(buf: &[u8]) -> Result<Vec<InputEvent>, ReadError> {
    if buf.len() % EVENT_SIZE != 0 {
        return Err(ReadError::Decode { len: buf.len() });
    }
    let mut events = Vec::with_capacity(buf.len() / EVENT_SIZE);
    for chunk in buf.chunks_exact(EVENT_SIZE) {
        let mut record = [0u8; EVENT_SIZE];
        record.copy_from_slice(chunk);
        let event = InputEvent::from_bytes(&record);
        if event.time_sec == 0 {
            break;
        }
        events.push(event);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(sec: u64, value: i32) -> InputEvent {
        InputEvent {
            time_sec: sec,
            time_usec: 123_456,
            event_type: 1,
            code: 30,
            value,
        }
    }

    #[test]
    fn wire_round_trip() {
        let event = sample(1_700_000_000, 1);
        assert_eq!(InputEvent::from_bytes(&event.to_bytes()), event);
    }

    #[test]
    fn wire_round_trip_negative_value() {
        let event = InputEvent {
            time_sec: 42,
            time_usec: 7,
            event_type: 2,
            code: 1,
            value: -5,
        };
        assert_eq!(InputEvent::from_bytes(&event.to_bytes()), event);
    }

    #[test]
    fn zero_second_record_decodes_on_its_own() {
        // The truncation rule lives in decode_events, not in the codec.
        let event = sample(0, 1);
        assert_eq!(InputEvent::from_bytes(&event.to_bytes()), event);
    }

    #[test]
    fn batch_stops_at_zero_filled_tail() {
        let mut buf = vec![0u8; EVENT_SIZE * EVENT_BATCH];
        for (i, event) in [sample(10, 1), sample(10, 0), sample(11, 1)]
            .iter()
            .enumerate()
        {
            buf[i * EVENT_SIZE..(i + 1) * EVENT_SIZE].copy_from_slice(&event.to_bytes());
        }

        let events = decode_events(&buf).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], sample(10, 1));
        assert_eq!(events[2], sample(11, 1));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        assert!(decode_events(&[]).unwrap().is_empty());
        assert!(decode_events(&vec![0u8; EVENT_SIZE * 4]).unwrap().is_empty());
    }

    #[test]
    fn ragged_buffer_is_a_decode_error() {
        let buf = vec![0u8; EVENT_SIZE + 3];
        assert!(matches!(
            decode_events(&buf),
            Err(ReadError::Decode { len }) if len == EVENT_SIZE + 3
        ));
    }
}
