//! Capability discovery: which event types and codes a device claims
//! to support.

use std::collections::BTreeMap;
use std::io;
use std::os::unix::io::RawFd;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::codes::{self, EV_MAX, KEY_MAX};
use crate::sys;

/// One supported event-type class together with its display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CapabilityType {
    /// Kernel event-type number (`EV_KEY`, `EV_REL`, ...).
    pub kind: u16,
    /// Name from the static type table, `"?"` if unknown.
    pub name: &'static str,
}

/// One supported code within an event-type class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CapabilityCode {
    /// Kernel event code within the class.
    pub code: u16,
    /// Name from the per-type table, `"?"` if unknown.
    pub name: &'static str,
}

/// Supported codes per event type.
///
/// Keys are unique per device and iterate in ascending numeric-type
/// order; each code list is ascending as well.
pub type CapabilityMap = BTreeMap<CapabilityType, Vec<CapabilityCode>>;

/// Expands a kernel bitmask into the numbers of its set bits, in
/// ascending order. The walk covers `0..max`, clamped to the bits the
/// buffer actually holds.
pub(crate) fn set_bits(mask: &[u8], max: u16) -> Vec<u16> {
    let limit = max.min((mask.len() * 8) as u16);
    let mut set = Vec::new();
    for bit in 0..limit {
        if mask[bit as usize / 8] & (1 << (bit % 8)) != 0 {
            set.push(bit);
        }
    }
    set
}

/// Walks the device's event-type bitmask and, per supported type, the
/// code bitmask within that type, resolving names through the static
/// tables.
///
/// A per-type code query failing with `EINVAL` is skipped: some types
/// are not queryable on every device (auto-repeat on certain virtual
/// devices, for one). Any other failure aborts discovery.
pub(crate) fn probe_capabilities(fd: RawFd) -> io::Result<CapabilityMap> {
    let mut ev_bits = [0u8; (EV_MAX as usize + 1) / 8];
    sys::ioctl(
        fd,
        sys::eviocgbit(0, ev_bits.len()),
        ev_bits.as_mut_ptr().cast(),
    )?;

    let mut capabilities = CapabilityMap::new();
    let mut code_bits = [0u8; (KEY_MAX as usize + 1) / 8];

    for ev_type in set_bits(&ev_bits, EV_MAX) {
        code_bits.fill(0);
        match sys::ioctl(
            fd,
            sys::eviocgbit(ev_type, code_bits.len()),
            code_bits.as_mut_ptr().cast(),
        ) {
            Ok(()) => {}
            Err(e) if e.raw_os_error() == Some(libc::EINVAL) => {
                log::debug!("event type {ev_type} not queryable, skipped");
                continue;
            }
            Err(e) => return Err(e),
        }

        let codes = set_bits(&code_bits, KEY_MAX)
            .into_iter()
            .map(|code| CapabilityCode {
                code,
                name: codes::code_name(ev_type, code),
            })
            .collect();

        let key = CapabilityType {
            kind: ev_type,
            name: codes::ev_type_name(ev_type),
        };
        capabilities.insert(key, codes);
    }

    Ok(capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::EV_KEY;

    fn mask_with(bits: &[u16]) -> Vec<u8> {
        let mut mask = vec![0u8; (KEY_MAX as usize + 1) / 8];
        for &bit in bits {
            mask[bit as usize / 8] |= 1 << (bit % 8);
        }
        mask
    }

    #[test]
    fn one_code_per_set_bit_in_ascending_order() {
        let mask = mask_with(&[30, 2, 1]);
        assert_eq!(set_bits(&mask, KEY_MAX), vec![1, 2, 30]);
    }

    #[test]
    fn zero_mask_expands_to_nothing() {
        let mask = mask_with(&[]);
        assert!(set_bits(&mask, KEY_MAX).is_empty());
    }

    #[test]
    fn bits_at_or_above_the_bound_are_ignored() {
        let mut mask = mask_with(&[5]);
        mask[KEY_MAX as usize / 8] |= 1 << (KEY_MAX % 8);
        assert_eq!(set_bits(&mask, KEY_MAX), vec![5]);

        // A short buffer clamps the walk instead of panicking.
        assert_eq!(set_bits(&[0b1000_0001], KEY_MAX), vec![0, 7]);
    }

    #[test]
    fn key_capability_names_resolve_through_the_table() {
        let mask = mask_with(&[1, 2, 30]);
        let codes: Vec<CapabilityCode> = set_bits(&mask, KEY_MAX)
            .into_iter()
            .map(|code| CapabilityCode {
                code,
                name: codes::code_name(EV_KEY, code),
            })
            .collect();

        assert_eq!(codes.len(), 3);
        assert_eq!(codes[0].name, "KEY_ESC");
        assert_eq!(codes[1].name, "KEY_1");
        assert_eq!(codes[2].name, "KEY_A");
    }

    #[test]
    fn capability_map_orders_types_numerically() {
        let mut map = CapabilityMap::new();
        for kind in [4u16, 1, 2] {
            let key = CapabilityType {
                kind,
                name: codes::ev_type_name(kind),
            };
            map.insert(key, Vec::new());
        }

        let kinds: Vec<u16> = map.keys().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![1, 2, 4]);
    }
}
