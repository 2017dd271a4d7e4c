//! Input interpreter core of the chorda split keyboard.
//!
//! Two stages turn physical switch snapshots into host-side reaction
//! commands. A [`half::HalfResolver`] debounced-snapshot in, groups the
//! switches per finger and resolves chords into virtual key press/release
//! events ([`key_group`]). A [`layout::VirtualKeyboard`] consumes that event
//! stream and applies tap/hold discrimination and layer activation,
//! yielding an ordered sequence of [`reaction::ReactionCmd`]s.
//!
//! The crate holds no platform code. Switch scanning, the inter-half link
//! and the USB HID devices live behind the caller's seams; everything here
//! is driven by explicit millisecond timestamps.

use core::fmt;

pub mod half;
pub mod key_code;
pub mod key_group;
pub mod layout;
pub mod reaction;

/// Milliseconds from an arbitrary monotonic origin.
pub type TimeMs = u32;

/// Monotonic millisecond clock seam.
pub trait Clock {
    fn now_ms(&self) -> TimeMs;
}

/// One switch of one keyboard half. Ids must stay below 32 so a half's
/// pressed set fits a [`SwitchSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PhysicalKey(pub u8);

/// One logical key, possibly produced by a chord of physical switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VirtualKey(pub u16);

impl VirtualKey {
    /// Sentinel serial; names the default layer in configuration tables and
    /// never occurs in the event stream.
    pub const NO_KEY: VirtualKey = VirtualKey(0);
}

/// Press or release of a virtual key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VKeyEvent {
    pub vkey: VirtualKey,
    pub pressed: bool,
}

impl VKeyEvent {
    pub fn press(vkey: VirtualKey) -> Self {
        Self { vkey, pressed: true }
    }

    pub fn release(vkey: VirtualKey) -> Self {
        Self { vkey, pressed: false }
    }
}

/// Set of pressed switches of one half, as a bitmask over switch ids.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchSet(u32);

impl SwitchSet {
    pub const EMPTY: SwitchSet = SwitchSet(0);

    pub fn single(key: PhysicalKey) -> SwitchSet {
        let mut set = SwitchSet::EMPTY;
        set.insert(key);
        set
    }

    /// Ids outside the 32-switch range are silently dropped; constructors
    /// that care reject them beforehand.
    pub fn insert(&mut self, key: PhysicalKey) {
        if key.0 < 32 {
            self.0 |= 1 << key.0;
        }
    }

    pub fn remove(&mut self, key: PhysicalKey) {
        if key.0 < 32 {
            self.0 &= !(1 << key.0);
        }
    }

    pub fn contains(self, key: PhysicalKey) -> bool {
        key.0 < 32 && self.0 & (1 << key.0) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_subset(self, other: SwitchSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_disjoint(self, other: SwitchSet) -> bool {
        self.0 & other.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = PhysicalKey> {
        (0..32u8)
            .filter(move |i| self.0 & (1 << i) != 0)
            .map(PhysicalKey)
    }
}

impl core::ops::BitAnd for SwitchSet {
    type Output = SwitchSet;
    fn bitand(self, rhs: SwitchSet) -> SwitchSet {
        SwitchSet(self.0 & rhs.0)
    }
}

impl core::ops::BitOr for SwitchSet {
    type Output = SwitchSet;
    fn bitor(self, rhs: SwitchSet) -> SwitchSet {
        SwitchSet(self.0 | rhs.0)
    }
}

impl core::ops::BitOrAssign for SwitchSet {
    fn bitor_assign(&mut self, rhs: SwitchSet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<PhysicalKey> for SwitchSet {
    fn from_iter<I: IntoIterator<Item = PhysicalKey>>(iter: I) -> Self {
        let mut set = SwitchSet::EMPTY;
        for key in iter {
            set.insert(key);
        }
        set
    }
}

impl fmt::Debug for SwitchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|k| k.0)).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn switch_set_ops() {
        let mut set = SwitchSet::EMPTY;
        assert!(set.is_empty());
        set.insert(PhysicalKey(3));
        set.insert(PhysicalKey(7));
        assert_eq!(set.len(), 2);
        assert!(set.contains(PhysicalKey(3)));
        assert!(!set.contains(PhysicalKey(4)));
        assert!(SwitchSet::single(PhysicalKey(3)).is_subset(set));
        assert!(!set.is_subset(SwitchSet::single(PhysicalKey(3))));
        set.remove(PhysicalKey(3));
        assert_eq!(set, SwitchSet::single(PhysicalKey(7)));
    }

    #[test]
    fn switch_set_ignores_out_of_range_ids() {
        let mut set = SwitchSet::EMPTY;
        set.insert(PhysicalKey(200));
        assert!(set.is_empty());
        assert!(!set.contains(PhysicalKey(200)));
    }
}
