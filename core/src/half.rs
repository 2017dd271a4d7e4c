//! Fan-out of one half's switch snapshot over its finger groups.

use heapless::Vec;

use crate::key_group::{GroupError, GroupEvents, KeyGroup};
use crate::{SwitchSet, TimeMs, VKeyEvent};

/// Groups per half; one per finger.
pub const MAX_GROUPS: usize = 8;

/// Event buffer for one half in one tick.
pub type HalfEvents = Vec<VKeyEvent, 16>;

/// Orders the finger groups of one keyboard half and concatenates their
/// outputs. Group switch ownership is disjoint; the resolver itself holds
/// no timing state.
#[derive(Debug)]
pub struct HalfResolver {
    groups: Vec<KeyGroup, MAX_GROUPS>,
}

impl HalfResolver {
    pub fn new(groups: impl IntoIterator<Item = KeyGroup>) -> Result<Self, GroupError> {
        let mut owned: Vec<KeyGroup, MAX_GROUPS> = Vec::new();
        for group in groups {
            if let Some(other) = owned.iter().find(|g| !g.mask().is_disjoint(group.mask())) {
                return Err(GroupError::OverlappingGroups(other.id(), group.id()));
            }
            owned.push(group).map_err(|_| GroupError::TooManyGroups)?;
        }
        Ok(Self { groups: owned })
    }

    /// Slice the snapshot by group mask and forward each slice, merging the
    /// outputs in group order.
    pub fn update(&mut self, now: TimeMs, pressed: SwitchSet, out: &mut HalfEvents) {
        let mut buf = GroupEvents::new();
        for group in self.groups.iter_mut() {
            buf.clear();
            group.update(now, pressed & group.mask(), &mut buf);
            for &ev in buf.iter() {
                if out.push(ev).is_err() {
                    log::warn!("half event buffer full, dropping {ev:?}");
                }
            }
        }
    }
}
