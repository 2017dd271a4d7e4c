//! Per-finger combo resolution.
//!
//! A key group owns the physical switches of one finger and condenses the
//! evolving pressed set into exactly one virtual key press followed by
//! exactly one matching release. Switches going down within the combo
//! window of the first press are eligible to merge into a chord, which
//! absorbs the mechanical skew between the down-edges of one deliberate
//! multi-switch stroke. A group commits to a virtual key when the window
//! closes or when a pending switch comes back up, and releases it only once
//! every switch of the committed chord is up again.

use heapless::Vec;
use thiserror::Error;

use crate::{PhysicalKey, SwitchSet, TimeMs, VKeyEvent, VirtualKey};

/// Default width of the combo window in milliseconds.
pub const COMBO_TERM: TimeMs = 50;

/// Chord capacity of one group; the shipped keymap needs at most six.
pub const MAX_CHORDS: usize = 8;

/// Event buffer for one group in one tick.
pub type GroupEvents = Vec<VKeyEvent, 8>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum GroupError {
    #[error("switch id {0} does not fit the per-half switch set (ids must be < 32)")]
    SwitchOutOfRange(u8),
    #[error("chord for virtual key {0:?} names no switches")]
    EmptyChord(VirtualKey),
    #[error("virtual keys {0:?} and {1:?} share one switch set within a group")]
    DuplicateSwitchSet(VirtualKey, VirtualKey),
    #[error("group {0} defines more than {MAX_CHORDS} chords")]
    TooManyChords(u8),
    #[error("groups {0} and {1} own overlapping switches")]
    OverlappingGroups(u8, u8),
    #[error("more groups than one half supports")]
    TooManyGroups,
}

#[derive(Debug, Clone, Copy)]
struct ChordDef {
    vkey: VirtualKey,
    switches: SwitchSet,
}

/// One finger's combo resolver.
#[derive(Debug)]
pub struct KeyGroup {
    id: u8,
    chords: Vec<ChordDef, MAX_CHORDS>,
    mask: SwitchSet,
    combo_term: TimeMs,
    pending: SwitchSet,
    pending_since: Option<TimeMs>,
    committed: Option<ChordDef>,
}

impl KeyGroup {
    pub fn new(id: u8, defs: &[(VirtualKey, &[PhysicalKey])]) -> Result<Self, GroupError> {
        let mut chords: Vec<ChordDef, MAX_CHORDS> = Vec::new();
        let mut mask = SwitchSet::EMPTY;
        for &(vkey, switches) in defs {
            if switches.is_empty() {
                return Err(GroupError::EmptyChord(vkey));
            }
            let mut set = SwitchSet::EMPTY;
            for &pk in switches {
                if pk.0 >= 32 {
                    return Err(GroupError::SwitchOutOfRange(pk.0));
                }
                set.insert(pk);
            }
            if let Some(dup) = chords.iter().find(|c| c.switches == set) {
                return Err(GroupError::DuplicateSwitchSet(dup.vkey, vkey));
            }
            mask |= set;
            chords
                .push(ChordDef {
                    vkey,
                    switches: set,
                })
                .map_err(|_| GroupError::TooManyChords(id))?;
        }
        Ok(Self {
            id,
            chords,
            mask,
            combo_term: COMBO_TERM,
            pending: SwitchSet::EMPTY,
            pending_since: None,
            committed: None,
        })
    }

    pub fn with_combo_term(mut self, term: TimeMs) -> Self {
        self.combo_term = term;
        self
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Union of all switches this group owns.
    pub fn mask(&self) -> SwitchSet {
        self.mask
    }

    /// Feed one snapshot of this group's slice of the pressed switches.
    pub fn update(&mut self, now: TimeMs, pressed: SwitchSet, out: &mut GroupEvents) {
        let pressed = pressed & self.mask;

        if let Some(chord) = self.committed {
            if !(pressed & chord.switches).is_empty() {
                // Still holding; switches outside the chord stay invisible
                // until the committed key is released.
                return;
            }
            push_event(out, VKeyEvent::release(chord.vkey));
            self.committed = None;
        }

        // Resolve the window as it stood before this tick's presses join:
        // a switch landing on the deadline tick must not widen the chord
        // retroactively.
        if let Some(since) = self.pending_since {
            let expired = now.wrapping_sub(since) >= self.combo_term;
            let shrunk = !self.pending.is_subset(pressed);
            if expired || shrunk {
                self.resolve(pressed, out);
            }
        }

        if self.committed.is_none() && self.pending_since.is_none() {
            if !pressed.is_empty() {
                self.pending = pressed;
                self.pending_since = Some(now);
            }
        } else if self.pending_since.is_some() {
            self.pending |= pressed;
        }
    }

    /// Commit the best chord for the open window. Candidates are the
    /// pending switches still pressed, or the whole pending set when all
    /// are already up (a tap of the full chord).
    fn resolve(&mut self, pressed: SwitchSet, out: &mut GroupEvents) {
        let live = self.pending & pressed;
        let candidate = if live.is_empty() { self.pending } else { live };
        self.pending = SwitchSet::EMPTY;
        self.pending_since = None;

        let mut best: Option<ChordDef> = None;
        for c in self.chords.iter() {
            if !c.switches.is_subset(candidate) {
                continue;
            }
            // Larger chords win; among equal sizes the first definition
            // wins (identical sets are rejected at construction).
            if best.map_or(true, |b| c.switches.len() > b.switches.len()) {
                best = Some(*c);
            }
        }
        let Some(chord) = best else {
            log::debug!("group {}: no chord matches {:?}", self.id, candidate);
            return;
        };

        push_event(out, VKeyEvent::press(chord.vkey));
        if (pressed & chord.switches).is_empty() {
            // The whole chord was already released; its tap completes in
            // this same tick.
            push_event(out, VKeyEvent::release(chord.vkey));
        } else {
            self.committed = Some(chord);
        }
    }
}

fn push_event(out: &mut GroupEvents, ev: VKeyEvent) {
    if out.push(ev).is_err() {
        log::warn!("virtual key event buffer full, dropping {ev:?}");
    }
}
