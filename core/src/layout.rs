//! Tap/hold and layer management over the virtual key stream.
//!
//! The virtual keyboard consumes time-stamped virtual key events and yields
//! reaction commands under the permissive-hold discipline: a dual-role key
//! settles on its hold meaning either when its deadline passes or when a
//! younger simple key is released underneath it, and settles on its tap
//! meaning when it is itself released first. Simple keys pressed while any
//! dual-role decision is open are deferred, so no reaction ever overtakes
//! an older undecided key.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::key_code::KeyCode;
use crate::reaction::{push_cmd, push_cmds, OneKeyReactions, ReactionCmd, ReactionQueue};
use crate::{TimeMs, VKeyEvent, VirtualKey};

/// Hold deadline of dual-role keys in milliseconds.
pub const TAP_HOLD_TERM: TimeMs = 200;

/// Bound on simultaneously open tap/hold decisions and deferred presses.
const PENDING_CAP: usize = 32;

pub type LayerId = usize;

/// Index of the default layer in every layer arena.
pub const DEFAULT_LAYER: LayerId = 0;

/// Reactions of one layer; serials absent from the map react to nothing.
pub type Layer = FxHashMap<VirtualKey, OneKeyReactions>;

/// What a virtual key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Layer-defined reactions on press and release.
    Simple,
    /// Tap: layer-defined reactions. Hold: a modifier key.
    Mod { code: KeyCode },
    /// Tap: layer-defined reactions. Hold: activate a layer.
    Layer { layer: LayerId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Inactive,
    /// Dual-role key down, tap/hold not yet decided.
    Undecided,
    /// Dual-role key acting as its hold meaning.
    Holding,
    /// Simple key down behind an open tap/hold decision.
    Deferred,
    /// Simple key whose press reaction has been emitted.
    Committed,
}

#[derive(Debug, Clone, Copy)]
struct KeyState {
    role: KeyRole,
    phase: Phase,
    last_press: TimeMs,
}

type PendingList = heapless::Vec<VirtualKey, PENDING_CAP>;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    #[error("virtual key {0:?} is defined twice")]
    DuplicateKey(VirtualKey),
    #[error("virtual key {0:?} activates layer {1} but only {2} layers exist")]
    LayerOutOfRange(VirtualKey, LayerId, usize),
    #[error("a keyboard needs at least the default layer")]
    NoLayers,
}

/// The tap/hold and layer state machine.
#[derive(Debug)]
pub struct VirtualKeyboard {
    keys: FxHashMap<VirtualKey, KeyState>,
    layers: Vec<Layer>,
    cur_layer: LayerId,
    tap_hold_term: TimeMs,
    /// Open tap/hold decisions, in press order.
    undecided: PendingList,
    /// Deferred simple presses, in press order.
    deferred: PendingList,
    next_decision: Option<TimeMs>,
}

impl VirtualKeyboard {
    /// `layers[0]` is the default layer; `KeyRole::Layer` indices refer
    /// into the same arena.
    pub fn new(
        keys: impl IntoIterator<Item = (VirtualKey, KeyRole)>,
        layers: Vec<Layer>,
    ) -> Result<Self, LayoutError> {
        if layers.is_empty() {
            return Err(LayoutError::NoLayers);
        }
        let layer_count = layers.len();
        let mut map: FxHashMap<VirtualKey, KeyState> = FxHashMap::default();
        for (vkey, role) in keys {
            if let KeyRole::Layer { layer } = role {
                if layer >= layer_count {
                    return Err(LayoutError::LayerOutOfRange(vkey, layer, layer_count));
                }
            }
            let state = KeyState {
                role,
                phase: Phase::Inactive,
                last_press: 0,
            };
            if map.insert(vkey, state).is_some() {
                return Err(LayoutError::DuplicateKey(vkey));
            }
        }
        Ok(Self {
            keys: map,
            layers,
            cur_layer: DEFAULT_LAYER,
            tap_hold_term: TAP_HOLD_TERM,
            undecided: PendingList::new(),
            deferred: PendingList::new(),
            next_decision: None,
        })
    }

    pub fn with_tap_hold_term(mut self, term: TimeMs) -> Self {
        self.tap_hold_term = term;
        self
    }

    pub fn current_layer(&self) -> LayerId {
        self.cur_layer
    }

    /// Earliest instant at which an open tap/hold decision matures. The
    /// super-loop may sleep until then when no events are pending.
    pub fn next_decision_time(&self) -> Option<TimeMs> {
        self.next_decision
    }

    /// Advance to `now`, consume `events` in order, and append the
    /// resulting reaction commands to `out`.
    pub fn update(&mut self, now: TimeMs, events: &[VKeyEvent], out: &mut ReactionQueue) {
        if events.is_empty() && self.next_decision.map_or(true, |t| t > now) {
            return;
        }

        self.update_by_time(now, out);
        for &ev in events {
            self.update_event(now, ev, out);
        }

        self.next_decision = self
            .undecided
            .iter()
            .filter_map(|vk| self.keys.get(vk))
            .map(|k| k.last_press.wrapping_add(self.tap_hold_term))
            .min();
    }

    /// Deadline-driven transitions: undecided dual-role keys whose term has
    /// passed become holds, which in turn commits every simple key deferred
    /// behind the oldest promoted press.
    fn update_by_time(&mut self, now: TimeMs, out: &mut ReactionQueue) {
        let mut oldest_promoted: Option<TimeMs> = None;
        let mut i = 0;
        while i < self.undecided.len() {
            let vkey = self.undecided[i];
            let Some(state) = self.keys.get(&vkey).copied() else {
                remove_at(&mut self.undecided, i);
                continue;
            };
            if now.wrapping_sub(state.last_press) >= self.tap_hold_term {
                self.begin_hold(vkey, out);
                oldest_promoted =
                    Some(oldest_promoted.map_or(state.last_press, |t| t.min(state.last_press)));
                remove_at(&mut self.undecided, i);
            } else {
                i += 1;
            }
        }
        if let Some(t_min) = oldest_promoted {
            self.commit_deferred_newer_than(t_min, None, out);
        }
    }

    fn update_event(&mut self, now: TimeMs, ev: VKeyEvent, out: &mut ReactionQueue) {
        let Some(state) = self.keys.get(&ev.vkey).copied() else {
            log::debug!("event for unknown virtual key {:?}", ev.vkey);
            return;
        };
        match (state.role, ev.pressed) {
            (KeyRole::Simple, true) => self.press_simple(now, ev.vkey, out),
            (KeyRole::Simple, false) => self.release_simple(ev.vkey, out),
            (_, true) => self.press_tap_hold(now, ev.vkey),
            (_, false) => self.release_tap_hold(ev.vkey, out),
        }
    }

    /// dual-role: inactive -> undecided. No output yet.
    fn press_tap_hold(&mut self, now: TimeMs, vkey: VirtualKey) {
        let Some(state) = self.keys.get(&vkey) else {
            return;
        };
        if state.phase != Phase::Inactive {
            log::debug!("press of already active {vkey:?} ignored");
            return;
        }
        if self.undecided.push(vkey).is_err() {
            log::warn!("undecided list full, ignoring press of {vkey:?}");
            return;
        }
        if let Some(state) = self.keys.get_mut(&vkey) {
            state.phase = Phase::Undecided;
            state.last_press = now;
        }
    }

    /// dual-role: undecided -> tap (press and release back to back, then
    /// the decision is closed and younger deferred simples commit), or
    /// holding -> inactive.
    fn release_tap_hold(&mut self, vkey: VirtualKey, out: &mut ReactionQueue) {
        let Some(state) = self.keys.get(&vkey).copied() else {
            return;
        };
        match state.phase {
            Phase::Undecided => {
                self.emit_on_press(vkey, out);
                self.emit_on_release(vkey, out);
                remove_key(&mut self.undecided, vkey);
                if let Some(k) = self.keys.get_mut(&vkey) {
                    k.phase = Phase::Inactive;
                }
                self.commit_deferred_newer_than(state.last_press, None, out);
            }
            Phase::Holding => self.end_hold(vkey, out),
            _ => log::debug!("release of inactive {vkey:?} ignored"),
        }
    }

    /// simple: inactive -> committed, or deferred while any tap/hold
    /// decision is open.
    fn press_simple(&mut self, now: TimeMs, vkey: VirtualKey, out: &mut ReactionQueue) {
        let Some(state) = self.keys.get(&vkey) else {
            return;
        };
        if state.phase != Phase::Inactive {
            log::debug!("press of already active {vkey:?} ignored");
            return;
        }
        if !self.undecided.is_empty() {
            if self.deferred.push(vkey).is_err() {
                log::warn!("deferred list full, ignoring press of {vkey:?}");
                return;
            }
            if let Some(k) = self.keys.get_mut(&vkey) {
                k.phase = Phase::Deferred;
                k.last_press = now;
            }
        } else {
            if let Some(k) = self.keys.get_mut(&vkey) {
                k.phase = Phase::Committed;
                k.last_press = now;
            }
            self.emit_on_press(vkey, out);
        }
    }

    /// simple release; the permissive-hold rule lives here.
    fn release_simple(&mut self, vkey: VirtualKey, out: &mut ReactionQueue) {
        let Some(state) = self.keys.get(&vkey).copied() else {
            return;
        };
        if !matches!(state.phase, Phase::Deferred | Phase::Committed) {
            log::debug!("release of {vkey:?} without a matching press ignored");
            return;
        }

        // Releasing a simple key underneath older undecided dual-role keys
        // decides all of them as holds.
        let mut oldest_promoted: Option<TimeMs> = None;
        let mut i = 0;
        while i < self.undecided.len() {
            let u = self.undecided[i];
            let Some(us) = self.keys.get(&u).copied() else {
                remove_at(&mut self.undecided, i);
                continue;
            };
            if us.last_press < state.last_press {
                self.begin_hold(u, out);
                oldest_promoted =
                    Some(oldest_promoted.map_or(us.last_press, |t| t.min(us.last_press)));
                remove_at(&mut self.undecided, i);
            } else {
                i += 1;
            }
        }

        // The decision is made; deferred simples younger than the oldest
        // promoted press commit now, except the one being released.
        if let Some(t_min) = oldest_promoted {
            self.commit_deferred_newer_than(t_min, Some(vkey), out);
        }

        if state.phase == Phase::Deferred {
            // A deferred tap: its press was never emitted, so press and
            // release go out together.
            self.emit_on_press(vkey, out);
            self.emit_on_release(vkey, out);
            remove_key(&mut self.deferred, vkey);
        } else {
            self.emit_on_release(vkey, out);
        }
        if let Some(k) = self.keys.get_mut(&vkey) {
            k.phase = Phase::Inactive;
        }
    }

    /// simple: deferred -> committed for every deferred key pressed after
    /// `t_min`.
    fn commit_deferred_newer_than(
        &mut self,
        t_min: TimeMs,
        skip: Option<VirtualKey>,
        out: &mut ReactionQueue,
    ) {
        let mut i = 0;
        while i < self.deferred.len() {
            let vkey = self.deferred[i];
            if Some(vkey) == skip {
                i += 1;
                continue;
            }
            let newer = self
                .keys
                .get(&vkey)
                .map_or(false, |k| k.last_press > t_min);
            if newer {
                self.emit_on_press(vkey, out);
                if let Some(k) = self.keys.get_mut(&vkey) {
                    k.phase = Phase::Committed;
                }
                remove_at(&mut self.deferred, i);
            } else {
                i += 1;
            }
        }
    }

    /// Hold meaning of a dual-role key: modifiers press their key code,
    /// layer keys switch the active layer without emitting anything.
    fn begin_hold(&mut self, vkey: VirtualKey, out: &mut ReactionQueue) {
        let Some(state) = self.keys.get_mut(&vkey) else {
            return;
        };
        state.phase = Phase::Holding;
        match state.role {
            KeyRole::Mod { code } => push_cmd(out, ReactionCmd::press(code)),
            KeyRole::Layer { layer } => self.cur_layer = layer,
            KeyRole::Simple => {}
        }
    }

    fn end_hold(&mut self, vkey: VirtualKey, out: &mut ReactionQueue) {
        let Some(state) = self.keys.get_mut(&vkey) else {
            return;
        };
        state.phase = Phase::Inactive;
        match state.role {
            KeyRole::Mod { code } => push_cmd(out, ReactionCmd::release(code)),
            KeyRole::Layer { .. } => self.cur_layer = DEFAULT_LAYER,
            KeyRole::Simple => {}
        }
    }

    // The layer is sampled when a reaction is emitted, not when its key was
    // pressed: a deferred press resolved after a layer switch draws from
    // the layer active at resolution time.
    fn emit_on_press(&self, vkey: VirtualKey, out: &mut ReactionQueue) {
        if let Some(reactions) = self.layers[self.cur_layer].get(&vkey) {
            push_cmds(out, &reactions.on_press);
        }
    }

    fn emit_on_release(&self, vkey: VirtualKey, out: &mut ReactionQueue) {
        if let Some(reactions) = self.layers[self.cur_layer].get(&vkey) {
            push_cmds(out, &reactions.on_release);
        }
    }
}

/// Ordered removal; the pending lists are short enough that shifting beats
/// any cleverness.
fn remove_at(list: &mut PendingList, idx: usize) {
    let len = list.len();
    for j in idx..len.saturating_sub(1) {
        list[j] = list[j + 1];
    }
    list.pop();
}

fn remove_key(list: &mut PendingList, vkey: VirtualKey) {
    if let Some(i) = list.iter().position(|&v| v == vkey) {
        remove_at(list, i);
    }
}
