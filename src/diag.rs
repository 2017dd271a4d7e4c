//! On-device diagnostics: a short ring of eventful ticks that the `Log`
//! reaction types out through the host keyboard.

use std::collections::VecDeque;
use std::fmt::Write;

use chorda_core::key_code::KeyCode;
use chorda_core::reaction::{KeyCmdKind, ReactionCmd};
use chorda_core::{TimeMs, VKeyEvent};
use chorda_parser::keycodes::{key_name_table, reaction_table, ReactionDef};
use rustc_hash::FxHashMap;

use crate::keymap::vkey_name;

/// Ticks kept for a dump.
const RING_CAP: usize = 7;

#[derive(Debug, Clone)]
pub struct DiagEntry {
    pub time: TimeMs,
    pub remote: Vec<VKeyEvent>,
    pub local: Vec<VKeyEvent>,
    pub reactions: Vec<ReactionCmd>,
}

/// Ring of the most recent eventful ticks.
#[derive(Debug, Default)]
pub struct DiagRing {
    entries: VecDeque<DiagEntry>,
}

impl DiagRing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: DiagEntry) {
        if self.entries.len() == RING_CAP {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// All but the newest `skip` entries, oldest first. A dump skips the
    /// ticks produced by pressing the log key itself.
    pub fn entries_except_newest(&self, skip: usize) -> impl Iterator<Item = &DiagEntry> {
        let keep = self.entries.len().saturating_sub(skip);
        self.entries.iter().take(keep)
    }
}

/// Renders diagnostic entries as one line per tick, e.g.
/// `1203: other=[+rtu], self=[-li1d] -> [+a, -a]`.
pub struct DiagDumper {
    key_names: FxHashMap<KeyCode, String>,
}

impl DiagDumper {
    pub fn new() -> Self {
        Self {
            key_names: key_name_table(),
        }
    }

    pub fn dump<'a>(&self, entries: impl Iterator<Item = &'a DiagEntry>) -> String {
        let mut text = String::from("\n");
        for entry in entries {
            self.dump_entry(&mut text, entry);
            text.push('\n');
        }
        text
    }

    fn dump_entry(&self, text: &mut String, entry: &DiagEntry) {
        let _ = write!(text, "{}: ", entry.time);
        let mut parts: Vec<String> = Vec::new();
        if !entry.remote.is_empty() {
            parts.push(format!("other={}", vkey_events_str(&entry.remote)));
        }
        if !entry.local.is_empty() {
            parts.push(format!("self={}", vkey_events_str(&entry.local)));
        }
        text.push_str(&parts.join(", "));
        if !entry.reactions.is_empty() {
            let reactions: Vec<String> = entry
                .reactions
                .iter()
                .filter_map(|cmd| self.reaction_str(cmd))
                .collect();
            let _ = write!(text, " -> [{}]", reactions.join(", "));
        }
    }

    fn reaction_str(&self, cmd: &ReactionCmd) -> Option<String> {
        let ReactionCmd::Key { kind, code } = cmd else {
            return None;
        };
        let prefix = match kind {
            KeyCmdKind::Press => '+',
            KeyCmdKind::Release => '-',
            KeyCmdKind::Send => '*',
        };
        let name = self
            .key_names
            .get(code)
            .map(String::as_str)
            .unwrap_or("?");
        Some(format!("{prefix}{name}"))
    }
}

fn vkey_events_str(events: &[VKeyEvent]) -> String {
    let items: Vec<String> = events
        .iter()
        .map(|ev| {
            let prefix = if ev.pressed { '+' } else { '-' };
            let name = vkey_name(ev.vkey).unwrap_or("?");
            format!("{prefix}{name}")
        })
        .collect();
    format!("[{}]", items.join(", "))
}

/// Converts dump text into key commands typed on the host, using the same
/// reaction table the layers resolve against.
pub struct TextToKeys {
    table: FxHashMap<String, ReactionDef>,
}

impl TextToKeys {
    pub fn new() -> Self {
        Self {
            table: reaction_table(),
        }
    }

    pub fn convert(&self, text: &str) -> Vec<ReactionCmd> {
        let mut cmds = Vec::new();
        for ch in text.chars() {
            self.convert_char(ch, &mut cmds);
        }
        cmds
    }

    fn convert_char(&self, ch: char, cmds: &mut Vec<ReactionCmd>) {
        if ch == '\n' {
            cmds.push(ReactionCmd::send(KeyCode::Enter));
            return;
        }
        let Some(def) = self.table.get(&ch.to_string()) else {
            return; // characters without a key just drop out of the dump
        };
        if def.shift {
            cmds.push(ReactionCmd::press(KeyCode::LShift));
        }
        if def.altgr {
            cmds.push(ReactionCmd::press(KeyCode::RAlt));
        }
        cmds.push(ReactionCmd::send(def.code));
        if def.altgr {
            cmds.push(ReactionCmd::release(KeyCode::RAlt));
        }
        if def.shift {
            cmds.push(ReactionCmd::release(KeyCode::LShift));
        }
    }
}

impl Default for DiagDumper {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for TextToKeys {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keymap::{LI1D, RTU};

    #[test]
    fn dumps_an_eventful_tick() {
        let mut ring = DiagRing::new();
        ring.record(DiagEntry {
            time: 1203,
            remote: vec![VKeyEvent::press(RTU)],
            local: vec![VKeyEvent::release(LI1D)],
            reactions: vec![
                ReactionCmd::press(KeyCode::A),
                ReactionCmd::release(KeyCode::A),
            ],
        });
        let dumper = DiagDumper::new();
        let text = dumper.dump(ring.entries_except_newest(0));
        assert_eq!(text, "\n1203: other=[+rtu], self=[-li1d] -> [+a, -a]\n");
    }

    #[test]
    fn skips_the_newest_entries() {
        let mut ring = DiagRing::new();
        for t in 0..4 {
            ring.record(DiagEntry {
                time: t,
                remote: vec![],
                local: vec![VKeyEvent::press(RTU)],
                reactions: vec![],
            });
        }
        let times: Vec<TimeMs> = ring
            .entries_except_newest(2)
            .map(|e| e.time)
            .collect();
        assert_eq!(times, [0, 1]);
    }

    #[test]
    fn ring_is_bounded() {
        let mut ring = DiagRing::new();
        for t in 0..20 {
            ring.record(DiagEntry {
                time: t,
                remote: vec![],
                local: vec![],
                reactions: vec![],
            });
        }
        let times: Vec<TimeMs> = ring.entries_except_newest(0).map(|e| e.time).collect();
        assert_eq!(times, [13, 14, 15, 16, 17, 18, 19]);
    }

    #[test]
    fn text_converts_with_shift_wrapping() {
        let cmds = TextToKeys::new().convert("a?\n");
        assert_eq!(
            cmds,
            [
                ReactionCmd::send(KeyCode::A),
                ReactionCmd::press(KeyCode::LShift),
                ReactionCmd::send(KeyCode::Minus),
                ReactionCmd::release(KeyCode::LShift),
                ReactionCmd::send(KeyCode::Enter),
            ]
        );
    }
}
