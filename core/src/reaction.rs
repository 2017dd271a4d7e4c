//! Reaction commands: the atomic host-side instructions the interpreter
//! emits, and the per-key press/release recipes stored in layer tables.

use crate::key_code::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCmdKind {
    Press,
    Release,
    /// Press and release in one report cycle; used where a pair would be
    /// redundant, e.g. typed-out diagnostics.
    Send,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButtonCmdKind {
    Press,
    Release,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionCmd {
    Key {
        kind: KeyCmdKind,
        code: KeyCode,
    },
    MouseButton {
        button: MouseButton,
        kind: MouseButtonCmdKind,
    },
    MouseWheel {
        offset: i8,
    },
    /// Dump the recent-event ring through the host keyboard.
    Log,
}

impl ReactionCmd {
    pub const fn press(code: KeyCode) -> Self {
        ReactionCmd::Key {
            kind: KeyCmdKind::Press,
            code,
        }
    }

    pub const fn release(code: KeyCode) -> Self {
        ReactionCmd::Key {
            kind: KeyCmdKind::Release,
            code,
        }
    }

    pub const fn send(code: KeyCode) -> Self {
        ReactionCmd::Key {
            kind: KeyCmdKind::Send,
            code,
        }
    }
}

/// The two reaction sequences of one layer cell. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OneKeyReactions {
    pub on_press: Vec<ReactionCmd>,
    pub on_release: Vec<ReactionCmd>,
}

impl OneKeyReactions {
    pub fn new(on_press: Vec<ReactionCmd>, on_release: Vec<ReactionCmd>) -> Self {
        Self {
            on_press,
            on_release,
        }
    }

    /// Plain key: press on press, release on release.
    pub fn key_pair(code: KeyCode) -> Self {
        Self {
            on_press: vec![ReactionCmd::press(code)],
            on_release: vec![ReactionCmd::release(code)],
        }
    }
}

/// Per-tick output buffer. Sized for the worst burst a tick can produce;
/// overflow drops commands rather than reordering or panicking.
pub const REACTION_QUEUE_CAP: usize = 64;

pub type ReactionQueue = heapless::Vec<ReactionCmd, REACTION_QUEUE_CAP>;

pub(crate) fn push_cmd(out: &mut ReactionQueue, cmd: ReactionCmd) {
    if out.push(cmd).is_err() {
        log::warn!("reaction queue full, dropping {cmd:?}");
    }
}

pub(crate) fn push_cmds(out: &mut ReactionQueue, cmds: &[ReactionCmd]) {
    for &cmd in cmds {
        push_cmd(out, cmd);
    }
}
