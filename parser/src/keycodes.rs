//! Reaction-name tables for the German host layout the hardware ships
//! with: the name in a layer cell resolves to a usage id plus the shift or
//! AltGr wrapping needed to produce it on a de-DE host.

use chorda_core::key_code::KeyCode;
use rustc_hash::FxHashMap;

/// How one reaction name reaches the host: a key code, possibly wrapped in
/// shift or AltGr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionDef {
    pub code: KeyCode,
    pub shift: bool,
    pub altgr: bool,
}

impl ReactionDef {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            shift: false,
            altgr: false,
        }
    }
}

/// (code, unshifted name, shifted name). An empty shifted name means the
/// shifted position has no name of its own.
const NAME_ROWS: &[(KeyCode, &str, &str)] = &[
    (KeyCode::Escape, "Esc", ""),
    (KeyCode::F1, "F1", ""),
    (KeyCode::F2, "F2", ""),
    (KeyCode::F3, "F3", ""),
    (KeyCode::F4, "F4", ""),
    (KeyCode::F5, "F5", ""),
    (KeyCode::F6, "F6", ""),
    (KeyCode::F7, "F7", ""),
    (KeyCode::F8, "F8", ""),
    (KeyCode::F9, "F9", ""),
    (KeyCode::F10, "F10", ""),
    (KeyCode::F11, "F11", ""),
    (KeyCode::F12, "F12", ""),
    (KeyCode::Grave, "^", "°"),
    (KeyCode::Kb1, "1", "!"),
    (KeyCode::Kb2, "2", "\""),
    (KeyCode::Kb3, "3", "§"),
    (KeyCode::Kb4, "4", "$"),
    (KeyCode::Kb5, "5", "%"),
    (KeyCode::Kb6, "6", "&"),
    (KeyCode::Kb7, "7", "/"),
    (KeyCode::Kb8, "8", "("),
    (KeyCode::Kb9, "9", ")"),
    (KeyCode::Kb0, "0", "="),
    (KeyCode::Minus, "ß", "?"),
    (KeyCode::Equal, "´", "`"),
    (KeyCode::BSpace, "Backspace", ""),
    (KeyCode::Tab, "Tab", "BackTab"),
    (KeyCode::LBracket, "ü", "Ü"),
    (KeyCode::RBracket, "+", "*"),
    (KeyCode::Enter, "Enter", ""),
    (KeyCode::CapsLock, "CapsLock", ""),
    (KeyCode::SColon, "ö", "Ö"),
    (KeyCode::Quote, "ä", "Ä"),
    (KeyCode::NonUsHash, "#", "'"),
    (KeyCode::NonUsBslash, "<", ">"),
    (KeyCode::Comma, ",", ";"),
    (KeyCode::Dot, ".", ":"),
    (KeyCode::Slash, "-", "_"),
    (KeyCode::Space, "Space", ""),
    (KeyCode::Application, "Menu", ""),
    (KeyCode::Insert, "Insert", ""),
    (KeyCode::Home, "Home", ""),
    (KeyCode::PgUp, "PageUp", ""),
    (KeyCode::Delete, "Del", ""),
    (KeyCode::End, "End", ""),
    (KeyCode::PgDown, "PageDown", ""),
    (KeyCode::Up, "Up", ""),
    (KeyCode::Left, "Left", ""),
    (KeyCode::Down, "Down", ""),
    (KeyCode::Right, "Right", ""),
    (KeyCode::NumLock, "KpNumLock", ""),
    (KeyCode::KpSlash, "Kp/", ""),
    (KeyCode::KpAsterisk, "Kp*", ""),
    (KeyCode::KpMinus, "Kp-", ""),
    (KeyCode::KpPlus, "Kp+", ""),
    (KeyCode::KpEnter, "KpEnter", ""),
    (KeyCode::Kp1, "Kp1", ""),
    (KeyCode::Kp2, "Kp2", ""),
    (KeyCode::Kp3, "Kp3", ""),
    (KeyCode::Kp4, "Kp4", ""),
    (KeyCode::Kp5, "Kp5", ""),
    (KeyCode::Kp6, "Kp6", ""),
    (KeyCode::Kp7, "Kp7", ""),
    (KeyCode::Kp8, "Kp8", ""),
    (KeyCode::Kp9, "Kp9", ""),
    (KeyCode::Kp0, "Kp0", "KpInsert"),
    (KeyCode::KpDot, "Kp.", "KpDel"),
];

/// Names reached through AltGr on the German layout.
const ALTGR_ROWS: &[(KeyCode, &str)] = &[
    (KeyCode::Kb7, "{"),
    (KeyCode::Kb8, "["),
    (KeyCode::Kb9, "]"),
    (KeyCode::Kb0, "}"),
    (KeyCode::Minus, "\\"),
    (KeyCode::RBracket, "~"),
    (KeyCode::NonUsBslash, "|"),
    (KeyCode::Q, "@"),
];

const LETTER_CODES: [KeyCode; 26] = [
    KeyCode::A,
    KeyCode::B,
    KeyCode::C,
    KeyCode::D,
    KeyCode::E,
    KeyCode::F,
    KeyCode::G,
    KeyCode::H,
    KeyCode::I,
    KeyCode::J,
    KeyCode::K,
    KeyCode::L,
    KeyCode::M,
    KeyCode::N,
    KeyCode::O,
    KeyCode::P,
    KeyCode::Q,
    KeyCode::R,
    KeyCode::S,
    KeyCode::T,
    KeyCode::U,
    KeyCode::V,
    KeyCode::W,
    KeyCode::X,
    KeyCode::Y,
    KeyCode::Z,
];

const MODIFIER_NAMES: &[(&str, KeyCode)] = &[
    ("LShift", KeyCode::LShift),
    ("LCtrl", KeyCode::LCtrl),
    ("LAlt", KeyCode::LAlt),
    ("LGui", KeyCode::LGui),
    ("RShift", KeyCode::RShift),
    ("RCtrl", KeyCode::RCtrl),
    ("RAlt", KeyCode::RAlt),
    ("RGui", KeyCode::RGui),
];

/// Reaction name -> key code with wrapping. Letter entries carry the de-DE
/// y/z swap: typing the name `z` presses the host's Y key.
pub fn reaction_table() -> FxHashMap<String, ReactionDef> {
    let mut table: FxHashMap<String, ReactionDef> = FxHashMap::default();

    for &(code, plain, shifted) in NAME_ROWS {
        table.insert(plain.to_string(), ReactionDef::plain(code));
        if !shifted.is_empty() {
            table.insert(
                shifted.to_string(),
                ReactionDef {
                    code,
                    shift: true,
                    altgr: false,
                },
            );
        }
    }

    for &(code, name) in ALTGR_ROWS {
        table.insert(
            name.to_string(),
            ReactionDef {
                code,
                shift: false,
                altgr: true,
            },
        );
    }

    for (i, &code) in LETTER_CODES.iter().enumerate() {
        let en = (b'a' + i as u8) as char;
        let de = match en {
            'y' => 'z',
            'z' => 'y',
            other => other,
        };
        table.insert(de.to_string(), ReactionDef::plain(code));
        table.insert(
            de.to_uppercase().to_string(),
            ReactionDef {
                code,
                shift: true,
                altgr: false,
            },
        );
    }

    for &(name, code) in MODIFIER_NAMES {
        table.insert(name.to_string(), ReactionDef::plain(code));
    }

    table
}

/// Key code -> unshifted name, for rendering diagnostics.
pub fn key_name_table() -> FxHashMap<KeyCode, String> {
    let mut names: FxHashMap<KeyCode, String> = FxHashMap::default();
    for (name, def) in reaction_table() {
        if !def.shift && !def.altgr {
            names.entry(def.code).or_insert(name);
        }
    }
    names
}

pub fn modifier_code(name: &str) -> Option<KeyCode> {
    MODIFIER_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, code)| code)
}
