//! The keymap the hardware ships with: switch wiring, finger groups, the
//! 3x12 virtual key grid and its layers.
//!
//! Physical switch ids are per half; both halves use the same wiring, with
//! the extra index column sitting towards the centre of the board. Virtual
//! key serials are global so events from the remote half drop straight into
//! the local pipeline.

use chorda_core::{PhysicalKey, VirtualKey};
use chorda_parser::cfg::GroupTable;
use chorda_parser::KeyboardBuilder;

// Switches of one half.
pub const PINKY_UP: PhysicalKey = PhysicalKey(0);
pub const PINKY_DOWN: PhysicalKey = PhysicalKey(1);
pub const RING_UP: PhysicalKey = PhysicalKey(2);
pub const RING_DOWN: PhysicalKey = PhysicalKey(3);
pub const MIDDLE_UP: PhysicalKey = PhysicalKey(4);
pub const MIDDLE_DOWN: PhysicalKey = PhysicalKey(5);
pub const INDEX_UP: PhysicalKey = PhysicalKey(6);
pub const INDEX_DOWN: PhysicalKey = PhysicalKey(7);
/// The second index column, towards the board centre.
pub const INDEX_INNER: PhysicalKey = PhysicalKey(8);
pub const THUMB_UP: PhysicalKey = PhysicalKey(9);
pub const THUMB_DOWN: PhysicalKey = PhysicalKey(10);

// Virtual key serials, left half.
pub const LPU: VirtualKey = VirtualKey(1);
pub const LPM: VirtualKey = VirtualKey(2);
pub const LPD: VirtualKey = VirtualKey(3);
pub const LRU: VirtualKey = VirtualKey(4);
pub const LRM: VirtualKey = VirtualKey(5);
pub const LRD: VirtualKey = VirtualKey(6);
pub const LMU: VirtualKey = VirtualKey(7);
pub const LMM: VirtualKey = VirtualKey(8);
pub const LMD: VirtualKey = VirtualKey(9);
pub const LI1U: VirtualKey = VirtualKey(10);
pub const LI1M: VirtualKey = VirtualKey(11);
pub const LI1D: VirtualKey = VirtualKey(12);
pub const LI2U: VirtualKey = VirtualKey(13);
pub const LI2M: VirtualKey = VirtualKey(14);
pub const LI2D: VirtualKey = VirtualKey(15);
pub const LTU: VirtualKey = VirtualKey(16);
pub const LTM: VirtualKey = VirtualKey(17);
pub const LTD: VirtualKey = VirtualKey(18);

// Virtual key serials, right half.
pub const RTU: VirtualKey = VirtualKey(19);
pub const RTM: VirtualKey = VirtualKey(20);
pub const RTD: VirtualKey = VirtualKey(21);
pub const RI2U: VirtualKey = VirtualKey(22);
pub const RI2M: VirtualKey = VirtualKey(23);
pub const RI2D: VirtualKey = VirtualKey(24);
pub const RI1U: VirtualKey = VirtualKey(25);
pub const RI1M: VirtualKey = VirtualKey(26);
pub const RI1D: VirtualKey = VirtualKey(27);
pub const RMU: VirtualKey = VirtualKey(28);
pub const RMM: VirtualKey = VirtualKey(29);
pub const RMD: VirtualKey = VirtualKey(30);
pub const RRU: VirtualKey = VirtualKey(31);
pub const RRM: VirtualKey = VirtualKey(32);
pub const RRD: VirtualKey = VirtualKey(33);
pub const RPU: VirtualKey = VirtualKey(34);
pub const RPM: VirtualKey = VirtualKey(35);
pub const RPD: VirtualKey = VirtualKey(36);

/// Finger groups of the left half, pinky outward to thumb.
pub static LEFT_KEY_GROUPS: GroupTable<'static> = &[
    (
        0,
        &[
            (LPU, &[PINKY_UP]),
            (LPM, &[PINKY_UP, PINKY_DOWN]),
            (LPD, &[PINKY_DOWN]),
        ],
    ),
    (
        1,
        &[
            (LRU, &[RING_UP]),
            (LRM, &[RING_UP, RING_DOWN]),
            (LRD, &[RING_DOWN]),
        ],
    ),
    (
        2,
        &[
            (LMU, &[MIDDLE_UP]),
            (LMM, &[MIDDLE_UP, MIDDLE_DOWN]),
            (LMD, &[MIDDLE_DOWN]),
        ],
    ),
    (
        3,
        &[
            (LI1U, &[INDEX_UP]),
            (LI1M, &[INDEX_UP, INDEX_DOWN]),
            (LI1D, &[INDEX_DOWN]),
            (LI2U, &[INDEX_UP, INDEX_INNER]),
            (LI2M, &[INDEX_INNER]),
            (LI2D, &[INDEX_DOWN, INDEX_INNER]),
        ],
    ),
    (
        4,
        &[
            (LTU, &[THUMB_UP]),
            (LTM, &[THUMB_UP, THUMB_DOWN]),
            (LTD, &[THUMB_DOWN]),
        ],
    ),
];

/// Finger groups of the right half, thumb outward to pinky.
pub static RIGHT_KEY_GROUPS: GroupTable<'static> = &[
    (
        0,
        &[
            (RTU, &[THUMB_UP]),
            (RTM, &[THUMB_UP, THUMB_DOWN]),
            (RTD, &[THUMB_DOWN]),
        ],
    ),
    (
        1,
        &[
            (RI2U, &[INDEX_UP, INDEX_INNER]),
            (RI2M, &[INDEX_INNER]),
            (RI2D, &[INDEX_DOWN, INDEX_INNER]),
            (RI1U, &[INDEX_UP]),
            (RI1M, &[INDEX_UP, INDEX_DOWN]),
            (RI1D, &[INDEX_DOWN]),
        ],
    ),
    (
        2,
        &[
            (RMU, &[MIDDLE_UP]),
            (RMM, &[MIDDLE_UP, MIDDLE_DOWN]),
            (RMD, &[MIDDLE_DOWN]),
        ],
    ),
    (
        3,
        &[
            (RRU, &[RING_UP]),
            (RRM, &[RING_UP, RING_DOWN]),
            (RRD, &[RING_DOWN]),
        ],
    ),
    (
        4,
        &[
            (RPU, &[PINKY_UP]),
            (RPM, &[PINKY_UP, PINKY_DOWN]),
            (RPD, &[PINKY_DOWN]),
        ],
    ),
];

/// Column order of the layer rows, left board edge to right board edge.
pub static VIRTUAL_KEY_ORDER: &[&[VirtualKey]] = &[
    &[LPU, LRU, LMU, LI1U, LI2U, LTU, RTU, RI2U, RI1U, RMU, RRU, RPU],
    &[LPM, LRM, LMM, LI1M, LI2M, LTM, RTM, RI2M, RI1M, RMM, RRM, RPM],
    &[LPD, LRD, LMD, LI1D, LI2D, LTD, RTD, RI2D, RI1D, RMD, RRD, RPD],
];

/// Layers keyed by their activating thumb key; the sentinel row is the
/// default layer.
pub static LAYERS: &[(VirtualKey, &[&str])] = &[
    (
        VirtualKey::NO_KEY,
        &[
            "q w e r t Space   Space      z u i o p",
            "a s d f g Del     Backspace  h j k l ö",
            "y x c v b Tab     Enter      n m , . -",
        ],
    ),
    (
        LTU,
        &[
            "· · · · · ·   · @ \" { } `",
            "· · · · · ·   · \\ / ( ) $",
            "· · · · · ·   · # ' [ ] ´",
        ],
    ),
    (
        LTD,
        &[
            "· · · · · ·   · + 7 8 9 %",
            "· · · · · ·   · - 4 5 6 ,",
            "· · · · · ·   0 · 1 2 3 .",
        ],
    ),
    (
        LTM,
        &[
            "· · · · · ·   · · MouseLeft · MouseRight ·",
            "· · · · · ·   · · ·         · ·          ·",
            "· · · · · ·   · · ·         · ·          .",
        ],
    ),
    (
        RTU,
        &[
            "· · · · · ·   · · F1 F2  F3  F4",
            "· · · · · ·   · · F5 F6  F7  F8",
            "· · · · · ·   · · F9 F10 F11 F12",
        ],
    ),
    (
        RTD,
        &[
            "/ * < ^ | ·   · · · · · ·",
            "% + ! = & ·   · · · · · ·",
            "· > l ? ~ ·   · · · · · ·",
        ],
    ),
    (
        RTM,
        &[
            "· · M5 M2 M4 ·   · · PageUp   Home Up   End",
            "· · ·  ·  M0 ·   · · PageDown Left Down Right",
            "· · ·  ·  M1 ·   · · ·        ·    ·    ·",
        ],
    ),
];

/// Home-row hold modifiers, mirrored on both halves.
pub static MODIFIERS: &[(VirtualKey, &str)] = &[
    (LI1D, "LShift"),
    (LMD, "LCtrl"),
    (LRD, "LAlt"),
    (LPD, "LGui"),
    (RI1D, "LShift"),
    (RMD, "LCtrl"),
    (RRD, "LAlt"),
    (RPD, "LGui"),
];

/// Reserved macro names. Expansion is not implemented; cells naming these
/// build without a reaction.
pub static MACROS: &[(&str, &str)] = &[
    ("M0", "x x x"),
    ("M1", "x x x"),
    ("M2", "x x x"),
    ("M3", "x x x"),
    ("M4", "x x x"),
    ("M5", "x x x"),
];

/// Builder over the shipped tables.
pub fn builder() -> KeyboardBuilder<'static> {
    KeyboardBuilder {
        key_order: VIRTUAL_KEY_ORDER,
        layers: LAYERS,
        modifiers: MODIFIERS,
        macros: MACROS,
    }
}

static VKEY_NAMES: &[(VirtualKey, &str)] = &[
    (LPU, "lpu"),
    (LPM, "lpm"),
    (LPD, "lpd"),
    (LRU, "lru"),
    (LRM, "lrm"),
    (LRD, "lrd"),
    (LMU, "lmu"),
    (LMM, "lmm"),
    (LMD, "lmd"),
    (LI1U, "li1u"),
    (LI1M, "li1m"),
    (LI1D, "li1d"),
    (LI2U, "li2u"),
    (LI2M, "li2m"),
    (LI2D, "li2d"),
    (LTU, "ltu"),
    (LTM, "ltm"),
    (LTD, "ltd"),
    (RTU, "rtu"),
    (RTM, "rtm"),
    (RTD, "rtd"),
    (RI2U, "ri2u"),
    (RI2M, "ri2m"),
    (RI2D, "ri2d"),
    (RI1U, "ri1u"),
    (RI1M, "ri1m"),
    (RI1D, "ri1d"),
    (RMU, "rmu"),
    (RMM, "rmm"),
    (RMD, "rmd"),
    (RRU, "rru"),
    (RRM, "rrm"),
    (RRD, "rrd"),
    (RPU, "rpu"),
    (RPM, "rpm"),
    (RPD, "rpd"),
];

pub fn vkey_name(vkey: VirtualKey) -> Option<&'static str> {
    VKEY_NAMES
        .iter()
        .find(|(v, _)| *v == vkey)
        .map(|&(_, name)| name)
}

static SWITCH_NAMES: &[(&str, PhysicalKey)] = &[
    ("pinky-up", PINKY_UP),
    ("pinky-down", PINKY_DOWN),
    ("ring-up", RING_UP),
    ("ring-down", RING_DOWN),
    ("middle-up", MIDDLE_UP),
    ("middle-down", MIDDLE_DOWN),
    ("index-up", INDEX_UP),
    ("index-down", INDEX_DOWN),
    ("index-inner", INDEX_INNER),
    ("thumb-up", THUMB_UP),
    ("thumb-down", THUMB_DOWN),
];

/// Switch lookup for simulation scripts.
pub fn switch_by_name(name: &str) -> Option<PhysicalKey> {
    SWITCH_NAMES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|&(_, key)| key)
}
