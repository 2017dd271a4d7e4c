//! Keyboard construction from the shipped configuration tables.

use chorda_core::half::HalfResolver;
use chorda_core::key_code::KeyCode;
use chorda_core::key_group::KeyGroup;
use chorda_core::layout::{KeyRole, Layer, VirtualKeyboard};
use chorda_core::reaction::{
    MouseButton, MouseButtonCmdKind, OneKeyReactions, ReactionCmd,
};
use chorda_core::{PhysicalKey, VirtualKey};
use rustc_hash::FxHashMap;

use crate::error::{CfgError, Result};
use crate::keycodes::{modifier_code, reaction_table, ReactionDef};

/// The layer-cell name meaning "no reaction".
pub const NO_REACTION: &str = "·";

/// One half's group table: (group id, chords).
pub type GroupTable<'a> = &'a [(u8, &'a [(VirtualKey, &'a [PhysicalKey])])];

/// Builds a [`VirtualKeyboard`] from the tables a keyboard variant ships
/// with. Rejecting a table here is what keeps the runtime total.
pub struct KeyboardBuilder<'a> {
    /// 2-D layout whose cells give the column order of every layer row.
    pub key_order: &'a [&'a [VirtualKey]],
    /// Layer rows per activating serial; the `NO_KEY` sentinel names the
    /// default layer.
    pub layers: &'a [(VirtualKey, &'a [&'a str])],
    /// Serial -> modifier name for the hold meaning of mod keys.
    pub modifiers: &'a [(VirtualKey, &'a str)],
    /// Reserved macro names; referenced cells build without a reaction.
    pub macros: &'a [(&'a str, &'a str)],
}

impl<'a> KeyboardBuilder<'a> {
    pub fn build(&self) -> Result<VirtualKeyboard> {
        let table = reaction_table();

        let default_rows = self
            .layers
            .iter()
            .find(|(serial, _)| *serial == VirtualKey::NO_KEY)
            .map(|&(_, rows)| rows)
            .ok_or(CfgError::MissingDefaultLayer)?;

        let mut arena: Vec<Layer> = Vec::new();
        arena.push(self.parse_layer(VirtualKey::NO_KEY, default_rows, &table)?);

        let mut roles: FxHashMap<VirtualKey, KeyRole> = FxHashMap::default();
        for &(serial, rows) in self.layers {
            if serial == VirtualKey::NO_KEY {
                continue;
            }
            let id = arena.len();
            arena.push(self.parse_layer(serial, rows, &table)?);
            roles.insert(serial, KeyRole::Layer { layer: id });
        }

        for &(serial, name) in self.modifiers {
            let code =
                modifier_code(name).ok_or_else(|| CfgError::UnknownModifier(name.to_string()))?;
            if roles.insert(serial, KeyRole::Mod { code }).is_some() {
                return Err(CfgError::ConflictingRole(serial));
            }
        }

        for row in self.key_order {
            for &serial in *row {
                roles.entry(serial).or_insert(KeyRole::Simple);
            }
        }

        Ok(VirtualKeyboard::new(roles, arena)?)
    }

    fn parse_layer(
        &self,
        layer: VirtualKey,
        rows: &[&str],
        table: &FxHashMap<String, ReactionDef>,
    ) -> Result<Layer> {
        if rows.len() != self.key_order.len() {
            return Err(CfgError::RowCountMismatch {
                layer,
                expected: self.key_order.len(),
                got: rows.len(),
            });
        }

        let mut reactions = Layer::default();
        for (row_idx, (line, order_row)) in rows.iter().zip(self.key_order).enumerate() {
            let names: Vec<&str> = line.split_whitespace().collect();
            if names.len() != order_row.len() {
                return Err(CfgError::RowLengthMismatch {
                    layer,
                    row: row_idx,
                    expected: order_row.len(),
                    got: names.len(),
                });
            }
            for (&name, &serial) in names.iter().zip(*order_row) {
                if let Some(r) = self.create_reaction(layer, name, table)? {
                    reactions.insert(serial, r);
                }
            }
        }
        Ok(reactions)
    }

    fn create_reaction(
        &self,
        layer: VirtualKey,
        name: &str,
        table: &FxHashMap<String, ReactionDef>,
    ) -> Result<Option<OneKeyReactions>> {
        if name == NO_REACTION {
            return Ok(None);
        }
        if self.macros.iter().any(|(n, _)| *n == name) {
            // Macro expansion is not implemented; the name is reserved and
            // the cell builds without a reaction.
            log::warn!("macro {name} in layer {layer:?} is not expanded");
            return Ok(None);
        }

        let reactions = match name {
            "MouseLeft" => mouse_button(MouseButton::Left),
            "MouseRight" => mouse_button(MouseButton::Right),
            "MouseWheelUp" => mouse_wheel(1),
            "MouseWheelDown" => mouse_wheel(-1),
            "Log" => OneKeyReactions::new(vec![ReactionCmd::Log], vec![]),
            _ => {
                let def = table.get(name).ok_or_else(|| CfgError::UnknownReaction {
                    name: name.to_string(),
                    layer,
                })?;
                keyed_reaction(*def)
            }
        };
        Ok(Some(reactions))
    }
}

/// Builds one half's resolver from its group table.
pub fn build_half_resolver(groups: GroupTable<'_>) -> Result<HalfResolver> {
    let mut built = Vec::new();
    for &(id, chords) in groups {
        built.push(KeyGroup::new(id, chords)?);
    }
    Ok(HalfResolver::new(built)?)
}

fn mouse_button(button: MouseButton) -> OneKeyReactions {
    OneKeyReactions::new(
        vec![ReactionCmd::MouseButton {
            button,
            kind: MouseButtonCmdKind::Press,
        }],
        vec![ReactionCmd::MouseButton {
            button,
            kind: MouseButtonCmdKind::Release,
        }],
    )
}

fn mouse_wheel(offset: i8) -> OneKeyReactions {
    OneKeyReactions::new(vec![ReactionCmd::MouseWheel { offset }], vec![])
}

/// A named key, wrapped in shift or AltGr when the de-DE layout needs it.
fn keyed_reaction(def: ReactionDef) -> OneKeyReactions {
    let wrap = if def.shift {
        Some(KeyCode::LShift)
    } else if def.altgr {
        Some(KeyCode::RAlt)
    } else {
        None
    };
    match wrap {
        Some(modifier) => OneKeyReactions::new(
            vec![ReactionCmd::press(modifier), ReactionCmd::press(def.code)],
            vec![
                ReactionCmd::release(def.code),
                ReactionCmd::release(modifier),
            ],
        ),
        None => OneKeyReactions::key_pair(def.code),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chorda_core::layout::DEFAULT_LAYER;
    use chorda_core::reaction::ReactionQueue;
    use chorda_core::VKeyEvent;

    const LPU: VirtualKey = VirtualKey(1);
    const LPD: VirtualKey = VirtualKey(2);
    const LTU: VirtualKey = VirtualKey(3);

    fn update(
        kbd: &mut VirtualKeyboard,
        now: u32,
        events: &[VKeyEvent],
    ) -> Vec<ReactionCmd> {
        let mut out = ReactionQueue::new();
        kbd.update(now, events, &mut out);
        out.iter().copied().collect()
    }

    #[test]
    fn one_simple_key() {
        let key_order: &[&[VirtualKey]] = &[&[LPU]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["a"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        let mut kbd = builder.build().unwrap();
        assert_eq!(
            update(&mut kbd, 210, &[VKeyEvent::press(LPU)]),
            [ReactionCmd::press(KeyCode::A)]
        );
        assert_eq!(
            update(&mut kbd, 300, &[VKeyEvent::release(LPU)]),
            [ReactionCmd::release(KeyCode::A)]
        );
    }

    #[test]
    fn shifted_cell_wraps_the_key() {
        let key_order: &[&[VirtualKey]] = &[&[LPU]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["$"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        let mut kbd = builder.build().unwrap();
        assert_eq!(
            update(&mut kbd, 0, &[VKeyEvent::press(LPU)]),
            [
                ReactionCmd::press(KeyCode::LShift),
                ReactionCmd::press(KeyCode::Kb4)
            ]
        );
        assert_eq!(
            update(&mut kbd, 10, &[VKeyEvent::release(LPU)]),
            [
                ReactionCmd::release(KeyCode::Kb4),
                ReactionCmd::release(KeyCode::LShift)
            ]
        );
    }

    #[test]
    fn modifier_serial_becomes_a_mod_key() {
        let key_order: &[&[VirtualKey]] = &[&[LPU, LPD]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["a s"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[(LPD, "LShift")],
            macros: &[],
        };
        let mut kbd = builder.build().unwrap();
        // Held past the tap/hold term, the key acts as its modifier.
        assert_eq!(update(&mut kbd, 0, &[VKeyEvent::press(LPD)]), []);
        assert_eq!(
            update(&mut kbd, 201, &[]),
            [ReactionCmd::press(KeyCode::LShift)]
        );
        assert_eq!(
            update(&mut kbd, 250, &[VKeyEvent::release(LPD)]),
            [ReactionCmd::release(KeyCode::LShift)]
        );
    }

    #[test]
    fn layer_serial_becomes_a_layer_key() {
        let key_order: &[&[VirtualKey]] = &[&[LPU, LTU]];
        let layers: &[(VirtualKey, &[&str])] = &[
            (VirtualKey::NO_KEY, &["a ·"]),
            (LTU, &["1 ·"]),
        ];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        let mut kbd = builder.build().unwrap();
        assert_eq!(kbd.current_layer(), DEFAULT_LAYER);
        assert_eq!(update(&mut kbd, 0, &[VKeyEvent::press(LTU)]), []);
        assert_eq!(update(&mut kbd, 201, &[]), []);
        assert_ne!(kbd.current_layer(), DEFAULT_LAYER);
        assert_eq!(
            update(&mut kbd, 210, &[VKeyEvent::press(LPU)]),
            [ReactionCmd::press(KeyCode::Kb1)]
        );
    }

    fn init_log() {
        use simplelog::*;
        use std::sync::OnceLock;
        static LOG_INIT: OnceLock<()> = OnceLock::new();
        // Raise the level to see parser warnings in test output.
        LOG_INIT.get_or_init(|| {
            CombinedLogger::init(vec![TermLogger::new(
                LevelFilter::Off,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::AlwaysAnsi,
            )])
            .expect("logger can init");
        });
    }

    #[test]
    fn macro_cells_build_without_reaction() {
        init_log();
        let key_order: &[&[VirtualKey]] = &[&[LPU]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["M3"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[("M3", "x x x")],
        };
        let mut kbd = builder.build().unwrap();
        assert_eq!(update(&mut kbd, 0, &[VKeyEvent::press(LPU)]), []);
        assert_eq!(update(&mut kbd, 10, &[VKeyEvent::release(LPU)]), []);
    }

    #[test]
    fn mouse_and_log_cells() {
        let key_order: &[&[VirtualKey]] = &[&[LPU, LPD, LTU]];
        let layers: &[(VirtualKey, &[&str])] =
            &[(VirtualKey::NO_KEY, &["MouseLeft MouseWheelDown Log"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        let mut kbd = builder.build().unwrap();
        assert_eq!(
            update(&mut kbd, 0, &[VKeyEvent::press(LPU)]),
            [ReactionCmd::MouseButton {
                button: MouseButton::Left,
                kind: MouseButtonCmdKind::Press,
            }]
        );
        assert_eq!(
            update(&mut kbd, 10, &[VKeyEvent::press(LPD)]),
            [ReactionCmd::MouseWheel { offset: -1 }]
        );
        assert_eq!(
            update(&mut kbd, 20, &[VKeyEvent::press(LTU)]),
            [ReactionCmd::Log]
        );
    }

    #[test]
    fn row_length_mismatch_is_rejected() {
        let key_order: &[&[VirtualKey]] = &[&[LPU, LPD]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["a"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        assert!(matches!(
            builder.build(),
            Err(CfgError::RowLengthMismatch {
                row: 0,
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn row_count_mismatch_is_rejected() {
        let key_order: &[&[VirtualKey]] = &[&[LPU], &[LPD]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["a"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        assert!(matches!(
            builder.build(),
            Err(CfgError::RowCountMismatch {
                expected: 2,
                got: 1,
                ..
            })
        ));
    }

    #[test]
    fn unknown_reaction_name_is_rejected() {
        let key_order: &[&[VirtualKey]] = &[&[LPU]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["NoSuchKey"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        assert!(matches!(
            builder.build(),
            Err(CfgError::UnknownReaction { .. })
        ));
    }

    #[test]
    fn unknown_modifier_is_rejected() {
        let key_order: &[&[VirtualKey]] = &[&[LPU]];
        let layers: &[(VirtualKey, &[&str])] = &[(VirtualKey::NO_KEY, &["a"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[(LPU, "Hyper")],
            macros: &[],
        };
        assert!(matches!(builder.build(), Err(CfgError::UnknownModifier(_))));
    }

    #[test]
    fn missing_default_layer_is_rejected() {
        let key_order: &[&[VirtualKey]] = &[&[LPU]];
        let layers: &[(VirtualKey, &[&str])] = &[(LTU, &["a"])];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        assert!(matches!(builder.build(), Err(CfgError::MissingDefaultLayer)));
    }

    #[test]
    fn half_resolver_builds_from_group_table() {
        let groups: GroupTable = &[
            (0, &[(LPU, &[PhysicalKey(0)]), (LPD, &[PhysicalKey(1)])]),
            (1, &[(LTU, &[PhysicalKey(2)])]),
        ];
        assert!(build_half_resolver(groups).is_ok());

        let overlapping: GroupTable = &[
            (0, &[(LPU, &[PhysicalKey(0)])]),
            (1, &[(LTU, &[PhysicalKey(0)])]),
        ];
        assert!(matches!(
            build_half_resolver(overlapping),
            Err(CfgError::Group(_))
        ));
    }
}
