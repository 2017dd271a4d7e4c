//! Integration tests over the assembled pipeline: resolver, virtual
//! keyboard, engine and the shipped keymap together.

use anyhow::{anyhow, Result};

use chorda_core::key_code::KeyCode;
use chorda_core::layout::VirtualKeyboard;
use chorda_core::reaction::{ReactionCmd, ReactionQueue};
use chorda_core::{PhysicalKey, SwitchSet, TimeMs, VirtualKey};
use chorda_link_protocol::LinkItem;
use chorda_parser::cfg::{build_half_resolver, GroupTable};
use chorda_parser::KeyboardBuilder;

use crate::engine::{Engine, InputSource, TickInput};
use crate::hid_out::{HidOutput, OutEvent, SimulatedOutput};
use crate::keymap;

const SPACE_DOWN: ReactionCmd = ReactionCmd::press(KeyCode::Space);
const SPACE_UP: ReactionCmd = ReactionCmd::release(KeyCode::Space);

/// One thumb key group plus its three virtual keys, as on the real board,
/// with the thumb serials acting as (all-transparent) layer keys.
struct ThumbHalf {
    resolver: chorda_core::half::HalfResolver,
    keyboard: VirtualKeyboard,
    pressed: SwitchSet,
}

impl ThumbHalf {
    fn new() -> Self {
        let groups: GroupTable = &[(
            0,
            &[
                (keymap::RTU, &[keymap::THUMB_UP]),
                (keymap::RTM, &[keymap::THUMB_UP, keymap::THUMB_DOWN]),
                (keymap::RTD, &[keymap::THUMB_DOWN]),
            ],
        )];
        let key_order: &[&[VirtualKey]] = &[&[keymap::RTU], &[keymap::RTM], &[keymap::RTD]];
        let layers: &[(VirtualKey, &[&str])] = &[
            (VirtualKey::NO_KEY, &["Space", "Backspace", "Enter"]),
            (keymap::RTU, &["·", "·", "·"]),
            (keymap::RTM, &["·", "·", "·"]),
            (keymap::RTD, &["·", "·", "·"]),
        ];
        let builder = KeyboardBuilder {
            key_order,
            layers,
            modifiers: &[],
            macros: &[],
        };
        Self {
            resolver: build_half_resolver(groups).unwrap(),
            keyboard: builder.build().unwrap(),
            pressed: SwitchSet::EMPTY,
        }
    }

    #[track_caller]
    fn step(
        &mut self,
        now: TimeMs,
        press: Option<PhysicalKey>,
        release: Option<PhysicalKey>,
        expected: &[ReactionCmd],
    ) {
        if let Some(key) = press {
            self.pressed.insert(key);
        }
        if let Some(key) = release {
            self.pressed.remove(key);
        }
        let mut events = chorda_core::half::HalfEvents::new();
        self.resolver.update(now, self.pressed, &mut events);
        let mut out = ReactionQueue::new();
        self.keyboard.update(now, &events, &mut out);
        assert_eq!(out.as_slice(), expected);
    }
}

#[test]
fn thumb_tap_within_combo_window() {
    let mut half = ThumbHalf::new();
    half.step(0, Some(keymap::THUMB_UP), None, &[]);
    half.step(20, None, Some(keymap::THUMB_UP), &[SPACE_DOWN, SPACE_UP]);
}

#[test]
fn thumb_tap_with_idle_tick() {
    let mut half = ThumbHalf::new();
    half.step(0, Some(keymap::THUMB_UP), None, &[]);
    half.step(10, None, None, &[]);
    half.step(20, None, Some(keymap::THUMB_UP), &[SPACE_DOWN, SPACE_UP]);
}

#[test]
fn thumb_tap_longer_than_combo_window() {
    let mut half = ThumbHalf::new();
    half.step(0, Some(keymap::THUMB_UP), None, &[]);
    half.step(70, None, Some(keymap::THUMB_UP), &[SPACE_DOWN, SPACE_UP]);
}

#[test]
fn thumb_tap_longer_than_combo_window_with_tick() {
    let mut half = ThumbHalf::new();
    half.step(0, Some(keymap::THUMB_UP), None, &[]);
    // The window closes: the virtual key goes down but, being dual-role,
    // stays silent until its own tap/hold decision.
    half.step(60, None, None, &[]);
    half.step(70, None, Some(keymap::THUMB_UP), &[SPACE_DOWN, SPACE_UP]);
}

#[test]
fn thumb_press_past_hold_term_without_ticks() {
    // No tick lands between press and release, so the combo resolves and
    // taps in one go on release.
    let mut half = ThumbHalf::new();
    half.step(0, Some(keymap::THUMB_UP), None, &[]);
    half.step(300, None, Some(keymap::THUMB_UP), &[SPACE_DOWN, SPACE_UP]);
}

#[test]
fn thumb_press_past_hold_term_with_ticks_becomes_hold() {
    let mut half = ThumbHalf::new();
    half.step(0, Some(keymap::THUMB_UP), None, &[]);
    half.step(60, None, None, &[]);
    // The hold matures into a layer switch; no commands either way.
    half.step(270, None, None, &[]);
    half.step(300, None, Some(keymap::THUMB_UP), &[]);
}

#[test]
fn shipped_keymap_builds() {
    keymap::builder().build().unwrap();
    build_half_resolver(keymap::LEFT_KEY_GROUPS).unwrap();
    build_half_resolver(keymap::RIGHT_KEY_GROUPS).unwrap();
}

#[test]
fn right_half_inner_index_column() {
    let mut resolver = build_half_resolver(keymap::RIGHT_KEY_GROUPS).unwrap();
    let mut keyboard = keymap::builder().build().unwrap();

    let mut events = chorda_core::half::HalfEvents::new();
    resolver.update(0, SwitchSet::single(keymap::INDEX_INNER), &mut events);
    assert_eq!(events.as_slice(), []);
    events.clear();
    resolver.update(60, SwitchSet::single(keymap::INDEX_INNER), &mut events);

    let mut out = ReactionQueue::new();
    keyboard.update(60, &events, &mut out);
    assert_eq!(out.as_slice(), [ReactionCmd::press(KeyCode::H)]);
}

#[test]
fn engine_orders_remote_events_before_local() {
    let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
    // Local pinky-up is pending from t=0...
    engine
        .process_tick(TickInput {
            now: 0,
            pressed: SwitchSet::single(keymap::PINKY_UP),
            ..Default::default()
        })
        .unwrap();
    // ...and resolves on the same tick a remote press arrives. The remote
    // event must reach the virtual keyboard first.
    engine
        .process_tick(TickInput {
            now: 60,
            pressed: SwitchSet::single(keymap::PINKY_UP),
            encoder_offset: 0,
            remote: vec![LinkItem::VKey {
                serial: keymap::RI1U.0,
                pressed: true,
            }],
        })
        .unwrap();
    assert_eq!(
        engine.output().events,
        [
            OutEvent::KeyPress(KeyCode::U),
            OutEvent::KeyPress(KeyCode::Q)
        ]
    );
}

#[test]
fn engine_accumulates_remote_mouse_motion() {
    let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
    engine
        .process_tick(TickInput {
            now: 0,
            pressed: SwitchSet::EMPTY,
            encoder_offset: -2,
            remote: vec![
                LinkItem::MouseMove { dx: 3, dy: 1 },
                LinkItem::MouseMove { dx: -1, dy: 4 },
            ],
        })
        .unwrap();
    assert_eq!(
        engine.output().events,
        [OutEvent::PointerMove(2, 5), OutEvent::Wheel(-2)]
    );
}

#[test]
fn pipeline_keeps_press_release_balance() {
    let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
    let script: &[(TimeMs, &[PhysicalKey])] = &[
        (0, &[keymap::PINKY_UP]),
        (60, &[keymap::PINKY_UP]),
        (100, &[]),
        (120, &[keymap::PINKY_UP, keymap::PINKY_DOWN]),
        (180, &[keymap::PINKY_UP, keymap::PINKY_DOWN]),
        (220, &[]),
        (240, &[keymap::RING_UP]),
        (300, &[]),
        (600, &[]),
    ];
    for &(now, keys) in script {
        engine
            .process_tick(TickInput {
                now,
                pressed: keys.iter().copied().collect(),
                ..Default::default()
            })
            .unwrap();
    }
    let mut balance: std::collections::HashMap<KeyCode, i32> = Default::default();
    for ev in &engine.output().events {
        match ev {
            OutEvent::KeyPress(code) => *balance.entry(*code).or_default() += 1,
            OutEvent::KeyRelease(code) => *balance.entry(*code).or_default() -= 1,
            other => panic!("unexpected output event {other:?}"),
        }
    }
    assert!(!balance.is_empty());
    assert!(balance.values().all(|&b| b == 0), "unbalanced: {balance:?}");
}

struct ScriptedSource {
    items: Vec<Result<Option<TickInput>>>,
}

impl InputSource for ScriptedSource {
    fn poll(&mut self) -> Result<Option<TickInput>> {
        if self.items.is_empty() {
            Ok(None)
        } else {
            self.items.remove(0)
        }
    }
}

#[test]
fn super_loop_recovers_from_poll_errors() {
    let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
    let mut source = ScriptedSource {
        items: vec![
            Err(anyhow!("serial framing error")),
            Ok(Some(TickInput {
                now: 0,
                pressed: SwitchSet::EMPTY,
                encoder_offset: 1,
                remote: vec![],
            })),
        ],
    };
    engine.run(&mut source).unwrap();
    assert_eq!(engine.output().events, [OutEvent::Wheel(1)]);
}

struct BrokenOutput;

impl HidOutput for BrokenOutput {
    fn press_key(&mut self, _: KeyCode) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn release_key(&mut self, _: KeyCode) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn send_key(&mut self, _: KeyCode) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn press_btn(&mut self, _: chorda_core::reaction::MouseButton) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn release_btn(&mut self, _: chorda_core::reaction::MouseButton) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn click_btn(&mut self, _: chorda_core::reaction::MouseButton) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn scroll(&mut self, _: i8) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
    fn move_pointer(&mut self, _: i16, _: i16) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "hid stall"))
    }
}

#[test]
fn device_errors_surface_from_process_tick() {
    let mut engine = Engine::with_builtin_keymap(BrokenOutput).unwrap();
    let err = engine
        .process_tick(TickInput {
            now: 0,
            pressed: SwitchSet::EMPTY,
            encoder_offset: 3,
            remote: vec![],
        })
        .unwrap_err();
    assert!(err.to_string().contains("hid stall"));
}
