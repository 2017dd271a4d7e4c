//! Glue between the input seams, the interpreter core and the HID output.

use anyhow::Result;
use std::time::{Duration, Instant};

use chorda_core::half::{HalfEvents, HalfResolver};
use chorda_core::key_code::KeyCode;
use chorda_core::layout::VirtualKeyboard;
use chorda_core::reaction::{KeyCmdKind, MouseButtonCmdKind, ReactionCmd, ReactionQueue};
use chorda_core::{Clock, SwitchSet, TimeMs, VKeyEvent, VirtualKey};
use chorda_link_protocol::LinkItem;
use chorda_parser::cfg::build_half_resolver;

use crate::diag::{DiagDumper, DiagEntry, DiagRing, TextToKeys};
use crate::hid_out::HidOutput;
use crate::keymap;

/// Breather between super-loop iterations.
pub const TICK_PAUSE: Duration = Duration::from_millis(1);

/// Pause after a failed tick before the pipeline resumes.
pub const RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Everything one super-loop iteration learned from the peripherals.
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub now: TimeMs,
    /// Locally pressed switches, already debounced.
    pub pressed: SwitchSet,
    /// Rotary encoder detents since the previous tick.
    pub encoder_offset: i32,
    /// Items drained from the inter-half link, oldest first.
    pub remote: Vec<LinkItem>,
}

/// Peripheral polling seam. `Ok(None)` ends the loop; scripted sources use
/// it at end of input, device sources never return it.
pub trait InputSource {
    fn poll(&mut self) -> Result<Option<TickInput>>;
}

/// Wall-clock milliseconds since construction.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> TimeMs {
        self.origin.elapsed().as_millis() as TimeMs
    }
}

/// The assembled firmware pipeline of one half.
pub struct Engine<O: HidOutput> {
    resolver: HalfResolver,
    keyboard: VirtualKeyboard,
    out: O,
    diag: DiagRing,
    dumper: DiagDumper,
    text_to_keys: TextToKeys,
}

impl<O: HidOutput> Engine<O> {
    pub fn new(resolver: HalfResolver, keyboard: VirtualKeyboard, out: O) -> Self {
        Self {
            resolver,
            keyboard,
            out,
            diag: DiagRing::new(),
            dumper: DiagDumper::new(),
            text_to_keys: TextToKeys::new(),
        }
    }

    /// Left-half engine over the shipped keymap.
    pub fn with_builtin_keymap(out: O) -> Result<Self> {
        let resolver = build_half_resolver(keymap::LEFT_KEY_GROUPS)?;
        let keyboard = keymap::builder().build()?;
        Ok(Self::new(resolver, keyboard, out))
    }

    pub fn output(&self) -> &O {
        &self.out
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.out
    }

    /// One pipeline step: pointer and wheel first, then remote events ahead
    /// of the locally resolved ones, then reaction execution.
    pub fn process_tick(&mut self, tick: TickInput) -> Result<()> {
        let mut dx: i32 = 0;
        let mut dy: i32 = 0;
        let mut remote_events: Vec<VKeyEvent> = Vec::new();
        for item in &tick.remote {
            match *item {
                LinkItem::MouseMove { dx: x, dy: y } => {
                    dx += i32::from(x);
                    dy += i32::from(y);
                }
                LinkItem::VKey { serial, pressed } => {
                    remote_events.push(VKeyEvent {
                        vkey: VirtualKey(serial),
                        pressed,
                    });
                }
            }
        }

        if dx != 0 || dy != 0 {
            self.out
                .move_pointer(clamp_i16(dx), clamp_i16(dy))?;
        }
        if tick.encoder_offset != 0 {
            self.out.scroll(clamp_i8(tick.encoder_offset))?;
        }

        let mut local = HalfEvents::new();
        self.resolver.update(tick.now, tick.pressed, &mut local);

        let mut events = remote_events.clone();
        events.extend(local.iter().copied());

        let mut reactions = ReactionQueue::new();
        self.keyboard.update(tick.now, &events, &mut reactions);

        for &cmd in reactions.iter() {
            self.execute(cmd)?;
        }

        if !events.is_empty() || !reactions.is_empty() {
            log::debug!("{} key_seq: {:?}", tick.now, reactions.as_slice());
            self.diag.record(DiagEntry {
                time: tick.now,
                remote: remote_events,
                local: local.iter().copied().collect(),
                reactions: reactions.iter().copied().collect(),
            });
        }
        Ok(())
    }

    fn execute(&mut self, cmd: ReactionCmd) -> Result<()> {
        match cmd {
            ReactionCmd::Key { kind, code } => self.execute_key(kind, code)?,
            ReactionCmd::MouseButton { button, kind } => match kind {
                MouseButtonCmdKind::Press => self.out.press_btn(button)?,
                MouseButtonCmdKind::Release => self.out.release_btn(button)?,
                MouseButtonCmdKind::Click => self.out.click_btn(button)?,
            },
            ReactionCmd::MouseWheel { offset } => self.out.scroll(offset)?,
            ReactionCmd::Log => self.type_out_diagnostics()?,
        }
        Ok(())
    }

    fn execute_key(&mut self, kind: KeyCmdKind, code: KeyCode) -> Result<()> {
        match kind {
            KeyCmdKind::Press => self.out.press_key(code)?,
            KeyCmdKind::Release => self.out.release_key(code)?,
            KeyCmdKind::Send => self.out.send_key(code)?,
        }
        Ok(())
    }

    /// The `Log` reaction: type the recent-event ring on the host. The two
    /// newest entries are the log keypress itself.
    fn type_out_diagnostics(&mut self) -> Result<()> {
        let text = self.dumper.dump(self.diag.entries_except_newest(2));
        for cmd in self.text_to_keys.convert(&text) {
            if let ReactionCmd::Key { kind, code } = cmd {
                self.execute_key(kind, code)?;
            }
        }
        Ok(())
    }

    /// Firmware super-loop. A failing tick or poll is logged and followed
    /// by a half-second pause; pipeline state is preserved across the
    /// retry. Returns once the source runs dry.
    pub fn run<I: InputSource>(&mut self, input: &mut I) -> Result<()> {
        loop {
            match input.poll() {
                Ok(Some(tick)) => {
                    if let Err(err) = self.process_tick(tick) {
                        log::error!("tick failed: {err:#}");
                        std::thread::sleep(RETRY_PAUSE);
                        continue;
                    }
                }
                Ok(None) => return Ok(()),
                Err(err) => {
                    log::error!("input poll failed: {err:#}");
                    std::thread::sleep(RETRY_PAUSE);
                    continue;
                }
            }
            std::thread::sleep(TICK_PAUSE);
        }
    }
}

fn clamp_i16(v: i32) -> i16 {
    v.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

fn clamp_i8(v: i32) -> i8 {
    v.clamp(i32::from(i8::MIN), i32::from(i8::MAX)) as i8
}
