//! Output seam towards the USB HID devices.

use std::io;

use chorda_core::key_code::KeyCode;
use chorda_core::reaction::MouseButton;

/// What the engine needs from the host-side HID adapters. Device builds
/// implement this over the USB keyboard and mouse endpoints; calls must
/// stay within the tick budget.
pub trait HidOutput {
    fn press_key(&mut self, code: KeyCode) -> io::Result<()>;
    fn release_key(&mut self, code: KeyCode) -> io::Result<()>;
    /// Press and release within one report cycle.
    fn send_key(&mut self, code: KeyCode) -> io::Result<()>;
    fn press_btn(&mut self, btn: MouseButton) -> io::Result<()>;
    fn release_btn(&mut self, btn: MouseButton) -> io::Result<()>;
    fn click_btn(&mut self, btn: MouseButton) -> io::Result<()>;
    fn scroll(&mut self, offset: i8) -> io::Result<()>;
    fn move_pointer(&mut self, dx: i16, dy: i16) -> io::Result<()>;
}

/// One recorded output call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutEvent {
    KeyPress(KeyCode),
    KeyRelease(KeyCode),
    KeySend(KeyCode),
    BtnPress(MouseButton),
    BtnRelease(MouseButton),
    BtnClick(MouseButton),
    Wheel(i8),
    PointerMove(i16, i16),
}

/// Records every call instead of touching hardware. Host builds run on
/// this; tests inspect `events`.
#[derive(Debug, Default)]
pub struct SimulatedOutput {
    pub events: Vec<OutEvent>,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, ev: OutEvent) -> io::Result<()> {
        log::info!("out: {ev:?}");
        self.events.push(ev);
        Ok(())
    }
}

impl HidOutput for SimulatedOutput {
    fn press_key(&mut self, code: KeyCode) -> io::Result<()> {
        self.record(OutEvent::KeyPress(code))
    }

    fn release_key(&mut self, code: KeyCode) -> io::Result<()> {
        self.record(OutEvent::KeyRelease(code))
    }

    fn send_key(&mut self, code: KeyCode) -> io::Result<()> {
        self.record(OutEvent::KeySend(code))
    }

    fn press_btn(&mut self, btn: MouseButton) -> io::Result<()> {
        self.record(OutEvent::BtnPress(btn))
    }

    fn release_btn(&mut self, btn: MouseButton) -> io::Result<()> {
        self.record(OutEvent::BtnRelease(btn))
    }

    fn click_btn(&mut self, btn: MouseButton) -> io::Result<()> {
        self.record(OutEvent::BtnClick(btn))
    }

    fn scroll(&mut self, offset: i8) -> io::Result<()> {
        self.record(OutEvent::Wheel(offset))
    }

    fn move_pointer(&mut self, dx: i16, dy: i16) -> io::Result<()> {
        self.record(OutEvent::PointerMove(dx, dy))
    }
}
