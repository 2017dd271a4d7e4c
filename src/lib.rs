//! Firmware engine of a split chorded ergonomic keyboard.
//!
//! Each half carries eleven switches under five fingers; per-finger chords
//! expand them into a 3x12 grid of virtual keys interpreted under tap/hold
//! semantics. The interpreter lives in `chorda-core`; this crate assembles
//! it with the shipped keymap, the inter-half link items and the HID
//! output seam, and drives everything from a single-threaded super-loop.
//! On the host the same engine runs against a simulated output for keymap
//! validation and scripted replay.

pub mod diag;
pub mod engine;
pub mod hid_out;
pub mod keymap;
pub mod sim;

#[cfg(test)]
mod tests;

pub use engine::{Engine, InputSource, MonotonicClock, TickInput};
pub use hid_out::{HidOutput, SimulatedOutput};
