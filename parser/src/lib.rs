//! Configuration front end for the chorda engine.
//!
//! Turns the static tables a keyboard variant ships with — the 2-D virtual
//! key order, the layer strings, the modifier and macro maps — into a
//! ready-to-run [`chorda_core::layout::VirtualKeyboard`]. All validation
//! happens here; a table that parses produces a keyboard that cannot fail
//! at runtime.

pub mod cfg;
pub mod error;
pub mod keycodes;

pub use cfg::KeyboardBuilder;
pub use error::CfgError;
