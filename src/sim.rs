//! Script-driven simulation of the firmware pipeline.
//!
//! A script is a sequence of `kind:value` lines. `press`/`release` stage a
//! local switch edge, `remote` stages a link item (JSON, as on the wire),
//! `wheel` stages encoder detents, and `tick` feeds everything staged so
//! far into the engine at the given millisecond. Blank lines and `#`
//! comments are skipped.
//!
//! ```text
//! press:thumb-up
//! tick:0
//! release:thumb-up
//! tick:20
//! ```

use anyhow::{anyhow, bail, Result};

use chorda_core::SwitchSet;
use chorda_link_protocol::LinkItem;

use crate::engine::{Engine, TickInput};
use crate::hid_out::HidOutput;
use crate::keymap::switch_by_name;

pub fn run_script<O: HidOutput>(engine: &mut Engine<O>, script: &str) -> Result<()> {
    let mut pressed = SwitchSet::EMPTY;
    let mut remote: Vec<LinkItem> = Vec::new();
    let mut encoder_offset: i32 = 0;

    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((kind, val)) = line.split_once(':') else {
            bail!("invalid line: {line}");
        };
        let val = val.trim();
        match kind.trim() {
            "tick" => {
                let now = val
                    .parse()
                    .map_err(|_| anyhow!("invalid tick time: {val}"))?;
                engine.process_tick(TickInput {
                    now,
                    pressed,
                    encoder_offset: std::mem::take(&mut encoder_offset),
                    remote: std::mem::take(&mut remote),
                })?;
            }
            "press" => {
                let key =
                    switch_by_name(val).ok_or_else(|| anyhow!("unknown switch: {val}"))?;
                pressed.insert(key);
            }
            "release" => {
                let key =
                    switch_by_name(val).ok_or_else(|| anyhow!("unknown switch: {val}"))?;
                pressed.remove(key);
            }
            "remote" => {
                let item = LinkItem::from_line(val)
                    .map_err(|e| anyhow!("invalid link item `{val}`: {e}"))?;
                remote.push(item);
            }
            "wheel" => {
                let offset: i32 = val
                    .parse()
                    .map_err(|_| anyhow!("invalid wheel offset: {val}"))?;
                encoder_offset += offset;
            }
            other => bail!("invalid line prefix: {other}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hid_out::{OutEvent, SimulatedOutput};
    use chorda_core::key_code::KeyCode;

    #[test]
    fn taps_a_letter_through_the_whole_pipeline() {
        let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
        let script = "\
# tap the left pinky upper switch
press:pinky-up
tick:0
release:pinky-up
tick:20
tick:300
";
        run_script(&mut engine, script).unwrap();
        assert_eq!(
            engine.output().events,
            [
                OutEvent::KeyPress(KeyCode::Q),
                OutEvent::KeyRelease(KeyCode::Q)
            ]
        );
    }

    #[test]
    fn remote_and_wheel_lines() {
        let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
        let script = "\
remote:{\"MouseMove\":{\"dx\":4,\"dy\":-2}}
wheel:1
tick:0
";
        run_script(&mut engine, script).unwrap();
        assert_eq!(
            engine.output().events,
            [OutEvent::PointerMove(4, -2), OutEvent::Wheel(1)]
        );
    }

    #[test]
    fn rejects_unknown_switch_names() {
        let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new()).unwrap();
        assert!(run_script(&mut engine, "press:palm\n").is_err());
    }
}
