use anyhow::{bail, Result};
use clap::Parser;
use simplelog::{format_description, *};
use std::path::PathBuf;

use chorda_engine::sim::run_script;
use chorda_engine::{keymap, Engine, SimulatedOutput};

#[derive(Parser, Debug)]
#[command(author, version, verbatim_doc_comment)]
/// chorda: firmware engine of a split chorded ergonomic keyboard
///
/// This host build carries the full interpreter pipeline but no hardware:
/// it validates the shipped keymap and replays key-event scripts, printing
/// the HID commands the device would emit. Device builds wire the same
/// engine to the switch matrix, the inter-half serial link and the USB
/// endpoints.
struct Args {
    /// Validate the built-in keymap and exit.
    #[arg(long)]
    check: bool,

    /// Replay a key-event script through the engine.
    /// Lines: press:<switch>, release:<switch>, remote:<json item>,
    /// wheel:<detents>, tick:<ms>.
    #[arg(short, long, verbatim_doc_comment)]
    sim: Option<PathBuf>,

    /// Disable logging, except for errors. Takes precedent over debug and trace.
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging; implies --debug as well.
    #[arg(short, long)]
    trace: bool,
}

fn log_init(args: &Args) {
    let log_lvl = match (args.debug, args.trace, args.quiet) {
        (_, true, false) => LevelFilter::Trace,
        (true, false, false) => LevelFilter::Debug,
        (false, false, false) => LevelFilter::Info,
        (_, _, true) => LevelFilter::Error,
    };

    let mut log_cfg = ConfigBuilder::new();
    if let Err(e) = log_cfg.set_time_offset_to_local() {
        eprintln!("WARNING: could not set log TZ to local: {e:?}");
    };
    log_cfg.set_time_format_custom(format_description!(
        version = 2,
        "[hour]:[minute]:[second].[subsecond digits:4]"
    ));
    CombinedLogger::init(vec![TermLogger::new(
        log_lvl,
        log_cfg.build(),
        TerminalMode::Mixed,
        ColorChoice::AlwaysAnsi,
    )])
    .expect("logger can init");
}

fn main_impl() -> Result<()> {
    let args = Args::parse();
    log_init(&args);
    log::info!("chorda v{} starting", env!("CARGO_PKG_VERSION"));

    if !args.check && args.sim.is_none() {
        bail!("nothing to do on the host: pass --check or --sim <FILE>\nFor more info, pass the `-h` or `--help` flags.");
    }

    match keymap::builder().build() {
        Ok(_) => log::info!("keymap ok: {} virtual keys", keymap::VIRTUAL_KEY_ORDER.iter().map(|r| r.len()).sum::<usize>()),
        Err(e) => {
            log::error!("keymap rejected:\n{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }

    if let Some(path) = args.sim {
        let script = std::fs::read_to_string(&path)?;
        let mut engine = Engine::with_builtin_keymap(SimulatedOutput::new())?;
        run_script(&mut engine, &script)?;
        log::info!(
            "simulation done: {} output events",
            engine.output().events.len()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let ret = main_impl();
    if let Err(ref e) = ret {
        log::error!("{e}\n");
    }
    ret
}
