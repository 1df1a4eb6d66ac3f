//! Lumachain - drive LED chains from a rig configuration
//!
//! Builds the rig, feeds a ramp test pattern into every mapped universe and
//! prints each encoded frame as hex on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use lumachain::{logging_setup, rig::ramp_universe, Rig, RigConfig};
use lumachain_control::{IngestWorker, UniverseFrame, UNIVERSE_SIZE};
use lumachain_render::OutputDriver;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// Built-in rig used when no config file is given
const DEMO_CONFIG: &str = r#"
[[controllers]]
name = "demo"
protocol = "apa102"

[[controllers.fixtures]]
name = "strip"
pixels = 4

[[controllers.fixtures.layers]]
mode = "overwrite"
fill = [255, 0, 0, 32]

[[controllers.fixtures.layers]]
mappings = [{ universe = 0, pixels = 4, channels_per_pixel = 4 }]
"#;

#[derive(Parser)]
#[command(name = "lumachain", about = "Layered LED compositing and chain output")]
struct Args {
    /// Rig configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to produce
    #[arg(short, long, default_value_t = 3)]
    frames: usize,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<String>,

    /// Run output drivers and the ingest worker on their own threads
    #[arg(long)]
    realtime: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::from_toml_str(DEMO_CONFIG)?,
    };
    if let Some(level) = &args.log_level {
        config.log.level = level.clone();
    }
    logging_setup::init(&config.log)?;

    let rig = Rig::build(&config).context("Failed to build rig")?;
    rig.start()?;

    if args.realtime {
        run_threaded(&rig, args.frames)?;
    } else {
        run_stepped(&rig, args.frames)?;
    }

    rig.stop();
    Ok(())
}

/// Feed and show frames one at a time on this thread
fn run_stepped(rig: &Rig, frames: usize) -> Result<()> {
    let universes = rig.router().used_universes();
    for step in 0..frames {
        for &universe in &universes {
            rig.router()
                .dispatch(universe, &ramp_universe(step, UNIVERSE_SIZE));
        }
        for (output, frame) in rig.outputs().iter().zip(rig.show()?) {
            println!(
                "{} {}: {}",
                step,
                output.controller.lock().name(),
                hex::encode(frame)
            );
        }
    }
    Ok(())
}

fn run_threaded(rig: &Rig, frames: usize) -> Result<()> {
    let mut worker = IngestWorker::spawn(rig.router().clone())?;
    let sender = worker.sender();

    let mut drivers = Vec::with_capacity(rig.outputs().len());
    for output in rig.outputs() {
        drivers.push(OutputDriver::with_config(
            output.controller.clone(),
            output.driver.clone(),
        )?);
    }

    let period = rig
        .outputs()
        .first()
        .map(|o| o.driver.frame_period)
        .unwrap_or(Duration::from_millis(33));
    let universes = rig.router().used_universes();
    for step in 0..frames {
        for &universe in &universes {
            if !sender.send(UniverseFrame::new(universe, ramp_universe(step, UNIVERSE_SIZE)))? {
                warn!("Universe {} frame dropped", universe);
            }
        }
        thread::sleep(period);
    }

    worker.stop();
    for driver in &mut drivers {
        driver.stop();
    }

    for (output, driver) in rig.outputs().iter().zip(&drivers) {
        let stats = driver.stats();
        let name = output.controller.lock().name().to_string();
        info!(
            "Controller '{}': {} frames sent, {} refused",
            name, stats.frames_sent, stats.frames_failed
        );
        if let Some(frame) = output.sink.last_frame() {
            println!("{}: {}", name, hex::encode(frame));
        }
    }
    Ok(())
}
