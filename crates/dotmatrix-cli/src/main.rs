//! Headless runner for the dotmatrix core.
//!
//! Loads a ROM-only cartridge, runs a bounded number of frames and reports
//! what happened. Useful for smoke-testing ROMs and for driving the core
//! from scripts; there is no window and no audio.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use dotmatrix_core::cartridge::Cartridge;
use dotmatrix_core::diagnostics::{self, Level};
use dotmatrix_core::gameboy::GameBoy;
use dotmatrix_core::ppu::{SCREEN_HEIGHT, SCREEN_WIDTH};
use log::info;

#[derive(Parser)]
#[command(name = "dotmatrix", about = "Headless Game Boy (DMG) core runner")]
struct Args {
    /// Path to ROM file
    rom: PathBuf,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Write the final framebuffer to PATH as a binary PGM image
    #[arg(long, value_name = "PATH")]
    dump: Option<PathBuf>,

    /// Print core stats after the run
    #[arg(long)]
    stats: bool,

    /// Forward core diagnostics to the logger
    #[arg(long)]
    trace: bool,
}

/// Bridges core diagnostics into the `log` ecosystem.
fn forward_to_log(level: Level, target: &'static str, message: &str) {
    let level = match level {
        Level::Debug => log::Level::Debug,
        Level::Warn => log::Level::Warn,
    };
    log::log!(level, "[{target}] {message}");
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    if args.trace && !diagnostics::install_sink(forward_to_log) {
        eprintln!("diagnostics sink was already installed");
    }

    let cart = match Cartridge::from_file(&args.rom) {
        Ok(cart) => cart,
        Err(err) => {
            eprintln!("Failed to load {}: {err}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };

    info!("running \"{}\" for {} frames", cart.title, args.frames);

    let mut gb = GameBoy::new();
    gb.load_cart(cart);

    for frame in 0..args.frames {
        if let Err(err) = gb.run_frame() {
            eprintln!("Emulation stopped in frame {frame}: {err}");
            break;
        }
    }

    if args.stats {
        let stats = gb.stats();
        println!(
            "frames:{} total_cycles:{} cpu_cycles:{} ly:{} mode:{} running:{}",
            args.frames,
            stats.total_cycles,
            stats.cpu_cycles,
            stats.ly,
            stats.ppu_mode,
            stats.running
        );
    }

    if let Some(path) = args.dump {
        if let Err(err) = dump_pgm(&path, gb.framebuffer()) {
            eprintln!("Failed to write {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
        info!("framebuffer written to {}", path.display());
    }

    ExitCode::SUCCESS
}

/// Write the shade framebuffer as an 8-bit binary PGM, lightest shade first.
fn dump_pgm(path: &PathBuf, framebuffer: &[u8; SCREEN_WIDTH * SCREEN_HEIGHT]) -> std::io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "P5 {SCREEN_WIDTH} {SCREEN_HEIGHT} 255")?;
    for &shade in framebuffer.iter() {
        out.write_all(&[255 - shade * 85])?;
    }
    out.flush()
}
