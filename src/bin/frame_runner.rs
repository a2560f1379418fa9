//! Headless deterministic runner: loads a ROM, runs a fixed number of
//! frames, prints a SHA-1 digest of each frame's RGBA buffer. An optional
//! base64 input script feeds controller 1 one state byte per frame, applied
//! at the frame boundary, which makes whole runs reproducible end to end.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use famicore::nes::Nes;
use sha1::{Digest, Sha1};

#[derive(Debug, Clone)]
struct Config {
    rom: PathBuf,
    frames: u32,
    input_script: Vec<u8>,
    per_frame_hashes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rom: PathBuf::new(),
            frames: 60,
            input_script: Vec::new(),
            per_frame_hashes: false,
        }
    }
}

fn usage() -> &'static str {
    "Usage: frame_runner <rom.nes> [--frames N] [--input BASE64] [--per-frame]\n\
     \n\
     --frames N      number of frames to run (default 60)\n\
     --input B64     base64 controller-1 script, one state byte per frame\n\
     --per-frame     print a framebuffer hash for every frame, not just the last"
}

fn parse_args() -> Result<Config> {
    let mut cfg = Config::default();
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--frames" => {
                let value = args.next().context("--frames requires a number")?;
                cfg.frames = value
                    .parse()
                    .with_context(|| format!("invalid frame count: {value}"))?;
            }
            "--input" => {
                let value = args.next().context("--input requires a base64 string")?;
                cfg.input_script = BASE64_STANDARD
                    .decode(value.as_bytes())
                    .context("input script is not valid base64")?;
            }
            "--per-frame" => cfg.per_frame_hashes = true,
            "--help" | "-h" => {
                println!("{}", usage());
                std::process::exit(0);
            }
            _ if cfg.rom.as_os_str().is_empty() => cfg.rom = PathBuf::from(arg),
            _ => bail!("unexpected argument: {arg}\n{}", usage()),
        }
    }

    if cfg.rom.as_os_str().is_empty() {
        bail!("{}", usage());
    }
    Ok(cfg)
}

fn frame_digest(buffer: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(buffer);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn main() -> Result<()> {
    let cfg = parse_args()?;

    let mut nes = Nes::new();
    nes.load_rom_from_path(&cfg.rom)
        .with_context(|| format!("failed to load {}", cfg.rom.display()))?;
    println!("loaded {} ({})", cfg.rom.display(), nes.mapper_name());

    let mut last_digest = String::new();
    for frame in 0..cfg.frames {
        if let Some(state) = cfg.input_script.get(frame as usize) {
            nes.set_controller_state(0, *state);
        }

        nes.run_frame();
        last_digest = frame_digest(nes.frame_buffer());
        if cfg.per_frame_hashes {
            println!("frame {frame:05}: {last_digest}");
        }
    }

    println!("final frame: {last_digest}");
    println!(
        "pc=${:04X} cycles={} unknown_opcodes={}",
        nes.debug_pc(),
        nes.debug_total_cycles(),
        nes.debug_unknown_opcode_count()
    );

    for event in nes.recent_events(4).iter().rev() {
        println!("event: {event}");
    }

    Ok(())
}
