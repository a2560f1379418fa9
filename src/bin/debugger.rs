use std::path::Path;

use anyhow::Result;
use famicore::nes::Nes;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        println!("Usage: famicore_debug <rom.nes>");
        return Ok(());
    }

    let rom_path = &args[1];
    let mut nes = Nes::new();
    nes.load_rom_from_path(Path::new(rom_path))?;

    println!("Loaded {} ({})", rom_path, nes.mapper_name());
    println!("PC: ${:04X}", nes.debug_pc());
    println!("Type 'help' for commands");

    let mut running = false;

    loop {
        if running {
            nes.run_frame();
        }

        print!("> ");
        std::io::Write::flush(&mut std::io::stdout()).ok();

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        let parts: Vec<&str> = input.trim().split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0] {
            "help" => {
                println!("  step, s      - execute one instruction");
                println!("  frame, f     - run one frame");
                println!("  run, r       - run continuously");
                println!("  stop         - stop running");
                println!("  regs         - show CPU registers");
                println!("  mem <addr>   - dump 16 bytes of RAM");
                println!("  ppu          - show PPU state");
                println!("  events       - show recent core events");
                println!("  quit, q      - exit");
            }
            "step" | "s" => {
                let cycles = nes.step();
                println!("{} cycles, PC=${:04X}", cycles, nes.debug_pc());
            }
            "frame" | "f" => {
                nes.run_frame();
                let (scanline, dot) = nes.debug_ppu_scanline_dot();
                println!("frame done, PPU at scanline {scanline} dot {dot}");
            }
            "run" | "r" => {
                running = true;
                println!("Running (enter 'stop' to pause)...");
            }
            "stop" => {
                running = false;
                println!("Stopped");
            }
            "regs" => {
                let (a, x, y, p, sp, pc) = nes.debug_cpu_regs();
                println!("A: ${a:02X}  X: ${x:02X}  Y: ${y:02X}");
                println!("P: {p:08b} (NV-BDIZC)  SP: ${sp:02X}  PC: ${pc:04X}");
            }
            "mem" => {
                if let Some(addr) = parts
                    .get(1)
                    .and_then(|s| u16::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                {
                    let mut line = format!("{addr:04X}:");
                    for i in 0..16 {
                        let byte = nes.debug_peek_internal_ram(addr.wrapping_add(i));
                        line.push_str(&format!(" {byte:02X}"));
                    }
                    println!("{line}");
                } else {
                    println!("Usage: mem <hex addr>");
                }
            }
            "ppu" => {
                let (ctrl, mask, status) = nes.debug_ppu_registers();
                let (scanline, dot) = nes.debug_ppu_scanline_dot();
                println!("scanline {scanline}, dot {dot}");
                println!("$2000 (ctrl):   {ctrl:08b}");
                println!("$2001 (mask):   {mask:08b}");
                println!("$2002 (status): {status:08b}");
            }
            "events" => {
                for event in nes.recent_events(16) {
                    println!("{event}");
                }
            }
            "quit" | "q" => break,
            other => println!("Unknown command: {other} (try 'help')"),
        }
    }

    Ok(())
}
