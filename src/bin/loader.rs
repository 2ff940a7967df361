//! `loader <path> [--origin $A000]` — assembles or loads a program, installs
//! the baseline console handlers, and runs it on a fresh CPU until it halts.

use clap::Parser;
use colored::*;
use cpu_6502::asm::Assembler;
use cpu_6502::bus::Bus;
use cpu_6502::console::install_stdio_handlers;
use cpu_6502::cpu_6502::Cpu6502;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

fn parse_origin(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix('$') {
        u16::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<u16>().map_err(|e| e.to_string())
    }
}

#[derive(Parser)]
#[command(author, version, about = "Load and run a 6502 program")]
struct Cli {
    /// Path to a .asm source file, or an already-assembled .rom/.bin image
    path: PathBuf,
    /// Load/assemble origin, e.g. $A000
    #[arg(long, value_parser = parse_origin, default_value = "$A000")]
    origin: u16,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let is_source = cli
        .path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("asm"))
        .unwrap_or(false);

    let code = if is_source {
        let text = match fs::read_to_string(&cli.path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("{}: {}", cli.path.display(), e);
                exit(1);
            }
        };
        match Assembler::with_origin(cli.origin).assemble(&text) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{}", e);
                exit(1);
            }
        }
    } else {
        match fs::read(&cli.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                eprintln!("{}: {}", cli.path.display(), e);
                exit(1);
            }
        }
    };

    let bus = Bus::new_shared();
    bus.borrow_mut().load_rom(&code, cli.origin);
    install_stdio_handlers(&bus);

    let mut cpu = Cpu6502::new(bus);
    cpu.pc = cli.origin;

    match cpu.run(None) {
        Ok(steps) => {
            println!();
            println!("{}", format!("halted after {} step(s)", steps).green());
            println!(
                "A=${:02X} X=${:02X} Y=${:02X} SP=${:02X} PC=${:04X} P=${:02X}",
                cpu.a, cpu.x, cpu.y, cpu.s, cpu.pc, cpu.p
            );
        }
        Err(e) => {
            eprintln!("{}", format!("{}", e).red());
            exit(1);
        }
    }
}
