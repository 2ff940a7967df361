//! `asm-dump <source.asm> [--format hex|bin|both]` — assembles a source file
//! and writes the result(s) into a `bin/` directory next to the current
//! working directory.

use clap::{Parser, ValueEnum};
use cpu_6502::asm::Assembler;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Hex,
    Bin,
    Both,
}

#[derive(Parser)]
#[command(author, version, about = "Assemble a 6502 source file and dump its bytes")]
struct Cli {
    /// Path to the assembly source file
    source: PathBuf,
    /// Which output(s) to write
    #[arg(long, value_enum, default_value_t = Format::Both)]
    format: Format,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let text = match fs::read_to_string(&cli.source) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{}: {}", cli.source.display(), e);
            exit(1);
        }
    };

    let assembler = Assembler::new();
    let code = match assembler.assemble(&text) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let bin_dir = PathBuf::from("bin");
    if let Err(e) = fs::create_dir_all(&bin_dir) {
        eprintln!("{}: {}", bin_dir.display(), e);
        exit(1);
    }

    let stem = cli
        .source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());

    if matches!(cli.format, Format::Bin | Format::Both) {
        let bin_path = bin_dir.join(format!("{}.bin", stem));
        if let Err(e) = fs::write(&bin_path, &code) {
            eprintln!("{}: {}", bin_path.display(), e);
            exit(1);
        }
        println!("Binary written to: {}", bin_path.display());
    }

    if matches!(cli.format, Format::Hex | Format::Both) {
        let hex_path = bin_dir.join(format!("{}.hex", stem));
        let mut contents = String::new();
        for (i, byte) in code.iter().enumerate() {
            let addr = assembler.origin().wrapping_add(i as u16);
            contents.push_str(&format!("${:04X}: {:02X}\n", addr, byte));
        }
        if let Err(e) = fs::write(&hex_path, contents) {
            eprintln!("{}: {}", hex_path.display(), e);
            exit(1);
        }
        println!("Hex dump written to: {}", hex_path.display());
    }
}
