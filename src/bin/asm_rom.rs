//! `asm-rom <source.asm> [-o out.rom]` — assembles a source file into a raw
//! ROM image at the assembler's origin.

use clap::Parser;
use cpu_6502::asm::Assembler;
use std::fs;
use std::path::PathBuf;
use std::process::exit;

#[derive(Parser)]
#[command(author, version, about = "Assemble a 6502 source file into a .rom image")]
struct Cli {
    /// Path to the assembly source file
    source: PathBuf,
    /// Output path for the assembled ROM image
    #[arg(short, long)]
    out: Option<PathBuf>,
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
    let bytecode = match assembler.assemble(&text) {
        Ok(bytecode) => bytecode,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };

    let out_path = cli.out.unwrap_or_else(|| cli.source.with_extension("rom"));
    if let Err(e) = fs::write(&out_path, &bytecode) {
        eprintln!("{}: {}", out_path.display(), e);
        exit(1);
    }

    println!("Created ROM file: {}", out_path.display());
}
