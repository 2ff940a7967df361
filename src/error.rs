//! Error taxonomy for assembly-time and run-time failures.
//!
//! The assembler's [`AsmError`] carries enough of the offending source line
//! to render the teacher's colorized, line-annotated diagnostics; CPU faults
//! surface as the much smaller [`CpuError`].

use colored::*;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsmErrorKind {
    /// Malformed line, unknown directive, or unparseable operand.
    SyntaxError,
    /// Pass 2 could not resolve an identifier.
    UnknownLabel,
    /// A literal was neither hex, decimal, identifier, nor char literal.
    UnknownValue,
    /// `(mnemonic, mode)` is missing from the opcode matrix.
    EncodingError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    pub kind: AsmErrorKind,
    pub message: String,
    pub row: usize,
    pub line_text: String,
}

impl AsmError {
    pub fn new(kind: AsmErrorKind, message: impl Into<String>, row: usize, line_text: &str) -> AsmError {
        AsmError {
            kind,
            message: message.into(),
            row,
            line_text: line_text.to_string(),
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(
            f,
            "{} {}",
            format!("line {}:", self.row).cyan(),
            self.line_text.bright_white()
        )?;
        write!(
            f,
            "{} {}",
            format!("{:?}:", self.kind).bright_red(),
            self.message.bright_red()
        )
    }
}

impl std::error::Error for AsmError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuError {
    pub opcode: u8,
    pub pc: u16,
}

impl fmt::Display for CpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "illegal instruction: opcode ${:02X} at PC=${:04X}",
            self.opcode, self.pc
        )
    }
}

impl std::error::Error for CpuError {}

#[derive(Debug)]
pub enum EmulatorError {
    Asm(AsmError),
    Cpu(CpuError),
    Io(std::io::Error),
    /// User-initiated cancel at the step loop (e.g. Ctrl-C during the
    /// blocking stdin read handler).
    Interrupted,
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmulatorError::Asm(e) => write!(f, "{}", e),
            EmulatorError::Cpu(e) => write!(f, "{}", e),
            EmulatorError::Io(e) => write!(f, "I/O error: {}", e),
            EmulatorError::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::error::Error for EmulatorError {}

impl From<AsmError> for EmulatorError {
    fn from(e: AsmError) -> EmulatorError {
        EmulatorError::Asm(e)
    }
}

impl From<CpuError> for EmulatorError {
    fn from(e: CpuError) -> EmulatorError {
        EmulatorError::Cpu(e)
    }
}

impl From<std::io::Error> for EmulatorError {
    fn from(e: std::io::Error) -> EmulatorError {
        EmulatorError::Io(e)
    }
}
