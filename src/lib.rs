// Remove this once this is a bit more mature.
#![allow(dead_code)]
// Clippy rules to disable.
#![allow(clippy::new_without_default)]

pub mod asm;
pub mod bus;
pub mod console;
pub mod constants;
pub mod cpu_6502;
pub mod error;
pub mod opcodes;
