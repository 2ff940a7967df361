//! The opcode matrix: the single source of truth mapping `(Instruction, Mode)`
//! pairs to opcode bytes. Both the CPU's decoder and the assembler's encoder
//! consult [`OPCODE_MATRIX`] through [`decode`] and [`encode`] so the two can
//! never drift out of sync.
//!
//! Restricted to the documented 151-entry legal 6502 instruction set, plus
//! one deliberate CMOS-only extension (`BIT #imm` at $89, see the module
//! docs on [`Instruction::Bit`]).

/// Addressing modes reachable at decode time. The assembler's operand
/// classifier additionally produces two synthetic, classification-only
/// values (`Byte`, `Label`) that never reach this table; see `asm::AddrType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    IndirectX,
    IndirectY,
    Indirect,
    Accumulator,
    Implied,
    Relative,
}

impl Mode {
    /// Number of operand bytes following the opcode byte.
    pub fn operand_len(self) -> u16 {
        match self {
            Mode::Implied | Mode::Accumulator => 0,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::Relative => 1,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 2,
        }
    }

    /// Total instruction length in bytes, including the opcode byte itself.
    pub fn instruction_len(self) -> u16 {
        1 + self.operand_len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    Lda,
    Ldx,
    Ldy,
    Sta,
    Stx,
    Sty,
    Tax,
    Txa,
    Tay,
    Tya,
    Tsx,
    Txs,
    Pha,
    Pla,
    Php,
    Plp,
    Adc,
    Sbc,
    And,
    Ora,
    Eor,
    /// Also reachable via the documented CMOS extension `BIT #imm` at opcode
    /// $89 — not part of the original NMOS instruction set, kept for source
    /// compatibility with programs that assume it.
    Bit,
    Cmp,
    Cpx,
    Cpy,
    Inc,
    Inx,
    Iny,
    Dec,
    Dex,
    Dey,
    Asl,
    Lsr,
    Rol,
    Ror,
    Jmp,
    Jsr,
    Rts,
    Rti,
    Brk,
    Nop,
    Clc,
    Sec,
    Cli,
    Sei,
    Clv,
    Cld,
    Sed,
    Bcc,
    Bcs,
    Beq,
    Bmi,
    Bne,
    Bpl,
    Bvc,
    Bvs,
}

impl Instruction {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Instruction::Lda => "LDA",
            Instruction::Ldx => "LDX",
            Instruction::Ldy => "LDY",
            Instruction::Sta => "STA",
            Instruction::Stx => "STX",
            Instruction::Sty => "STY",
            Instruction::Tax => "TAX",
            Instruction::Txa => "TXA",
            Instruction::Tay => "TAY",
            Instruction::Tya => "TYA",
            Instruction::Tsx => "TSX",
            Instruction::Txs => "TXS",
            Instruction::Pha => "PHA",
            Instruction::Pla => "PLA",
            Instruction::Php => "PHP",
            Instruction::Plp => "PLP",
            Instruction::Adc => "ADC",
            Instruction::Sbc => "SBC",
            Instruction::And => "AND",
            Instruction::Ora => "ORA",
            Instruction::Eor => "EOR",
            Instruction::Bit => "BIT",
            Instruction::Cmp => "CMP",
            Instruction::Cpx => "CPX",
            Instruction::Cpy => "CPY",
            Instruction::Inc => "INC",
            Instruction::Inx => "INX",
            Instruction::Iny => "INY",
            Instruction::Dec => "DEC",
            Instruction::Dex => "DEX",
            Instruction::Dey => "DEY",
            Instruction::Asl => "ASL",
            Instruction::Lsr => "LSR",
            Instruction::Rol => "ROL",
            Instruction::Ror => "ROR",
            Instruction::Jmp => "JMP",
            Instruction::Jsr => "JSR",
            Instruction::Rts => "RTS",
            Instruction::Rti => "RTI",
            Instruction::Brk => "BRK",
            Instruction::Nop => "NOP",
            Instruction::Clc => "CLC",
            Instruction::Sec => "SEC",
            Instruction::Cli => "CLI",
            Instruction::Sei => "SEI",
            Instruction::Clv => "CLV",
            Instruction::Cld => "CLD",
            Instruction::Sed => "SED",
            Instruction::Bcc => "BCC",
            Instruction::Bcs => "BCS",
            Instruction::Beq => "BEQ",
            Instruction::Bmi => "BMI",
            Instruction::Bne => "BNE",
            Instruction::Bpl => "BPL",
            Instruction::Bvc => "BVC",
            Instruction::Bvs => "BVS",
        }
    }

    /// True for the eight conditional branch mnemonics; used by the
    /// assembler's operand classifier (rule 9).
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Instruction::Bcc
                | Instruction::Bcs
                | Instruction::Beq
                | Instruction::Bmi
                | Instruction::Bne
                | Instruction::Bpl
                | Instruction::Bvc
                | Instruction::Bvs
        )
    }
}

/// Case-insensitive mnemonic lookup, used by the assembler's lexer.
pub fn match_instruction(mnemonic: &str) -> Option<Instruction> {
    Some(match mnemonic.to_ascii_uppercase().as_str() {
        "LDA" => Instruction::Lda,
        "LDX" => Instruction::Ldx,
        "LDY" => Instruction::Ldy,
        "STA" => Instruction::Sta,
        "STX" => Instruction::Stx,
        "STY" => Instruction::Sty,
        "TAX" => Instruction::Tax,
        "TXA" => Instruction::Txa,
        "TAY" => Instruction::Tay,
        "TYA" => Instruction::Tya,
        "TSX" => Instruction::Tsx,
        "TXS" => Instruction::Txs,
        "PHA" => Instruction::Pha,
        "PLA" => Instruction::Pla,
        "PHP" => Instruction::Php,
        "PLP" => Instruction::Plp,
        "ADC" => Instruction::Adc,
        "SBC" => Instruction::Sbc,
        "AND" => Instruction::And,
        "ORA" => Instruction::Ora,
        "EOR" => Instruction::Eor,
        "BIT" => Instruction::Bit,
        "CMP" => Instruction::Cmp,
        "CPX" => Instruction::Cpx,
        "CPY" => Instruction::Cpy,
        "INC" => Instruction::Inc,
        "INX" => Instruction::Inx,
        "INY" => Instruction::Iny,
        "DEC" => Instruction::Dec,
        "DEX" => Instruction::Dex,
        "DEY" => Instruction::Dey,
        "ASL" => Instruction::Asl,
        "LSR" => Instruction::Lsr,
        "ROL" => Instruction::Rol,
        "ROR" => Instruction::Ror,
        "JMP" => Instruction::Jmp,
        "JSR" => Instruction::Jsr,
        "RTS" => Instruction::Rts,
        "RTI" => Instruction::Rti,
        "BRK" => Instruction::Brk,
        "NOP" => Instruction::Nop,
        "CLC" => Instruction::Clc,
        "SEC" => Instruction::Sec,
        "CLI" => Instruction::Cli,
        "SEI" => Instruction::Sei,
        "CLV" => Instruction::Clv,
        "CLD" => Instruction::Cld,
        "SED" => Instruction::Sed,
        "BCC" => Instruction::Bcc,
        "BCS" => Instruction::Bcs,
        "BEQ" => Instruction::Beq,
        "BMI" => Instruction::Bmi,
        "BNE" => Instruction::Bne,
        "BPL" => Instruction::Bpl,
        "BVC" => Instruction::Bvc,
        "BVS" => Instruction::Bvs,
        _ => return None,
    })
}

use Instruction::*;
use Mode::*;

/// The bijection between `(Instruction, Mode)` and opcode byte for the legal
/// 151-entry 6502 instruction set, plus the $89 `BIT #imm` CMOS extension.
#[rustfmt::skip]
pub const OPCODE_MATRIX: &[(Instruction, Mode, u8)] = &[
    (Lda, Immediate, 0xA9), (Lda, ZeroPage, 0xA5), (Lda, ZeroPageX, 0xB5), (Lda, Absolute, 0xAD),
    (Lda, AbsoluteX, 0xBD), (Lda, AbsoluteY, 0xB9), (Lda, IndirectX, 0xA1), (Lda, IndirectY, 0xB1),

    (Ldx, Immediate, 0xA2), (Ldx, ZeroPage, 0xA6), (Ldx, ZeroPageY, 0xB6), (Ldx, Absolute, 0xAE),
    (Ldx, AbsoluteY, 0xBE),

    (Ldy, Immediate, 0xA0), (Ldy, ZeroPage, 0xA4), (Ldy, ZeroPageX, 0xB4), (Ldy, Absolute, 0xAC),
    (Ldy, AbsoluteX, 0xBC),

    (Sta, ZeroPage, 0x85), (Sta, ZeroPageX, 0x95), (Sta, Absolute, 0x8D), (Sta, AbsoluteX, 0x9D),
    (Sta, AbsoluteY, 0x99), (Sta, IndirectX, 0x81), (Sta, IndirectY, 0x91),

    (Stx, ZeroPage, 0x86), (Stx, ZeroPageY, 0x96), (Stx, Absolute, 0x8E),
    (Sty, ZeroPage, 0x84), (Sty, ZeroPageX, 0x94), (Sty, Absolute, 0x8C),

    (Tax, Implied, 0xAA), (Txa, Implied, 0x8A), (Tay, Implied, 0xA8), (Tya, Implied, 0x98),
    (Tsx, Implied, 0xBA), (Txs, Implied, 0x9A),
    (Pha, Implied, 0x48), (Pla, Implied, 0x68), (Php, Implied, 0x08), (Plp, Implied, 0x28),

    (Adc, Immediate, 0x69), (Adc, ZeroPage, 0x65), (Adc, ZeroPageX, 0x75), (Adc, Absolute, 0x6D),
    (Adc, AbsoluteX, 0x7D), (Adc, AbsoluteY, 0x79), (Adc, IndirectX, 0x61), (Adc, IndirectY, 0x71),

    (Sbc, Immediate, 0xE9), (Sbc, ZeroPage, 0xE5), (Sbc, ZeroPageX, 0xF5), (Sbc, Absolute, 0xED),
    (Sbc, AbsoluteX, 0xFD), (Sbc, AbsoluteY, 0xF9), (Sbc, IndirectX, 0xE1), (Sbc, IndirectY, 0xF1),

    (And, Immediate, 0x29), (And, ZeroPage, 0x25), (And, ZeroPageX, 0x35), (And, Absolute, 0x2D),
    (And, AbsoluteX, 0x3D), (And, AbsoluteY, 0x39), (And, IndirectX, 0x21), (And, IndirectY, 0x31),

    (Ora, Immediate, 0x09), (Ora, ZeroPage, 0x05), (Ora, ZeroPageX, 0x15), (Ora, Absolute, 0x0D),
    (Ora, AbsoluteX, 0x1D), (Ora, AbsoluteY, 0x19), (Ora, IndirectX, 0x01), (Ora, IndirectY, 0x11),

    (Eor, Immediate, 0x49), (Eor, ZeroPage, 0x45), (Eor, ZeroPageX, 0x55), (Eor, Absolute, 0x4D),
    (Eor, AbsoluteX, 0x5D), (Eor, AbsoluteY, 0x59), (Eor, IndirectX, 0x41), (Eor, IndirectY, 0x51),

    (Bit, ZeroPage, 0x24), (Bit, Absolute, 0x2C),
    // CMOS-only extension, not part of the legal NMOS 151; see Instruction::Bit.
    (Bit, Immediate, 0x89),

    (Cmp, Immediate, 0xC9), (Cmp, ZeroPage, 0xC5), (Cmp, ZeroPageX, 0xD5), (Cmp, Absolute, 0xCD),
    (Cmp, AbsoluteX, 0xDD), (Cmp, AbsoluteY, 0xD9), (Cmp, IndirectX, 0xC1), (Cmp, IndirectY, 0xD1),

    (Cpx, Immediate, 0xE0), (Cpx, ZeroPage, 0xE4), (Cpx, Absolute, 0xEC),
    (Cpy, Immediate, 0xC0), (Cpy, ZeroPage, 0xC4), (Cpy, Absolute, 0xCC),

    (Inc, ZeroPage, 0xE6), (Inc, ZeroPageX, 0xF6), (Inc, Absolute, 0xEE), (Inc, AbsoluteX, 0xFE),
    (Inx, Implied, 0xE8), (Iny, Implied, 0xC8),
    (Dec, ZeroPage, 0xC6), (Dec, ZeroPageX, 0xD6), (Dec, Absolute, 0xCE), (Dec, AbsoluteX, 0xDE),
    (Dex, Implied, 0xCA), (Dey, Implied, 0x88),

    (Asl, Accumulator, 0x0A), (Asl, ZeroPage, 0x06), (Asl, ZeroPageX, 0x16), (Asl, Absolute, 0x0E), (Asl, AbsoluteX, 0x1E),
    (Lsr, Accumulator, 0x4A), (Lsr, ZeroPage, 0x46), (Lsr, ZeroPageX, 0x56), (Lsr, Absolute, 0x4E), (Lsr, AbsoluteX, 0x5E),
    (Rol, Accumulator, 0x2A), (Rol, ZeroPage, 0x26), (Rol, ZeroPageX, 0x36), (Rol, Absolute, 0x2E), (Rol, AbsoluteX, 0x3E),
    (Ror, Accumulator, 0x6A), (Ror, ZeroPage, 0x66), (Ror, ZeroPageX, 0x76), (Ror, Absolute, 0x6E), (Ror, AbsoluteX, 0x7E),

    (Jmp, Absolute, 0x4C), (Jmp, Indirect, 0x6C),
    (Jsr, Absolute, 0x20), (Rts, Implied, 0x60), (Rti, Implied, 0x40), (Brk, Implied, 0x00), (Nop, Implied, 0xEA),

    (Clc, Implied, 0x18), (Sec, Implied, 0x38), (Cli, Implied, 0x58), (Sei, Implied, 0x78),
    (Clv, Implied, 0xB8), (Cld, Implied, 0xD8), (Sed, Implied, 0xF8),

    (Bcc, Relative, 0x90), (Bcs, Relative, 0xB0), (Beq, Relative, 0xF0), (Bmi, Relative, 0x30),
    (Bne, Relative, 0xD0), (Bpl, Relative, 0x10), (Bvc, Relative, 0x50), (Bvs, Relative, 0x70),
];

/// CPU decode: opcode byte -> `(Instruction, Mode)`. Unmapped bytes are the
/// `IllegalInstruction` case; the bytes outside the legal 151 (+1 extension)
/// are exactly the undocumented opcodes this crate does not implement.
pub fn decode(byte: u8) -> Option<(Instruction, Mode)> {
    OPCODE_MATRIX
        .iter()
        .find(|(_, _, b)| *b == byte)
        .map(|(instr, mode, _)| (*instr, *mode))
}

/// Assembler encode: `(Instruction, Mode)` -> opcode byte. `None` means the
/// pair is not in the matrix, i.e. an `EncodingError`.
pub fn encode(instruction: Instruction, mode: Mode) -> Option<u8> {
    OPCODE_MATRIX
        .iter()
        .find(|(i, m, _)| *i == instruction && *m == mode)
        .map(|(_, _, b)| *b)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_encode_round_trips_for_every_legal_entry() {
        for (instr, mode, byte) in OPCODE_MATRIX {
            assert_eq!(decode(*byte), Some((*instr, *mode)));
            assert_eq!(encode(*instr, *mode), Some(*byte));
        }
    }

    #[test]
    fn matrix_has_151_legal_entries_plus_one_extension() {
        assert_eq!(OPCODE_MATRIX.len(), 152);
    }

    #[test]
    fn unmapped_byte_is_none() {
        // $02 is a well-known illegal/KIL opcode, not in the legal matrix.
        assert_eq!(decode(0x02), None);
    }

    #[test]
    fn match_instruction_is_case_insensitive() {
        assert_eq!(match_instruction("lda"), Some(Instruction::Lda));
        assert_eq!(match_instruction("LDA"), Some(Instruction::Lda));
        assert_eq!(match_instruction("xyz"), None);
    }

    #[test]
    fn cmos_bit_immediate_extension_is_present() {
        assert_eq!(decode(0x89), Some((Instruction::Bit, Mode::Immediate)));
    }
}
