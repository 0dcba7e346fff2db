//! Instruction decoding.
//!
//! Every instruction is one big-endian 16-bit word. Which operation it is
//! comes from matching the word against a fixed table of (mask, pattern)
//! pairs, in order; the first hit wins, so the specific `00E0`/`00EE` rows
//! sit ahead of the catch-all `0nnn`. Operands are read straight off the
//! word by the accessors on [`Instruction`].
//!
//! | Field | Bits | Location                         |
//! |-------|------|----------------------------------|
//! | `x`   | 4    | nibble 1                         |
//! | `y`   | 4    | nibble 2                         |
//! | `n`   | 4    | nibble 3                         |
//! | `kk`  | 8    | low byte                         |
//! | `nnn` | 12   | everything but the top nibble    |

use crate::nibble::U4;
use std::fmt;

/// get nibble `index` of `word`, where 0 is the most significant nibble and
/// 3 the least (bit offsets 12, 8, 4, 0).
///
/// # Panics
/// if `index` is not in 0..=3
pub fn nibble(word: u16, index: usize) -> U4 {
    assert!(index < 4, "nibble index {} out of range 0..=3", index);
    let shift = 4 * (3 - index);
    U4::new((word >> shift) as u8)
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Opcode {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 0nnn, machine code routine; ignored
    Sys,
    /// 1nnn
    Jp,
    /// 2nnn
    Call,
    /// 3xkk
    SeImm,
    /// 4xkk
    SneImm,
    /// 5xy0
    SeReg,
    /// 6xkk
    LdImm,
    /// 7xkk
    AddImm,
    /// 8xy0
    LdReg,
    /// 8xy1
    Or,
    /// 8xy2
    And,
    /// 8xy3
    Xor,
    /// 8xy4
    AddReg,
    /// 8xy5
    Sub,
    /// 8xy6
    Shr,
    /// 8xy7
    Subn,
    /// 8xyE
    Shl,
    /// 9xy0
    SneReg,
    /// Annn
    LdI,
    /// Bnnn
    JpV0,
    /// Cxkk
    Rnd,
    /// Dxyn
    Drw,
    /// Ex9E
    Skp,
    /// ExA1
    Sknp,
    /// Fx07
    LdFromDelay,
    /// Fx0A
    LdKey,
    /// Fx15
    LdDelay,
    /// Fx18
    LdSound,
    /// Fx1E
    AddI,
    /// Fx29
    LdFont,
    /// Fx33
    Bcd,
    /// Fx55
    StoreRegs,
    /// Fx65
    LoadRegs,
}

struct Pattern {
    mask: u16,
    bits: u16,
    opcode: Opcode,
    mnemonic: &'static str,
}

const fn pat(mask: u16, bits: u16, opcode: Opcode, mnemonic: &'static str) -> Pattern {
    Pattern {
        mask,
        bits,
        opcode,
        mnemonic,
    }
}

/// checked top to bottom
#[rustfmt::skip]
const PATTERNS: [Pattern; 35] = [
    pat(0xffff, 0x00e0, Opcode::Cls,         "CLS"),
    pat(0xffff, 0x00ee, Opcode::Ret,         "RET"),
    pat(0xf000, 0x0000, Opcode::Sys,         "SYS"),
    pat(0xf000, 0x1000, Opcode::Jp,          "JP"),
    pat(0xf000, 0x2000, Opcode::Call,        "CALL"),
    pat(0xf000, 0x3000, Opcode::SeImm,       "SE"),
    pat(0xf000, 0x4000, Opcode::SneImm,      "SNE"),
    pat(0xf00f, 0x5000, Opcode::SeReg,       "SE"),
    pat(0xf000, 0x6000, Opcode::LdImm,       "LD"),
    pat(0xf000, 0x7000, Opcode::AddImm,      "ADD"),
    pat(0xf00f, 0x8000, Opcode::LdReg,       "LD"),
    pat(0xf00f, 0x8001, Opcode::Or,          "OR"),
    pat(0xf00f, 0x8002, Opcode::And,         "AND"),
    pat(0xf00f, 0x8003, Opcode::Xor,         "XOR"),
    pat(0xf00f, 0x8004, Opcode::AddReg,      "ADD"),
    pat(0xf00f, 0x8005, Opcode::Sub,         "SUB"),
    pat(0xf00f, 0x8006, Opcode::Shr,         "SHR"),
    pat(0xf00f, 0x8007, Opcode::Subn,        "SUBN"),
    pat(0xf00f, 0x800e, Opcode::Shl,         "SHL"),
    pat(0xf00f, 0x9000, Opcode::SneReg,      "SNE"),
    pat(0xf000, 0xa000, Opcode::LdI,         "LD I"),
    pat(0xf000, 0xb000, Opcode::JpV0,        "JP V0"),
    pat(0xf000, 0xc000, Opcode::Rnd,         "RND"),
    pat(0xf000, 0xd000, Opcode::Drw,         "DRW"),
    pat(0xf0ff, 0xe09e, Opcode::Skp,         "SKP"),
    pat(0xf0ff, 0xe0a1, Opcode::Sknp,        "SKNP"),
    pat(0xf0ff, 0xf007, Opcode::LdFromDelay, "LD DT>"),
    pat(0xf0ff, 0xf00a, Opcode::LdKey,       "LD K"),
    pat(0xf0ff, 0xf015, Opcode::LdDelay,     "LD >DT"),
    pat(0xf0ff, 0xf018, Opcode::LdSound,     "LD >ST"),
    pat(0xf0ff, 0xf01e, Opcode::AddI,        "ADD I"),
    pat(0xf0ff, 0xf029, Opcode::LdFont,      "LD F"),
    pat(0xf0ff, 0xf033, Opcode::Bcd,         "LD B"),
    pat(0xf0ff, 0xf055, Opcode::StoreRegs,   "LD [I]<"),
    pat(0xf0ff, 0xf065, Opcode::LoadRegs,    "LD <[I]"),
];

/// a decoded instruction: the raw word plus which operation it is
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub word: u16,
    pub opcode: Opcode,
}

impl Instruction {
    /// match `word` against the opcode table; `None` if nothing matches
    pub fn decode(word: u16) -> Option<Instruction> {
        PATTERNS
            .iter()
            .find(|p| word & p.mask == p.bits)
            .map(|p| Instruction {
                word,
                opcode: p.opcode,
            })
    }

    pub fn x(&self) -> U4 {
        nibble(self.word, 1)
    }

    pub fn y(&self) -> U4 {
        nibble(self.word, 2)
    }

    pub fn n(&self) -> U4 {
        nibble(self.word, 3)
    }

    pub fn kk(&self) -> u8 {
        (self.word & 0x00ff) as u8
    }

    pub fn nnn(&self) -> u16 {
        self.word & 0x0fff
    }

    pub fn mnemonic(&self) -> &'static str {
        PATTERNS
            .iter()
            .find(|p| p.opcode == self.opcode)
            .map_or("???", |p| p.mnemonic)
    }
}

impl fmt::Display for Instruction {
    /// e.g. `D01F DRW`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X} {}", self.word, self.mnemonic())
    }
}
