//! # instruction
//!
//! Every CHIP-8 instruction is one big-endian 16 bit word. The top nibble
//! picks the instruction family; families 0x0, 0x8, 0xE and 0xF need the low
//! byte or low nibble as well to tell their members apart. Operands live at
//! fixed places in the word:
//!
//! ```text
//!   X... selector    .X.. x (register)   ..X. y (register)   ...X n (nibble)
//!   ..XX kk (byte)   .XXX nnn (address)
//! ```
use std::fmt;

/// one of the 35 documented instructions, or `Unknown` for anything else
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Unknown,
    Sys,
    Cls,
    Ret,
    Jp,
    Call,
    Se,
    Sne,
    Sre,
    Ld,
    Add,
    LdVxVy,
    Or,
    And,
    Xor,
    AddVxVy,
    Sub,
    Shr,
    Subn,
    Shl,
    Srne,
    Ldi,
    Jp0,
    Rnd,
    Drw,
    Skp,
    Sknp,
    LdVxDt,
    LdVxK,
    LdDtVx,
    LdStVx,
    AddIVx,
    LdF,
    LdB,
    LdIVx,
    LdVxI,
}

/// an operand field; each knows where it sits in the word and how wide it is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    X,
    Y,
    N,
    Kk,
    Nnn,
}

impl Field {
    /// width in bits
    pub fn width(self) -> u32 {
        match self {
            Field::X | Field::Y | Field::N => 4,
            Field::Kk => 8,
            Field::Nnn => 12,
        }
    }

    fn shift(self) -> u32 {
        match self {
            Field::X => 8,
            Field::Y => 4,
            Field::N | Field::Kk | Field::Nnn => 0,
        }
    }

    /// pull this field out of an instruction word
    pub fn read(self, word: u16) -> u16 {
        (word >> self.shift()) & ((1 << self.width()) - 1)
    }
}

/// mnemonic and operand layout of an opcode
#[derive(Debug, PartialEq, Eq)]
pub struct Definition {
    pub name: &'static str,
    pub operands: &'static [Field],
}

const NONE: &[Field] = &[];
const ADDR: &[Field] = &[Field::Nnn];
const VX: &[Field] = &[Field::X];
const VX_BYTE: &[Field] = &[Field::X, Field::Kk];
const VX_VY: &[Field] = &[Field::X, Field::Y];
const VX_VY_N: &[Field] = &[Field::X, Field::Y, Field::N];

impl Opcode {
    /// the documented instruction set, in table order
    pub const ALL: [Opcode; 35] = [
        Opcode::Sys,
        Opcode::Cls,
        Opcode::Ret,
        Opcode::Jp,
        Opcode::Call,
        Opcode::Se,
        Opcode::Sne,
        Opcode::Sre,
        Opcode::Ld,
        Opcode::Add,
        Opcode::LdVxVy,
        Opcode::Or,
        Opcode::And,
        Opcode::Xor,
        Opcode::AddVxVy,
        Opcode::Sub,
        Opcode::Shr,
        Opcode::Subn,
        Opcode::Shl,
        Opcode::Srne,
        Opcode::Ldi,
        Opcode::Jp0,
        Opcode::Rnd,
        Opcode::Drw,
        Opcode::Skp,
        Opcode::Sknp,
        Opcode::LdVxDt,
        Opcode::LdVxK,
        Opcode::LdDtVx,
        Opcode::LdStVx,
        Opcode::AddIVx,
        Opcode::LdF,
        Opcode::LdB,
        Opcode::LdIVx,
        Opcode::LdVxI,
    ];

    pub fn definition(self) -> Definition {
        let (name, operands) = match self {
            Opcode::Unknown => ("UNKNOWN", NONE),
            Opcode::Sys => ("SYS", ADDR),
            Opcode::Cls => ("CLS", NONE),
            Opcode::Ret => ("RET", NONE),
            Opcode::Jp => ("JP", ADDR),
            Opcode::Call => ("CALL", ADDR),
            Opcode::Se => ("SE", VX_BYTE),
            Opcode::Sne => ("SNE", VX_BYTE),
            Opcode::Sre => ("SRE", VX_VY),
            Opcode::Ld => ("LD", VX_BYTE),
            Opcode::Add => ("ADD", VX_BYTE),
            Opcode::LdVxVy => ("LDVxVy", VX_VY),
            Opcode::Or => ("OR", VX_VY),
            Opcode::And => ("AND", VX_VY),
            Opcode::Xor => ("XOR", VX_VY),
            Opcode::AddVxVy => ("ADDVxVy", VX_VY),
            Opcode::Sub => ("SUB", VX_VY),
            Opcode::Shr => ("SHR", VX),
            Opcode::Subn => ("SUBN", VX_VY),
            Opcode::Shl => ("SHL", VX),
            Opcode::Srne => ("SRNE", VX_VY),
            Opcode::Ldi => ("LDI", ADDR),
            Opcode::Jp0 => ("JP0", ADDR),
            Opcode::Rnd => ("RND", VX_BYTE),
            Opcode::Drw => ("DRW", VX_VY_N),
            Opcode::Skp => ("SKP", VX),
            Opcode::Sknp => ("SKNP", VX),
            Opcode::LdVxDt => ("LDVxDT", VX),
            Opcode::LdVxK => ("LDVxK", VX),
            Opcode::LdDtVx => ("LDDTVx", VX),
            Opcode::LdStVx => ("LDSTVx", VX),
            Opcode::AddIVx => ("ADDIVx", VX),
            Opcode::LdF => ("LDF", VX),
            Opcode::LdB => ("LDB", VX),
            Opcode::LdIVx => ("LDIVx", VX),
            Opcode::LdVxI => ("LDVxI", VX),
        };
        Definition { name, operands }
    }
}

/// a raw instruction word
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction(pub u16);

impl Instruction {
    pub fn from_bytes(hi: u8, lo: u8) -> Self {
        Instruction(u16::from_be_bytes([hi, lo]))
    }

    /// high nibble of the high byte
    pub fn selector(self) -> u8 {
        (self.0 >> 12) as u8
    }

    pub fn x(self) -> usize {
        Field::X.read(self.0) as usize
    }

    pub fn y(self) -> usize {
        Field::Y.read(self.0) as usize
    }

    pub fn n(self) -> u8 {
        Field::N.read(self.0) as u8
    }

    pub fn kk(self) -> u8 {
        Field::Kk.read(self.0) as u8
    }

    pub fn nnn(self) -> u16 {
        Field::Nnn.read(self.0)
    }

    /// work out which instruction this word is. total over all 65536 words.
    pub fn classify(self) -> Opcode {
        match self.selector() {
            0x0 => match self.nnn() {
                0x0e0 => Opcode::Cls,
                0x0ee => Opcode::Ret,
                _ => Opcode::Sys,
            },
            0x1 => Opcode::Jp,
            0x2 => Opcode::Call,
            0x3 => Opcode::Se,
            0x4 => Opcode::Sne,
            0x5 => Opcode::Sre,
            0x6 => Opcode::Ld,
            0x7 => Opcode::Add,
            0x8 => match self.n() {
                0x0 => Opcode::LdVxVy,
                0x1 => Opcode::Or,
                0x2 => Opcode::And,
                0x3 => Opcode::Xor,
                0x4 => Opcode::AddVxVy,
                0x5 => Opcode::Sub,
                0x6 => Opcode::Shr,
                0x7 => Opcode::Subn,
                0xe => Opcode::Shl,
                _ => Opcode::Unknown,
            },
            0x9 => Opcode::Srne,
            0xa => Opcode::Ldi,
            0xb => Opcode::Jp0,
            0xc => Opcode::Rnd,
            0xd => Opcode::Drw,
            0xe => match self.kk() {
                0x9e => Opcode::Skp,
                0xa1 => Opcode::Sknp,
                _ => Opcode::Unknown,
            },
            0xf => match self.kk() {
                0x07 => Opcode::LdVxDt,
                0x0a => Opcode::LdVxK,
                0x15 => Opcode::LdDtVx,
                0x18 => Opcode::LdStVx,
                0x1e => Opcode::AddIVx,
                0x29 => Opcode::LdF,
                0x33 => Opcode::LdB,
                0x55 => Opcode::LdIVx,
                0x65 => Opcode::LdVxI,
                _ => Opcode::Unknown,
            },
            _ => Opcode::Unknown,
        }
    }

    /// the operands of `op`, in definition order
    pub fn operands(self, op: Opcode) -> Vec<u16> {
        op.definition()
            .operands
            .iter()
            .map(|field| field.read(self.0))
            .collect()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = self.classify();
        if op == Opcode::Unknown {
            return write!(f, "UNKNOWN {}", self.0);
        }
        f.write_str(op.definition().name)?;
        for operand in self.operands(op) {
            write!(f, " {}", operand)?;
        }
        Ok(())
    }
}

/// one line per instruction word, prefixed with its decimal address.
/// a trailing odd byte is ignored.
pub fn disassemble(program: &[u8], origin: u16) -> String {
    let mut out = String::new();
    for (i, word) in program.chunks_exact(2).enumerate() {
        let addr = origin as usize + i * 2;
        let ins = Instruction::from_bytes(word[0], word[1]);
        out.push_str(&format!("{:04} {}\n", addr, ins));
    }
    out
}
