//! Instruction representation

use std::fmt;
use std::str::FromStr;

pub mod parse_helper;

/// Number of general purpose registers
pub const NUM_GP_REGISTERS: usize = 32;

/// Decoded instruction, copied by value through the pipeline latches
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    /// Opcode
    pub opcode: Opcode,
    /// Source register #1
    pub src1: Option<usize>,
    /// Source register #2
    pub src2: Option<usize>,
    /// Destination register
    pub dest: Option<usize>,
    /// Immediate field, branch offsets already resolved
    pub immediate: Option<i32>,
}

impl Instruction {
    /// A clean bubble
    pub const fn nop() -> Self {
        Self {
            opcode: Opcode::Nop,
            src1: None,
            src2: None,
            dest: None,
            immediate: None,
        }
    }

    pub fn class(&self) -> InstructionClass {
        self.opcode.class()
    }

    pub fn is_nop(&self) -> bool {
        self.opcode == Opcode::Nop
    }

    pub fn is_eop(&self) -> bool {
        self.opcode == Opcode::Eop
    }

    /// Registers read in ID, in (src1, src2) order
    pub fn sources(&self) -> (Option<usize>, Option<usize>) {
        match self.class() {
            InstructionClass::RegisterOp => (self.src1, self.src2),
            InstructionClass::Memory if self.opcode == Opcode::Sw => {
                (self.src1, self.src2)
            }
            InstructionClass::ImmediateOp
            | InstructionClass::Memory
            | InstructionClass::Branch => (self.src1, None),
            InstructionClass::EndOfProgram | InstructionClass::NoOp => {
                (None, None)
            }
        }
    }
}

impl Default for Instruction {
    fn default() -> Self {
        Self::nop()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reg = |r: Option<usize>| match r {
            Some(r) => format!("R{}", r),
            None => "R?".to_string(),
        };
        let imm = self.immediate.unwrap_or_default();
        match self.class() {
            InstructionClass::RegisterOp => write!(
                f,
                "{} {} {} {}",
                self.opcode,
                reg(self.dest),
                reg(self.src1),
                reg(self.src2)
            ),
            InstructionClass::ImmediateOp => write!(
                f,
                "{} {} {} {}",
                self.opcode,
                reg(self.dest),
                reg(self.src1),
                imm
            ),
            InstructionClass::Memory => {
                let target = match self.opcode {
                    Opcode::Sw => self.src2,
                    _ => self.dest,
                };
                write!(
                    f,
                    "{} {} {}({})",
                    self.opcode,
                    reg(target),
                    imm,
                    reg(self.src1)
                )
            }
            InstructionClass::Branch if self.opcode == Opcode::Jump => {
                write!(f, "{} {:+}", self.opcode, imm)
            }
            InstructionClass::Branch => {
                write!(f, "{} {} {:+}", self.opcode, reg(self.src1), imm)
            }
            InstructionClass::EndOfProgram | InstructionClass::NoOp => {
                write!(f, "{}", self.opcode)
            }
        }
    }
}

/// DLX opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    Lw,
    Sw,
    Add,
    Addi,
    Sub,
    Subi,
    Xor,
    Beqz,
    Bnez,
    Bltz,
    Bgtz,
    Blez,
    Bgez,
    Jump,
    Eop,
    Nop,
}

/// Disjoint behaviour classes used by the stage logic
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionClass {
    /// ADD, SUB, XOR
    RegisterOp,
    /// ADDI, SUBI
    ImmediateOp,
    /// LW, SW
    Memory,
    /// Conditional branches and JUMP
    Branch,
    EndOfProgram,
    NoOp,
}

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Opcode::Lw,
        Opcode::Sw,
        Opcode::Add,
        Opcode::Addi,
        Opcode::Sub,
        Opcode::Subi,
        Opcode::Xor,
        Opcode::Beqz,
        Opcode::Bnez,
        Opcode::Bltz,
        Opcode::Bgtz,
        Opcode::Blez,
        Opcode::Bgez,
        Opcode::Jump,
        Opcode::Eop,
        Opcode::Nop,
    ];

    pub fn class(self) -> InstructionClass {
        use Opcode::*;
        match self {
            Add | Sub | Xor => InstructionClass::RegisterOp,
            Addi | Subi => InstructionClass::ImmediateOp,
            Lw | Sw => InstructionClass::Memory,
            Beqz | Bnez | Bltz | Bgtz | Blez | Bgez | Jump => {
                InstructionClass::Branch
            }
            Eop => InstructionClass::EndOfProgram,
            Nop => InstructionClass::NoOp,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        use Opcode::*;
        match self {
            Lw => "LW",
            Sw => "SW",
            Add => "ADD",
            Addi => "ADDI",
            Sub => "SUB",
            Subi => "SUBI",
            Xor => "XOR",
            Beqz => "BEQZ",
            Bnez => "BNEZ",
            Bltz => "BLTZ",
            Bgtz => "BGTZ",
            Blez => "BLEZ",
            Bgez => "BGEZ",
            Jump => "JUMP",
            Eop => "EOP",
            Nop => "NOP",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Opcode::ALL.into_iter().find(|op| op.mnemonic() == s).ok_or(())
    }
}
