//! Pipeline state
use std::fmt;

use crate::instruction::Instruction;

/// A latch value; `None` when the latch is not meaningful for the
/// instruction it travels with
pub type Latch = Option<u32>;

/// Pipeline state = PC + 4 pipeline registers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineState {
    /// PC at the entrance of IF
    pub pc: Latch,
    pub if_id: IFIDRegister,
    pub id_ex: IDEXRegister,
    pub ex_mem: EXMEMRegister,
    pub mem_wb: MEMWBRegister,
}

impl PipelineState {
    /// RAW conflict: a source of `inst` is the destination of the
    /// instruction in EX/MEM or MEM/WB, i.e. not yet written back.
    /// Indices that are unset never match.
    pub fn raw_conflict(&self, inst: &Instruction) -> bool {
        let (src1, src2) = inst.sources();
        let producers = [self.ex_mem.inst.dest, self.mem_wb.inst.dest];
        [src1, src2]
            .into_iter()
            .flatten()
            .any(|src| producers.contains(&Some(src)))
    }

    /// Instruction held in the latch at the entrance of a stage
    pub fn instruction(&self, stage: Stage) -> Option<Instruction> {
        match stage {
            Stage::IF => None,
            Stage::ID => Some(self.if_id.inst),
            Stage::EX => Some(self.id_ex.inst),
            Stage::MEM => Some(self.ex_mem.inst),
            Stage::WB => Some(self.mem_wb.inst),
        }
    }

    /// Latch value at the entrance of a stage.
    /// Pairs that carry no latch, and IR, read as `None`.
    pub fn latch(&self, reg: SpRegister, stage: Stage) -> Latch {
        use SpRegister::*;
        use Stage::*;
        match (reg, stage) {
            (PC, IF) => self.pc,
            (NPC, ID) => self.if_id.npc,
            (NPC, EX) => self.id_ex.npc,
            (A, EX) => self.id_ex.a,
            (B, EX) => self.id_ex.b,
            (IMM, EX) => self.id_ex.imm,
            (ALU_OUTPUT, MEM) => self.ex_mem.alu_output,
            (B, MEM) => self.ex_mem.b,
            (COND, MEM) => self.ex_mem.cond,
            (ALU_OUTPUT, WB) => self.mem_wb.alu_output,
            (LMD, WB) => self.mem_wb.lmd,
            (COND, WB) => self.mem_wb.cond,
            _ => None,
        }
    }
}

/// Named special purpose registers
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpRegister {
    PC,
    NPC,
    IR,
    A,
    B,
    IMM,
    COND,
    ALU_OUTPUT,
    LMD,
}

impl SpRegister {
    pub const ALL: [SpRegister; 9] = [
        SpRegister::PC,
        SpRegister::NPC,
        SpRegister::IR,
        SpRegister::A,
        SpRegister::B,
        SpRegister::IMM,
        SpRegister::COND,
        SpRegister::ALU_OUTPUT,
        SpRegister::LMD,
    ];
}

impl fmt::Display for SpRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Pipeline stages, in program order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    IF,
    ID,
    EX,
    MEM,
    WB,
}

impl Stage {
    pub const ALL: [Stage; 5] =
        [Stage::IF, Stage::ID, Stage::EX, Stage::MEM, Stage::WB];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// IF/ID register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IFIDRegister {
    /// Fetched instruction
    pub inst: Instruction,

    /// Next sequential PC
    pub npc: Latch,
}

/// ID/EX register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IDEXRegister {
    /// Decoded instruction
    pub inst: Instruction,

    pub npc: Latch,

    /// Operand 1, read from src1
    pub a: Latch,
    /// Operand 2, read from src2
    pub b: Latch,

    /// Sign-extended immediate
    pub imm: Latch,
}

/// EX/MEM register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EXMEMRegister {
    pub inst: Instruction,

    /// ALU result, effective address or branch resolution address
    pub alu_output: Latch,

    /// Store data
    pub b: Latch,

    /// `Some(0)` when a branch is taken
    pub cond: Latch,
}

/// MEM/WB register
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MEMWBRegister {
    pub inst: Instruction,

    pub alu_output: Latch,

    /// Loaded byte
    pub lmd: Latch,

    pub cond: Latch,
}
