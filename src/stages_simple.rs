//! Primitive implementation of 5 stages
//! Shared by the pipelined and the single-cycle implementations.

use crate::alu::alu;
use crate::cpu::CPUState;
use crate::cpu::UNDEFINED;
use crate::error::SimulatorResult;
use crate::instruction::Instruction;
use crate::instruction::InstructionClass;
use crate::instruction::Opcode;
use crate::loader::Program;
use crate::memory::StorageInterface;
use crate::pipelined::pipeline::Latch;

/// IF: Fetch the instruction stored at `pc`
/// Addresses outside the program read as NOP.
pub fn instruction_fetch(
    program: &Program,
    pc: u32,
    base_address: u32,
) -> Instruction {
    match pc.checked_sub(base_address) {
        Some(offset) => program.fetch((offset / 4) as usize),
        None => Instruction::nop(),
    }
}

/// ID: Register read into (A, B)
pub fn register_read(inst: &Instruction, cpu: &CPUState) -> (Latch, Latch) {
    let (src1, src2) = inst.sources();
    (cpu.operand(src1), cpu.operand(src2))
}

/// ID: Immediate as seen by the IMM latch
pub fn immediate(inst: &Instruction) -> Latch {
    match inst.class() {
        InstructionClass::RegisterOp => None,
        _ => inst.immediate.map(sign_extend),
    }
}

/// Negative immediates get all ones in the upper half
pub fn sign_extend(imm: i32) -> u32 {
    if imm < 0 {
        0xFFFF_0000 | imm as u32
    } else {
        imm as u32
    }
}

/// EX: Compute stuff
pub fn execute(
    inst: &Instruction,
    a: Latch,
    b: Latch,
    imm: Latch,
    npc: Latch,
) -> Latch {
    alu(
        inst.opcode,
        a.unwrap_or(UNDEFINED),
        b.unwrap_or(UNDEFINED),
        imm.unwrap_or(UNDEFINED),
        npc.unwrap_or(UNDEFINED),
    )
}

/// MEM: Access memory
/// Stores write a little-endian word; loads read a single byte into LMD.
pub fn memory_access(
    inst: &Instruction,
    mem: &mut impl StorageInterface,
    address: Latch,
    store_data: Latch,
) -> SimulatorResult<Latch> {
    let address = address.unwrap_or(UNDEFINED);
    match inst.opcode {
        Opcode::Sw => {
            let value = store_data.unwrap_or(UNDEFINED);
            tracing::trace!("store {:#010x} <- {:#010x}", address, value);
            mem.set32(address, value)?;
            Ok(None)
        }
        Opcode::Lw => {
            let byte = mem.get8(address)?;
            tracing::trace!("load {:#010x} -> {:#04x}", address, byte);
            Ok(Some(byte as u32))
        }
        _ => Ok(None),
    }
}

/// Bytes above 127 are negative
pub fn extend_loaded_byte(byte: u8) -> i32 {
    byte as i8 as i32
}

/// WB: Commit the result to the register file
/// Returns true when a real instruction retires.
pub fn write_back(
    inst: &Instruction,
    cpu: &mut CPUState,
    alu_output: Latch,
    lmd: Latch,
) -> bool {
    let retired = match inst.class() {
        InstructionClass::RegisterOp | InstructionClass::ImmediateOp => {
            cpu.write_gpr(inst.dest, alu_output.map(|v| v as i32));
            true
        }
        InstructionClass::Memory => {
            if inst.opcode == Opcode::Lw {
                let value = lmd.map(|v| extend_loaded_byte(v as u8));
                cpu.write_gpr(inst.dest, value);
            }
            true
        }
        InstructionClass::Branch => true,
        InstructionClass::EndOfProgram | InstructionClass::NoOp => false,
    };
    if retired {
        cpu.history.inst_count += 1;
    }
    retired
}
