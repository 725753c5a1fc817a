//! Single cycle implementation
//! Every instruction completes in one cycle, so there are no hazards.

use crate::cpu::CPUState;
use crate::cpu::UNDEFINED;
use crate::error::ExecutionError;
use crate::error::SimulatorResult;
use crate::instruction::InstructionClass;
use crate::loader::Program;
use crate::memory::StorageInterface;
use crate::stages_simple::*;

/// Returns the address of the EOP that ended the program
pub fn run(
    cpu: &mut CPUState,
    mem: &mut impl StorageInterface,
    program: &Program,
) -> SimulatorResult<u32> {
    let base = cpu.policy.base_address;
    let mut pc = base;
    loop {
        let limit = cpu.policy.max_cycles;
        if limit != 0 && cpu.history.cycle_count >= limit {
            return Err(ExecutionError::CycleLimitReached(limit).into());
        }

        // IF
        let inst = instruction_fetch(program, pc, base);
        if inst.is_eop() {
            tracing::info!(
                cycles = cpu.history.cycle_count,
                instructions = cpu.history.inst_count,
                "EOP reached at {:#010x}",
                pc
            );
            return Ok(pc);
        }
        let npc = pc.wrapping_add(4);
        tracing::debug!("PC: {:#010x} {}", pc, inst);

        // ID
        let (a, b) = register_read(&inst, cpu);
        let imm = immediate(&inst);
        // EX
        let alu_output = execute(&inst, a, b, imm, Some(npc));
        // MEM
        let lmd = memory_access(&inst, mem, alu_output, b)?;
        // WB
        write_back(&inst, cpu, alu_output, lmd);

        pc = npc;
        if inst.class() == InstructionClass::Branch
            && crate::alu::taken(inst.opcode, a.unwrap_or(UNDEFINED))
        {
            let target = alu_output.unwrap_or(UNDEFINED);
            tracing::debug!("branching from {:#010x} to {:#010x}", npc, target);
            pc = target;
        }
        cpu.history.cycle_count += 1;
    }
}
