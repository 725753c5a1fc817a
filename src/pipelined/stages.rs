//! 5 stages adapted for pipelined execution
//!
//! Stages run in reverse order within a cycle: WB, MEM, EX, ID, IF.
//! Each stage reads its input latch from `current_state` and writes its
//! output latch into `next_state`. The RAW check in ID and the branch
//! redirect in IF look at the downstream latches in `next_state`, i.e.
//! as already committed by the stages ahead of them in this cycle.

use super::hazards::HazardUnit;
use super::pipeline::PipelineState;
use crate::cpu::CPUState;
use crate::cpu::UNDEFINED;
use crate::error::SimulatorResult;
use crate::instruction::Instruction;
use crate::instruction::InstructionClass;
use crate::instruction::Opcode;
use crate::loader::Program;
use crate::memory::StorageInterface;
use crate::stages_simple;

/// Result of the WB stage
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteBack {
    Continue,
    /// EOP reached WB
    Halt,
}

/// Adds `offset` to a latch value, unset latches read as all ones
fn offset(latch: Option<u32>, offset: u32) -> u32 {
    latch.unwrap_or(UNDEFINED).wrapping_add(offset)
}

/// IF stage
pub fn instruction_fetch(
    cpu: &mut CPUState,
    program: &Program,
    hazards: &mut HazardUnit,
    current_state: &PipelineState,
    next_state: &mut PipelineState,
) {
    let base = cpu.policy.base_address;
    let pc = current_state.pc;
    let fetch = |pc: Option<u32>| match pc {
        Some(pc) => stages_simple::instruction_fetch(program, pc, base),
        None => Instruction::nop(),
    };

    if hazards.structural.raised {
        // The front end holds while the memory port is busy
        hazards.structural.frozen = true;
        if hazards.raw.raised {
            return;
        }
        if hazards.control.raised {
            // Branch held in ID/EX by the freeze; one bubble covers it
            hazards.structural.pc_temp = pc;
            next_state.if_id.inst = Instruction::nop();
            next_state.if_id.npc = None;
            if !hazards.control.in_id {
                hazards.control.in_id = true;
                cpu.history.control_stall_count += 1;
                tracing::trace!("control hazard: fetch suppressed in freeze");
            }
            return;
        }
        let inst = fetch(pc);
        hazards.structural.pc_temp = Some(offset(pc, 4));
        next_state.if_id.inst = inst;
        if !inst.is_eop() {
            next_state.if_id.npc = Some(offset(pc, 4));
            let latency = cpu.policy.data_memory_latency;
            if hazards.structural.latency_tracker == latency {
                next_state.pc = Some(offset(pc, 4));
            }
        }
        return;
    }

    if hazards.raw.raised {
        // Re-present the stalled instruction to ID
        return;
    }

    if hazards.control.raised {
        next_state.if_id.inst = Instruction::nop();
        next_state.if_id.npc = None;
        hazards.control.in_id = true;
        cpu.history.control_stall_count += 1;
        tracing::trace!("control hazard: fetch suppressed");
        return;
    }

    let mem_wb = &next_state.mem_wb;
    if mem_wb.inst.class() == InstructionClass::Branch
        && mem_wb.cond == Some(0)
    {
        // Taken branch resolved in MEM this cycle
        let target = mem_wb.alu_output;
        tracing::debug!(
            "redirect to {:#010x}",
            target.unwrap_or(UNDEFINED)
        );
        next_state.if_id.inst = fetch(target);
        next_state.pc = Some(offset(target, 4));
        next_state.if_id.npc = next_state.pc;
        return;
    }

    let inst = fetch(pc);
    next_state.if_id.inst = inst;
    if inst.is_eop() {
        // PC stays on EOP
        next_state.if_id.npc = pc;
        next_state.id_ex.npc = pc;
    } else {
        next_state.pc = Some(offset(pc, 4));
        next_state.if_id.npc = next_state.pc;
    }
}

/// ID stage
pub fn instruction_decode(
    cpu: &mut CPUState,
    hazards: &mut HazardUnit,
    current_state: &PipelineState,
    next_state: &mut PipelineState,
) {
    let inst = current_state.if_id.inst;

    match inst.class() {
        InstructionClass::RegisterOp
        | InstructionClass::ImmediateOp
        | InstructionClass::Memory
        | InstructionClass::Branch => {
            if inst.class() == InstructionClass::Branch {
                hazards.control.raised = true;
            }

            if next_state.raw_conflict(&inst) {
                hazards.raw.raised = true;
                cpu.history.data_stall_count += 1;
                tracing::trace!("RAW hazard: holding {}", inst);
            }

            let id_ex = &mut next_state.id_ex;
            if hazards.raw.raised {
                // Bubble into EX
                id_ex.inst.opcode = Opcode::Nop;
                id_ex.a = None;
                id_ex.b = None;
                id_ex.imm = None;
                id_ex.npc = None;
                hazards.raw.in_ex = true;
            } else {
                let (a, b) = stages_simple::register_read(&inst, cpu);
                id_ex.inst = inst;
                id_ex.a = a;
                id_ex.b = b;
                id_ex.imm = stages_simple::immediate(&inst);
                id_ex.npc = current_state.if_id.npc;
            }
        }
        InstructionClass::EndOfProgram => {
            let id_ex = &mut next_state.id_ex;
            id_ex.inst = inst;
            id_ex.a = None;
            id_ex.b = None;
            id_ex.imm = None;
        }
        InstructionClass::NoOp => {
            if hazards.control.in_id {
                hazards.control.in_id = false;
                hazards.control.in_ex = true;
            }
            let id_ex = &mut next_state.id_ex;
            id_ex.inst = inst;
            id_ex.a = None;
            id_ex.b = None;
            id_ex.imm = None;
            id_ex.npc = None;
        }
    }
}

/// EX stage
pub fn execute(
    cpu: &CPUState,
    hazards: &mut HazardUnit,
    current_state: &PipelineState,
    next_state: &mut PipelineState,
) {
    let id_ex = current_state.id_ex;
    let inst = id_ex.inst;
    let ex_mem = &mut next_state.ex_mem;

    match inst.class() {
        InstructionClass::RegisterOp
        | InstructionClass::ImmediateOp
        | InstructionClass::Memory => {
            if inst.class() == InstructionClass::Memory
                && cpu.policy.data_memory_latency > 0
            {
                hazards.structural.raised = true;
                tracing::trace!("structural hazard: {} heading to MEM", inst);
            }
            ex_mem.inst = inst;
            ex_mem.alu_output = stages_simple::execute(
                &inst, id_ex.a, id_ex.b, id_ex.imm, id_ex.npc,
            );
            ex_mem.b = id_ex.b;
            ex_mem.cond = None;
        }
        InstructionClass::Branch => {
            let a = id_ex.a.unwrap_or(UNDEFINED);
            ex_mem.inst = inst;
            ex_mem.b = None;
            if crate::alu::taken(inst.opcode, a) {
                ex_mem.cond = Some(0);
                ex_mem.alu_output = stages_simple::execute(
                    &inst, id_ex.a, id_ex.b, id_ex.imm, id_ex.npc,
                );
            } else {
                // Fall through, resolved against the PC in IF
                ex_mem.cond = None;
                ex_mem.alu_output = Some(offset(current_state.pc, 8));
            }
            tracing::trace!(
                "{} resolved: taken={}",
                inst,
                ex_mem.cond.is_some()
            );
        }
        InstructionClass::EndOfProgram => {
            ex_mem.inst = inst;
            ex_mem.alu_output = None;
            ex_mem.cond = None;
            ex_mem.b = None;
        }
        InstructionClass::NoOp => {
            let mut bubble = Instruction::nop();
            if hazards.raw.in_ex {
                hazards.raw.raised = false;
                hazards.raw.in_ex = false;
                hazards.raw.in_mem = true;
            }
            if hazards.control.in_ex {
                hazards.control.in_ex = false;
                hazards.control.in_mem = true;
                bubble = inst;
            }
            ex_mem.inst = bubble;
            ex_mem.alu_output = None;
            ex_mem.b = None;
            ex_mem.cond = None;
        }
    }
}

/// MEM stage
pub fn memory_access(
    cpu: &mut CPUState,
    mem: &mut impl StorageInterface,
    hazards: &mut HazardUnit,
    current_state: &PipelineState,
    next_state: &mut PipelineState,
) -> SimulatorResult<()> {
    let ex_mem = current_state.ex_mem;
    let inst = ex_mem.inst;
    let mem_wb = &mut next_state.mem_wb;

    match inst.class() {
        InstructionClass::RegisterOp | InstructionClass::ImmediateOp => {
            mem_wb.inst = inst;
            mem_wb.alu_output = ex_mem.alu_output;
            mem_wb.lmd = None;
            mem_wb.cond = None;
        }
        InstructionClass::Memory => {
            mem_wb.cond = None;
            let latency = cpu.policy.data_memory_latency;
            let mut ready = true;
            if hazards.structural.raised {
                hazards.structural.latency_tracker += 1;
                if hazards.access_complete(latency) {
                    hazards.release_memory();
                    tracing::trace!("memory port released");
                } else {
                    ready = false;
                    mem_wb.inst.opcode = Opcode::Nop;
                    mem_wb.alu_output = None;
                    mem_wb.lmd = None;
                    cpu.history.mem_stall_count += 1;
                }
            }
            if ready {
                mem_wb.inst = inst;
                mem_wb.lmd = stages_simple::memory_access(
                    &inst,
                    mem,
                    ex_mem.alu_output,
                    ex_mem.b,
                )?;
                mem_wb.alu_output = ex_mem.alu_output;
            }
        }
        InstructionClass::Branch => {
            hazards.control.raised = false;
            mem_wb.inst = inst;
            mem_wb.alu_output = if ex_mem.cond == Some(0) {
                ex_mem.alu_output
            } else {
                Some(offset(current_state.pc, 8))
            };
            mem_wb.lmd = None;
            mem_wb.cond = ex_mem.cond;
        }
        InstructionClass::EndOfProgram => {
            mem_wb.inst = inst;
            mem_wb.alu_output = None;
            mem_wb.lmd = None;
            mem_wb.cond = None;
        }
        InstructionClass::NoOp => {
            let mut bubble = Instruction::nop();
            if hazards.raw.in_mem {
                hazards.raw.raised = false;
                hazards.raw.in_mem = false;
            }
            if hazards.control.in_mem {
                hazards.control.in_mem = false;
                bubble = inst;
            }
            mem_wb.inst = bubble;
            mem_wb.alu_output = None;
            mem_wb.lmd = None;
            mem_wb.cond = None;
        }
    }
    Ok(())
}

/// WB stage
pub fn write_back(
    cpu: &mut CPUState,
    current_state: &PipelineState,
) -> WriteBack {
    let mem_wb = current_state.mem_wb;
    if mem_wb.inst.is_eop() {
        return WriteBack::Halt;
    }
    let retired = stages_simple::write_back(
        &mem_wb.inst,
        cpu,
        mem_wb.alu_output,
        mem_wb.lmd,
    );
    if retired {
        tracing::trace!("retired {}", mem_wb.inst);
    }
    WriteBack::Continue
}
