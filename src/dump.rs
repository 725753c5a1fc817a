//! Textual dumps of the simulator state

use crate::cpu::CPUState;
use crate::error::SimulatorResult;
use crate::instruction::NUM_GP_REGISTERS;
use crate::memory::StorageInterface;
use crate::pipelined::pipeline::SpRegister;
use crate::pipelined::pipeline::Stage;
use crate::pipelined::Simulator;

/// Every defined pipeline latch, stage by stage, then every defined GPR.
/// IR and COND are left out.
pub fn registers(sim: &Simulator) -> String {
    let mut out = String::from("Special purpose registers:\n");
    for stage in Stage::ALL {
        out += &format!("Stage: {}\n", stage);
        for reg in SpRegister::ALL {
            if matches!(reg, SpRegister::IR | SpRegister::COND) {
                continue;
            }
            if let Some(value) = sim.sp_register(reg, stage) {
                out += &format!("{} = {} / 0x{:x}\n", reg, value, value);
            }
        }
    }
    out + &gp_registers(sim.cpu())
}

/// Every defined GPR
pub fn gp_registers(cpu: &CPUState) -> String {
    let mut out = String::from("General purpose registers:\n");
    for index in 0..NUM_GP_REGISTERS {
        if let Some(value) = cpu.read_gpr(Some(index)) {
            out += &format!("R{} = {} / 0x{:x}\n", index, value, value as u32);
        }
    }
    out
}

/// Bytes in `[start, end)`, four per line, each line headed by the
/// address of its first word
pub fn memory(
    mem: &impl StorageInterface,
    start: u32,
    end: u32,
) -> SimulatorResult<String> {
    let mut out = format!("data_memory[{:#010x}:{:#010x}]\n", start, end);
    for address in start..end {
        let byte = mem.get8(address)?;
        if address % 4 == 0 {
            out += &format!("{:#010x}: ", address);
        }
        out += &format!("{:02x} ", byte);
        if address % 4 == 3 {
            out.push('\n');
        }
    }
    Ok(out)
}
