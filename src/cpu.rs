//! DLX CPU architectural state

use crate::error::SimulatorError;
use crate::error::SimulatorResult;
use crate::instruction::NUM_GP_REGISTERS;

/// Value reported for registers and latches that hold nothing
pub const UNDEFINED: u32 = 0xFFFF_FFFF;

/// CPU state
#[derive(Clone, Debug)]
pub struct CPUState {
    /// General purpose registers
    pub gpr: [Register; NUM_GP_REGISTERS],

    /// CPU policy
    pub policy: CPUPolicy,

    /// History of execution
    pub history: CPUHistory,
}

impl CPUState {
    pub fn make(policy: CPUPolicy) -> Self {
        Self {
            gpr: [Register::default(); NUM_GP_REGISTERS],
            policy,
            history: CPUHistory::default(),
        }
    }

    /// Reads a register by an index that may be unset.
    /// Unset or out-of-range indices read as undefined.
    pub fn read_gpr(&self, index: Option<usize>) -> Option<i32> {
        index.and_then(|i| self.gpr.get(i)).and_then(Register::read)
    }

    /// Register value as seen by the A/B latches
    pub fn operand(&self, index: Option<usize>) -> Option<u32> {
        self.read_gpr(index).map(|v| v as u32)
    }

    /// Writes a register; unset or out-of-range indices are ignored
    pub fn write_gpr(&mut self, index: Option<usize>, value: Option<i32>) {
        if let Some(reg) = index.and_then(|i| self.gpr.get_mut(i)) {
            reg.write(value);
        }
    }
}

/// Register file simulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Register {
    /// Current data in the register, `None` until first written
    data: Option<i32>,
}

impl Register {
    /// Reads the register
    pub fn read(&self) -> Option<i32> {
        self.data
    }

    /// Writes to register
    pub fn write(&mut self, value: Option<i32>) {
        self.data = value;
    }
}

/// Implementation enum
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Implementation {
    SingleCycle,
    #[default]
    Pipelined,
}

/// CPU policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CPUPolicy {
    pub implementation: Implementation,
    /// Data memory size in bytes
    pub data_memory_size: usize,
    /// Extra cycles spent by each data memory access
    pub data_memory_latency: u32,
    /// Address of the first instruction
    pub base_address: u32,
    /// Abort a run after this many cycles; 0 runs to completion
    pub max_cycles: u64,
    pub history: bool,
}

impl Default for CPUPolicy {
    fn default() -> Self {
        Self {
            implementation: Implementation::default(),
            data_memory_size: 1024,
            data_memory_latency: 0,
            base_address: 0x1000_0000,
            max_cycles: 0,
            history: false,
        }
    }
}

impl CPUPolicy {
    pub fn validate(&self) -> SimulatorResult<()> {
        if self.data_memory_size == 0 {
            return Err(SimulatorError::ConfigError(
                "data memory size must be positive".to_string(),
            ));
        }
        if self.data_memory_size > u32::MAX as usize {
            return Err(SimulatorError::ConfigError(format!(
                "data memory size {:#x} exceeds the 32-bit address space",
                self.data_memory_size
            )));
        }
        if self.base_address % 4 != 0 {
            return Err(SimulatorError::ConfigError(format!(
                "base address {:#010x} is not word aligned",
                self.base_address
            )));
        }
        Ok(())
    }
}

/// History module
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CPUHistory {
    pub cycle_count: u64,
    pub inst_count: u64,
    /// Cycles lost to RAW hazards
    pub data_stall_count: u64,
    /// Cycles lost to unresolved branches
    pub control_stall_count: u64,
    /// Cycles lost to data memory latency
    pub mem_stall_count: u64,
}

impl CPUHistory {
    pub fn stall_count(&self) -> u64 {
        self.data_stall_count + self.control_stall_count + self.mem_stall_count
    }

    /// Instructions per cycle; 0 before the first cycle
    pub fn ipc(&self) -> f64 {
        if self.cycle_count == 0 {
            0.0
        } else {
            self.inst_count as f64 / self.cycle_count as f64
        }
    }

    /// Cycles per instruction; 0 before the first retirement
    pub fn cpi(&self) -> f64 {
        if self.inst_count == 0 {
            0.0
        } else {
            self.cycle_count as f64 / self.inst_count as f64
        }
    }
}
