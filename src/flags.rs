use std::path::PathBuf;
use std::str::FromStr;

use crate::cpu::Implementation;

xflags::xflags! {
    /// DLX five-stage pipeline simulator.
    cmd DlxSimArgs {
        /// Path to the assembly program to simulate.
        required program: PathBuf

        /// Enables history module, printing cycle, instruction and stall
        /// counts after simulation.
        optional --history

        /// Specifies the simulator implementation.
        /// P: Pipelined (default)
        /// S: Naive single-cycle
        optional -i, --implementation backend: BackendArg

        /// Data memory size in bytes (default 1024).
        optional -m, --memory-size size: usize

        /// Extra cycles spent by every data memory access (default 0).
        optional -l, --latency latency: u32

        /// Address of the first instruction (default 0x10000000).
        optional -b, --base-address address: Address

        /// Aborts the simulation after this many cycles.
        optional -c, --cycles cycles: u64

        /// Prints data memory in START:END after simulation, e.g. 0x0:0x40.
        optional --dump-memory range: MemoryRange

        /// Enables verbose mode; repeat for per-stage tracing.
        repeated -v, --verbose
    }
}

#[derive(Debug)]
pub enum BackendArg {
    Pipelined,
    SingleCycle,
}

impl FromStr for BackendArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "P" => Ok(BackendArg::Pipelined),
            "S" => Ok(BackendArg::SingleCycle),
            _ => Err(format!(
                "Invalid implementation: '{}'. Expected 'P' or 'S'.",
                s
            )),
        }
    }
}

impl From<BackendArg> for Implementation {
    fn from(val: BackendArg) -> Self {
        match val {
            BackendArg::Pipelined => Implementation::Pipelined,
            BackendArg::SingleCycle => Implementation::SingleCycle,
        }
    }
}

/// A 32-bit address, decimal or `0x` hex
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address(pub u32);

impl FromStr for Address {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => s.parse::<u32>(),
        };
        parsed
            .map(Address)
            .map_err(|e| format!("Invalid address: '{}': {}", s, e))
    }
}

/// Half-open address range written as `START:END`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u32,
    pub end: u32,
}

impl FromStr for MemoryRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once(':').ok_or_else(|| {
            format!("Invalid memory range: '{}'. Expected START:END.", s)
        })?;
        let Address(start) = start.parse()?;
        let Address(end) = end.parse()?;
        if start > end {
            return Err(format!(
                "Invalid memory range: start {:#x} is past end {:#x}",
                start, end
            ));
        }
        Ok(MemoryRange { start, end })
    }
}
