//! A simulator wrapper

use std::path::Path;

use crate::cpu::CPUHistory;
use crate::cpu::CPUPolicy;
use crate::cpu::CPUState;
use crate::cpu::Implementation;
use crate::error::ExecutionError;
use crate::error::SimulatorResult;
use crate::loader;
use crate::loader::Program;
use crate::memory::DataMemory;
use crate::pipelined::Simulator;
use crate::pipelined::StepOutcome;
use crate::single_cycle;

/// State left behind by a completed run
#[derive(Clone, Debug)]
pub struct RunReport {
    pub cpu: CPUState,
    pub memory: DataMemory,
}

impl RunReport {
    pub fn history(&self) -> &CPUHistory {
        &self.cpu.history
    }
}

/// Run simulation on the given assembly file
pub fn run(
    program_file: impl AsRef<Path>,
    policy: CPUPolicy,
) -> SimulatorResult<RunReport> {
    let program = loader::load_program(program_file)?;
    run_program(&program, policy)
}

/// Run an already parsed program until EOP
pub fn run_program(
    program: &Program,
    policy: CPUPolicy,
) -> SimulatorResult<RunReport> {
    policy.validate()?;

    let (cpu, memory) = match policy.implementation {
        Implementation::SingleCycle => {
            let mut cpu = CPUState::make(policy);
            let mut memory = DataMemory::make(policy.data_memory_size);
            single_cycle::run(&mut cpu, &mut memory, program)?;
            (cpu, memory)
        }
        Implementation::Pipelined => {
            let mut sim = Simulator::new(policy)?;
            sim.load_program(program.clone(), policy.base_address);
            if sim.run(policy.max_cycles)? == StepOutcome::Running {
                return Err(
                    ExecutionError::CycleLimitReached(policy.max_cycles).into()
                );
            }
            sim.into_parts()
        }
    };

    if policy.history {
        let history = &cpu.history;
        eprintln!(
            "[HISTORY] # cycles = {}, # instructions = {}",
            history.cycle_count, history.inst_count
        );
        eprintln!(
            "[HISTORY] stalls = {} (data = {}, control = {}, memory = {})",
            history.stall_count(),
            history.data_stall_count,
            history.control_stall_count,
            history.mem_stall_count
        );
        eprintln!(
            "[HISTORY] IPC = {:.3}, CPI = {:.3}",
            history.ipc(),
            history.cpi()
        );
    }

    Ok(RunReport { cpu, memory })
}

/// Runs the program once per data memory latency
pub fn sweep_latencies(
    program: &Program,
    policy: CPUPolicy,
    latencies: impl IntoIterator<Item = u32>,
) -> SimulatorResult<Vec<(u32, CPUHistory)>> {
    latencies
        .into_iter()
        .map(|latency| {
            let policy = CPUPolicy { data_memory_latency: latency, ..policy };
            let report = run_program(program, policy)?;
            tracing::debug!(
                latency,
                cycles = report.history().cycle_count,
                "latency sweep point"
            );
            Ok((latency, report.cpu.history))
        })
        .collect()
}
