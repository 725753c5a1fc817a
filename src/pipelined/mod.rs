//! Pipelined implementation

use std::path::Path;

use crate::cpu::CPUHistory;
use crate::cpu::CPUPolicy;
use crate::cpu::CPUState;
use crate::cpu::UNDEFINED;
use crate::error::ExecutionError;
use crate::error::SimulatorResult;
use crate::instruction::Instruction;
use crate::loader;
use crate::loader::Program;
use crate::memory::DataMemory;
use crate::memory::StorageInterface;
use crate::stages_simple;

use hazards::HazardUnit;
use pipeline::Latch;
use pipeline::PipelineState;
use pipeline::SpRegister;
use pipeline::Stage;
use stages::WriteBack;

pub mod hazards;
pub mod pipeline;
pub mod stages;

/// Whether the program can still make progress
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Running,
    /// EOP has reached WB
    Halted,
}

/// Five-stage pipeline simulator resolving every hazard by stalling
#[derive(Clone, Debug)]
pub struct Simulator {
    cpu: CPUState,
    mem: DataMemory,
    program: Option<Program>,
    hazards: HazardUnit,
    state: PipelineState,
}

impl Simulator {
    pub fn new(policy: CPUPolicy) -> SimulatorResult<Self> {
        policy.validate()?;
        Ok(Self {
            cpu: CPUState::make(policy),
            mem: DataMemory::make(policy.data_memory_size),
            program: None,
            hazards: HazardUnit::default(),
            state: PipelineState::default(),
        })
    }

    /// Simulator with the default policy and the given data memory
    pub fn with_memory(size: usize, latency: u32) -> SimulatorResult<Self> {
        Self::new(CPUPolicy {
            data_memory_size: size,
            data_memory_latency: latency,
            ..CPUPolicy::default()
        })
    }

    /// Returns every register to undefined, memory to 0xFF and statistics
    /// to zero, and drops the loaded program
    pub fn reset(&mut self) {
        let policy = self.cpu.policy;
        self.cpu = CPUState::make(policy);
        self.mem.clear();
        self.program = None;
        self.hazards = HazardUnit::default();
        self.state = PipelineState::default();
    }

    /// Places the program in instruction memory at `base_address`
    pub fn load_program(&mut self, program: Program, base_address: u32) {
        tracing::debug!(
            "loading {} instructions at {:#010x}",
            program.len(),
            base_address
        );
        self.cpu.policy.base_address = base_address;
        self.program = Some(program);
    }

    /// Parses and loads an assembly file
    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        base_address: u32,
    ) -> SimulatorResult<()> {
        let program = loader::load_program(path)?;
        self.load_program(program, base_address);
        Ok(())
    }

    /// Advances the pipeline by one clock edge.
    /// The cycle in which EOP reaches WB is not counted.
    pub fn step(&mut self) -> SimulatorResult<StepOutcome> {
        let Some(program) = self.program.as_ref() else {
            return Err(ExecutionError::NoProgram.into());
        };
        if self.cpu.history.cycle_count == 0 {
            self.state.pc = Some(self.cpu.policy.base_address);
        }

        let current_state = self.state;
        let mut next_state = current_state;

        tracing::debug!(
            "cycle {}; PC: {:#010x}",
            self.cpu.history.cycle_count,
            current_state.pc.unwrap_or(UNDEFINED)
        );

        if stages::write_back(&mut self.cpu, &current_state) == WriteBack::Halt
        {
            return Ok(StepOutcome::Halted);
        }
        stages::memory_access(
            &mut self.cpu,
            &mut self.mem,
            &mut self.hazards,
            &current_state,
            &mut next_state,
        )?;
        if !self.hazards.pipe_frozen() {
            stages::execute(
                &self.cpu,
                &mut self.hazards,
                &current_state,
                &mut next_state,
            );
            stages::instruction_decode(
                &mut self.cpu,
                &mut self.hazards,
                &current_state,
                &mut next_state,
            );
        }
        stages::instruction_fetch(
            &mut self.cpu,
            program,
            &mut self.hazards,
            &current_state,
            &mut next_state,
        );

        // Advance the pipeline state
        self.state = next_state;
        self.cpu.history.cycle_count += 1;
        Ok(StepOutcome::Running)
    }

    /// Runs `cycles` clock edges, or until EOP retires when `cycles` is 0
    pub fn run(&mut self, cycles: u64) -> SimulatorResult<StepOutcome> {
        let start = self.cpu.history.cycle_count;
        while cycles == 0 || self.cpu.history.cycle_count - start != cycles {
            if self.step()? == StepOutcome::Halted {
                tracing::info!(
                    cycles = self.cpu.history.cycle_count,
                    instructions = self.cpu.history.inst_count,
                    stalls = self.cpu.history.stall_count(),
                    "EOP retired"
                );
                return Ok(StepOutcome::Halted);
            }
        }
        Ok(StepOutcome::Running)
    }

    /// EOP sits in MEM/WB
    pub fn is_halted(&self) -> bool {
        self.state.mem_wb.inst.is_eop()
    }

    /// Value of a pipeline latch at the entrance of `stage`.
    /// `None` when the latch is unused in that stage; IR always reads
    /// `None`, see [`Simulator::instruction_at`].
    pub fn sp_register(&self, reg: SpRegister, stage: Stage) -> Latch {
        if reg == SpRegister::PC && stage == Stage::IF {
            if self.cpu.history.cycle_count == 0 {
                return self.program.as_ref().map(|_| self.base_address());
            }
            if self.hazards.structural.raised && !self.hazards.raw.raised {
                return self.hazards.structural.pc_temp;
            }
        }
        self.state.latch(reg, stage)
    }

    /// Instruction at the entrance of `stage`; for IF, the one PC points at
    pub fn instruction_at(&self, stage: Stage) -> Option<Instruction> {
        match stage {
            Stage::IF => {
                let program = self.program.as_ref()?;
                let pc = self.sp_register(SpRegister::PC, Stage::IF)?;
                Some(stages_simple::instruction_fetch(
                    program,
                    pc,
                    self.base_address(),
                ))
            }
            _ => self.state.instruction(stage),
        }
    }

    /// `None` while the register has never been written
    pub fn gp_register(&self, index: usize) -> Option<i32> {
        self.cpu.read_gpr(Some(index))
    }

    pub fn set_gp_register(
        &mut self,
        index: usize,
        value: i32,
    ) -> SimulatorResult<()> {
        let reg = self
            .cpu
            .gpr
            .get_mut(index)
            .ok_or(ExecutionError::RegisterOutOfRange(index))?;
        reg.write(Some(value));
        Ok(())
    }

    /// Writes a little-endian word
    pub fn write_memory(
        &mut self,
        address: u32,
        value: u32,
    ) -> SimulatorResult<()> {
        self.mem.set32(address, value)
    }

    /// Reads a little-endian word
    pub fn read_memory(&self, address: u32) -> SimulatorResult<u32> {
        self.mem.get32(address)
    }

    pub fn memory_byte(&self, address: u32) -> SimulatorResult<u8> {
        self.mem.get8(address)
    }

    /// Architectural state left once the simulator is done
    pub fn into_parts(self) -> (CPUState, DataMemory) {
        (self.cpu, self.mem)
    }

    pub fn memory(&self) -> &DataMemory {
        &self.mem
    }

    pub fn cpu(&self) -> &CPUState {
        &self.cpu
    }

    pub fn hazards(&self) -> &HazardUnit {
        &self.hazards
    }

    pub fn pipeline_state(&self) -> &PipelineState {
        &self.state
    }

    pub fn base_address(&self) -> u32 {
        self.cpu.policy.base_address
    }

    pub fn history(&self) -> &CPUHistory {
        &self.cpu.history
    }

    pub fn clock_cycles(&self) -> u64 {
        self.cpu.history.cycle_count
    }

    pub fn instructions_executed(&self) -> u64 {
        self.cpu.history.inst_count
    }

    /// Stall cycles of every kind
    pub fn stalls(&self) -> u64 {
        self.cpu.history.stall_count()
    }

    pub fn control_stalls(&self) -> u64 {
        self.cpu.history.control_stall_count
    }

    pub fn ipc(&self) -> f64 {
        self.cpu.history.ipc()
    }
}
