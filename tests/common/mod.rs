//! Shared helpers for the integration tests
#![allow(dead_code)]

use sim_lib::loader::parse_program;
use sim_lib::loader::Program;
use sim_lib::pipelined::Simulator;
use sim_lib::pipelined::StepOutcome;

pub const BASE: u32 = 0x1000_0000;
pub const MEMORY_SIZE: usize = 1024;

/// Upper bound on the cycles any test program needs
pub const CYCLE_CAP: u64 = 10_000;

pub fn program(source: &str) -> Program {
    parse_program(source).expect("test program should parse")
}

/// Simulator loaded with `source` at [`BASE`], R0 = 0 and Rn = 3n for
/// n in 1..8
pub fn simulator(source: &str, latency: u32) -> Simulator {
    let mut sim = Simulator::with_memory(MEMORY_SIZE, latency)
        .expect("default memory is valid");
    sim.load_program(program(source), BASE);
    for i in 0..8 {
        sim.set_gp_register(i, 3 * i as i32).expect("register exists");
    }
    sim
}

/// Runs until EOP retires
pub fn run_to_end(sim: &mut Simulator) {
    let start = sim.clock_cycles();
    loop {
        match sim.step().expect("step should succeed") {
            StepOutcome::Halted => return,
            StepOutcome::Running => assert!(
                sim.clock_cycles() - start < CYCLE_CAP,
                "program did not halt"
            ),
        }
    }
}

/// (cycles, instructions, stalls) once EOP retires
pub fn counters(source: &str, latency: u32) -> (u64, u64, u64) {
    let mut sim = simulator(source, latency);
    run_to_end(&mut sim);
    (sim.clock_cycles(), sim.instructions_executed(), sim.stalls())
}

pub const RAW_ADD: &str = "\
ADDI R1 R0 5
ADD R2 R1 R1
EOP
";

pub const INDEPENDENT: &str = "\
ADDI R1 R0 1
ADDI R2 R0 2
ADDI R3 R0 3
EOP
";

pub const LOAD_USE: &str = "\
LW R1 0(R0)
ADD R2 R1 R1
EOP
";

pub const STORE_LOAD: &str = "\
SW R1 0(R0)
LW R2 0(R0)
EOP
";

pub const COUNTDOWN: &str = "\
ADDI R1 R0 2
LOOP: SUBI R1 R1 1
BNEZ R1 LOOP
EOP
";

pub const NOT_TAKEN: &str = "\
BEQZ R1 SKIP
ADDI R2 R0 1
SKIP: ADDI R3 R0 2
EOP
";

pub const TAKEN: &str = "\
BEQZ R0 SKIP
ADDI R2 R0 1
SKIP: ADDI R3 R0 2
EOP
";

pub const JUMP_OVER: &str = "\
ADDI R2 R0 1
JUMP SKIP
ADDI R2 R0 5
SKIP: ADDI R3 R0 2
EOP
";

/// Taken branch decoded while the store ahead of it waits on memory
pub const BRANCH_AFTER_STORE: &str = "\
SW R4 12(R0)
BGTZ R1 END
ADDI R7 R0 9
END: SUB R5 R4 R1
EOP
";

/// Read-modify-write loop whose store sits right before the back edge
pub const STORE_LOOP: &str = "\
ADDI R1 R0 3
LOOP: SUBI R1 R1 1
LW R2 0(R0)
ADDI R2 R2 1
SW R2 0(R0)
BNEZ R1 LOOP
EOP
";
