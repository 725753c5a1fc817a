mod common;

use common::*;
use proptest::prelude::*;
use proptest::sample::select;
use sim_lib::cpu::CPUPolicy;
use sim_lib::cpu::CPUState;
use sim_lib::memory::DataMemory;
use sim_lib::memory::StorageInterface;
use sim_lib::pipelined::StepOutcome;
use sim_lib::single_cycle;

/// Integer and memory instructions; R0 stays 0 so every address is valid
fn instruction() -> impl Strategy<Value = String> {
    prop_oneof![
        (select(vec!["ADD", "SUB", "XOR"]), 1..8usize, 0..8usize, 0..8usize)
            .prop_map(|(op, d, s, t)| format!("{} R{} R{} R{}", op, d, s, t)),
        (select(vec!["ADDI", "SUBI"]), 1..8usize, 0..8usize, -20..40i32)
            .prop_map(|(op, d, s, imm)| {
                format!("{} R{} R{} {}", op, d, s, imm)
            }),
        (1..8usize, 0..61u32)
            .prop_map(|(d, imm)| format!("LW R{} {}(R0)", d, imm)),
        (0..8usize, 0..16u32)
            .prop_map(|(s, word)| format!("SW R{} {}(R0)", s, word * 4)),
    ]
}

fn straight_line() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(instruction(), 1..12)
}

#[derive(Clone, Debug)]
enum Line {
    Plain(String),
    /// Opcode, tested register and how many lines to skip past the next
    Forward(&'static str, usize, usize),
}

/// Straight-line code mixed with forward branches and jumps
fn with_branches() -> impl Strategy<Value = String> {
    let branch = (
        select(vec!["BEQZ", "BNEZ", "BLTZ", "BGTZ", "BLEZ", "BGEZ", "JUMP"]),
        0..8usize,
        0..4usize,
    )
        .prop_map(|(op, reg, skip)| Line::Forward(op, reg, skip));
    let line = prop_oneof![
        3 => instruction().prop_map(Line::Plain),
        1 => branch,
    ];
    prop::collection::vec(line, 1..12).prop_map(|lines| {
        let end = lines.len();
        let mut source = String::new();
        for (index, line) in lines.iter().enumerate() {
            let text = match line {
                Line::Plain(text) => text.clone(),
                Line::Forward(op, reg, skip) => {
                    let target = (index + 1 + skip).min(end);
                    match *op {
                        "JUMP" => format!("JUMP L{}", target),
                        _ => format!("{} R{} L{}", op, reg, target),
                    }
                }
            };
            source += &format!("L{}: {}\n", index, text);
        }
        source + &format!("L{}: EOP\n", end)
    })
}

/// Runs `source` on the single-cycle machine with the shared fixture
fn reference(source: &str) -> (CPUState, DataMemory) {
    let mut cpu = CPUState::make(CPUPolicy::default());
    for i in 0..8 {
        cpu.write_gpr(Some(i), Some(3 * i as i32));
    }
    let mut mem = DataMemory::make(MEMORY_SIZE);
    single_cycle::run(&mut cpu, &mut mem, &program(source)).unwrap();
    (cpu, mem)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pipelined_matches_single_cycle(
        lines in straight_line(),
        latency in 0u32..4,
    ) {
        let source = lines.join("\n") + "\nEOP\n";
        let mut sim = simulator(&source, latency);
        run_to_end(&mut sim);

        let mut cpu = CPUState::make(CPUPolicy::default());
        for i in 0..8 {
            cpu.write_gpr(Some(i), Some(3 * i as i32));
        }
        let mut mem = DataMemory::make(MEMORY_SIZE);
        let exit = single_cycle::run(&mut cpu, &mut mem, &program(&source))
            .unwrap();
        prop_assert_eq!(exit, BASE + 4 * lines.len() as u32);
        prop_assert_eq!(cpu.history.cycle_count, lines.len() as u64);

        for i in 0..32 {
            prop_assert_eq!(sim.gp_register(i), cpu.read_gpr(Some(i)));
        }
        for address in (0..64).step_by(4) {
            prop_assert_eq!(
                sim.read_memory(address).unwrap(),
                mem.get32(address).unwrap()
            );
        }
        prop_assert_eq!(sim.instructions_executed(), lines.len() as u64);
        prop_assert_eq!(cpu.history.inst_count, lines.len() as u64);
    }

    #[test]
    fn straight_line_cycle_accounting(
        lines in straight_line(),
        latency in 0u32..4,
    ) {
        let source = lines.join("\n") + "\nEOP\n";
        let (cycles, retired, stalls) = counters(&source, latency);
        prop_assert_eq!(retired, lines.len() as u64);
        prop_assert_eq!(cycles, retired + 4 + stalls);
    }

    #[test]
    fn pipelined_matches_single_cycle_with_branches(
        source in with_branches(),
        latency in 0u32..4,
    ) {
        let mut sim = simulator(&source, latency);
        prop_assert_eq!(sim.run(CYCLE_CAP).unwrap(), StepOutcome::Halted);
        let (cpu, mem) = reference(&source);

        for i in 0..32 {
            prop_assert_eq!(sim.gp_register(i), cpu.read_gpr(Some(i)));
        }
        for address in (0..64).step_by(4) {
            prop_assert_eq!(
                sim.read_memory(address).unwrap(),
                mem.get32(address).unwrap()
            );
        }
        prop_assert_eq!(sim.instructions_executed(), cpu.history.inst_count);
        prop_assert_eq!(
            sim.clock_cycles(),
            sim.instructions_executed() + 4 + sim.stalls()
        );
    }

    #[test]
    fn eop_without_hazards(n in 0usize..12) {
        let source = "ADDI R1 R0 1\n".repeat(n) + "EOP\n";
        prop_assert_eq!(counters(&source, 0), (n as u64 + 4, n as u64, 0));
    }

    #[test]
    fn memory_round_trip(word in 0u32..256, value: u32) {
        let mut mem = DataMemory::make(MEMORY_SIZE);
        mem.set32(word * 4, value).unwrap();
        prop_assert_eq!(mem.get32(word * 4).unwrap(), value);
        prop_assert_eq!(mem.get8(word * 4).unwrap(), value as u8);
    }
}
