//! Sweeps the data memory latency over a set of programs and writes the
//! resulting statistics as CSV

use std::process;

use sim_lib::cpu::CPUPolicy;
use sim_lib::error::SimulatorError;
use sim_lib::error::SimulatorResult;
use sim_lib::loader;
use sim_lib::run_wrapper::sweep_latencies;

const MAX_LATENCY: u32 = 8;

fn main() {
    if let Err(e) = run_eval() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn csv_error(e: csv::Error) -> SimulatorError {
    SimulatorError::IoError(std::io::Error::other(format!(
        "Failed to write CSV: {}",
        e
    )))
}

fn run_eval() -> SimulatorResult<()> {
    let programs: Vec<String> = std::env::args().skip(1).collect();
    if programs.is_empty() {
        return Err(SimulatorError::ConfigError(
            "You should specify at least one program".to_string(),
        ));
    }

    let output_path = "eval/latency_eval.csv";
    let mut writer = csv::Writer::from_path(output_path).map_err(csv_error)?;
    writer
        .write_record([
            "Program",
            "Latency",
            "Cycles",
            "Instructions",
            "Stalls",
            "Data stalls",
            "Control stalls",
            "Memory stalls",
            "CPI",
        ])
        .map_err(csv_error)?;

    for program_path in &programs {
        eprintln!("Running program: {}", program_path);
        let program = loader::load_program(program_path)?;
        let sweep =
            sweep_latencies(&program, CPUPolicy::default(), 0..=MAX_LATENCY);
        let points = match sweep {
            Ok(points) => points,
            Err(e) => {
                eprintln!(
                    "Warning: Failed to run program '{}': {}",
                    program_path, e
                );
                continue;
            }
        };
        for (latency, history) in points {
            writer
                .write_record([
                    program_path.as_str(),
                    &latency.to_string(),
                    &history.cycle_count.to_string(),
                    &history.inst_count.to_string(),
                    &history.stall_count().to_string(),
                    &history.data_stall_count.to_string(),
                    &history.control_stall_count.to_string(),
                    &history.mem_stall_count.to_string(),
                    &format!("{:.3}", history.cpi()),
                ])
                .map_err(csv_error)?;
        }
    }

    writer.flush()?;
    Ok(())
}
