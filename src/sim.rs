use sim_lib::cpu::CPUPolicy;
use sim_lib::dump;
use sim_lib::flags::DlxSimArgs;
use sim_lib::run_wrapper;
use std::error::Error;
use tracing_subscriber::EnvFilter;

fn logging_setup(verbose: u32) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let flags = DlxSimArgs::from_env_or_exit();
    logging_setup(flags.verbose);

    let defaults = CPUPolicy::default();
    let policy = CPUPolicy {
        implementation: flags
            .implementation
            .map_or(defaults.implementation, Into::into),
        data_memory_size: flags
            .memory_size
            .unwrap_or(defaults.data_memory_size),
        data_memory_latency: flags
            .latency
            .unwrap_or(defaults.data_memory_latency),
        base_address: flags
            .base_address
            .map_or(defaults.base_address, |address| address.0),
        max_cycles: flags.cycles.unwrap_or(defaults.max_cycles),
        history: flags.history,
    };

    let report = run_wrapper::run(&flags.program, policy)?;
    let history = report.history();
    println!(
        "{} cycles, {} instructions, {} stalls",
        history.cycle_count,
        history.inst_count,
        history.stall_count()
    );
    print!("{}", dump::gp_registers(&report.cpu));

    if let Some(range) = flags.dump_memory {
        print!("{}", dump::memory(&report.memory, range.start, range.end)?);
    }

    Ok(())
}
