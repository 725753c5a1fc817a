//! Plots CPI against data memory latency for each program

use plotters::prelude::*;

use sim_lib::cpu::CPUPolicy;
use sim_lib::loader;
use sim_lib::run_wrapper::sweep_latencies;

const MAX_LATENCY: u32 = 8;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let programs: Vec<String> = std::env::args().skip(1).collect();
    if programs.is_empty() {
        return Err("You should specify at least one program".into());
    }

    // One line series per program
    let mut data: Vec<(String, Vec<(u32, f64)>)> = Vec::new();
    let mut y_max: f64 = 0.;
    for program_path in &programs {
        let program = loader::load_program(program_path)?;
        let points =
            sweep_latencies(&program, CPUPolicy::default(), 0..=MAX_LATENCY)?;
        let series: Vec<(u32, f64)> = points
            .into_iter()
            .map(|(latency, history)| (latency, history.cpi()))
            .collect();
        for (_, cpi) in &series {
            y_max = y_max.max(*cpi);
        }
        let name = program_path.rsplit('/').next().unwrap_or(program_path);
        data.push((name.to_string(), series));
    }

    let output_path = "eval/latency_eval.svg";
    let root = SVGBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut ctx = ChartBuilder::on(&root)
        .caption("CPI vs. data memory latency", ("sans-serif", 40).into_font())
        .margin(5)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(0..MAX_LATENCY, 0.0..y_max * 1.1)?;
    ctx.configure_mesh().x_desc("Latency").y_desc("CPI").draw()?;

    for (i, (name, series)) in data.iter().enumerate() {
        let color = Palette99::pick(i).to_rgba();
        ctx.draw_series(LineSeries::new(series.iter().copied(), color))?
            .label(name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color)
            });
    }

    ctx.configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;

    Ok(())
}
