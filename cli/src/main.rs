#[macro_use]
extern crate log;

use std::process;

use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use tessera_core::internal::*;
use tessera_onnx::prelude::*;

/// Entrypoint for the command-line interface.
fn main() {
    let matches = Command::new("tessera")
        .version(clap::crate_version!())
        .about("Translates ONNX graphs to target graphs")
        .arg(Arg::new("model").takes_value(true).required(true).help("Source graph, in JSON form"))
        .arg(
            Arg::new("ordering")
                .long("ordering")
                .takes_value(true)
                .default_value("channel-first")
                .help("Axis ordering of the target graph (channel-first or channel-last)"),
        )
        .arg(
            Arg::new("run")
                .long("run")
                .help("Run the translated graph on inputs filled with ones, unknown dimensions set to 1"),
        )
        .arg(Arg::new("verbosity").short('v').multiple_occurrences(true).help("Sets the level of verbosity."))
        .get_matches();

    let level = match matches.occurrences_of("verbosity") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_env("TESSERA_LOG")
        .format_timestamp_nanos()
        .init();

    if let Err(e) = handle(&matches) {
        error!("{:?}", e);
        process::exit(1)
    }
}

fn handle(matches: &ArgMatches) -> TesseraResult<()> {
    let ordering: AxisOrdering = matches.value_of("ordering").unwrap_or("channel-first").parse()?;
    let Some(path) = matches.value_of("model") else { bail!("No model given") };
    let graph = tessera_onnx::for_path(path)?;
    info!("Loaded {} ({} nodes)", path, graph.nodes.len());
    let translation = Translator::new(LoweringContext::new(ordering)).translate(&graph)?;
    println!("{}", translation.model);
    for (node, advisory) in &translation.advisories {
        println!("advisory on {node}: {advisory}");
    }
    if matches.is_present("run") {
        let inputs = translation
            .model
            .input_outlets()
            .iter()
            .map(|&input| {
                let fact = translation.model.outlet_fact(input)?;
                let shape = fact.shape.iter().map(|d| d.unwrap_or(1)).collect::<TVec<_>>();
                Tensor::ones_dt(fact.datum_type, &shape)
            })
            .collect::<TesseraResult<TVec<_>>>()?;
        for (ix, output) in translation.run(inputs)?.iter().enumerate() {
            println!("output #{}: {}", ix, output.dump(false));
        }
    }
    Ok(())
}
