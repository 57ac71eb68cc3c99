//! sandbox-runner CLI - run a program and capture its effects

mod cli;
mod logging;

use clap::{CommandFactory, Parser};
use cli::Cli;
use console::style;
use log::debug;
use sandbox_runner::{ResourceReport, Supervisor};

fn main() {
    let cli = Cli::parse();

    logging::init_logger(cli.verbose);

    let spec = match cli.to_spec() {
        Ok(spec) => spec,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            eprintln!();
            eprintln!("{}", Cli::command().render_usage());
            std::process::exit(2);
        }
    };

    debug!("Execution spec: {:?}", spec);

    match Supervisor::new(spec).run() {
        Ok(report) => {
            if let Err(e) = print_report(&report, cli.json) {
                eprintln!("{} {}", style("error:").red().bold(), e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn print_report(report: &ResourceReport, json: bool) -> serde_json::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        report.print();
    }
    Ok(())
}
