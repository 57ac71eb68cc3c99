use clap::Parser;
use sandbox_runner::{ExecutionSpec, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "sandbox-runner")]
#[command(version, about = "Run a program and capture its output, errors and resource usage", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert a CSV export to TSV
    sandbox-runner --output rows.tsv --log export.log -- ./export --csv

    # Feed a file to the program's stdin
    sandbox-runner --input rows.csv --output rows.tsv --log cat.log -- cat

    # Kill the program after 30 seconds and print the report as JSON
    sandbox-runner --output out.tsv --log run.log --timeout 30 --json -- ./slow-job
")]
pub struct Cli {
    /// File sent to the program's standard input
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// File receiving the program's standard output, commas turned into tabs
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// File receiving the program's standard error, timestamped
    #[arg(long, value_name = "FILE")]
    pub log: PathBuf,

    /// Kill the program after this many seconds
    #[arg(short, long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Print the resource report as JSON
    #[arg(long)]
    pub json: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Program to run followed by its arguments
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

impl Cli {
    /// Turn the parsed flags into a validated execution spec
    pub fn to_spec(&self) -> Result<ExecutionSpec> {
        let (program, args) = self
            .command
            .split_first()
            .map(|(program, args)| (program.clone(), args))
            .unwrap_or_default();

        let mut builder = ExecutionSpec::builder(program)
            .args(args.iter().cloned())
            .output(&self.output)
            .log(&self.log);

        if let Some(input) = &self.input {
            builder = builder.input(input);
        }

        if let Some(secs) = self.timeout {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build()
    }
}
