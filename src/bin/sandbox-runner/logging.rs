use console::style;
use env_logger::{Builder, Env};
use log::{Level, LevelFilter};
use std::io::Write;

const CRATE_TARGET: &str = "sandbox_runner";

/// Initialize the diagnostic logger (stderr of the runner, never the log file).
///
/// Defaults to warnings from this crate only; `RUST_LOG` overrides that.
/// `--verbose` raises the supervisor's own modules to debug.
pub fn init_logger(verbose: bool) {
    let env = Env::default().filter_or("RUST_LOG", format!("{CRATE_TARGET}=warn"));

    let mut builder = Builder::from_env(env);
    builder.format(|buf, record| {
        let level = match record.level() {
            Level::Error => format!("{}", style("ERROR").red().bold()),
            Level::Warn => format!("{}", style("WARN ").yellow().bold()),
            Level::Info => format!("{}", style("INFO ").green()),
            Level::Debug => format!("{}", style("DEBUG").cyan()),
            Level::Trace => format!("{}", style("TRACE").dim()),
        };
        writeln!(
            buf,
            "{} {} {}",
            level,
            style(component(record.target())).dim(),
            record.args()
        )
    });

    if verbose {
        builder.filter_module(CRATE_TARGET, LevelFilter::Debug);
    }

    builder.init();
}

/// Short name of the emitting module, e.g. `execution::process`
fn component(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some("") => "main",
        Some(rest) => rest.trim_start_matches("::"),
        None => target,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_strips_crate_prefix() {
        assert_eq!(component("sandbox_runner::execution::process"), "execution::process");
        assert_eq!(component("sandbox_runner::monitoring::watchdog"), "monitoring::watchdog");
        assert_eq!(component("sandbox_runner"), "main");
        assert_eq!(component("other_crate::io"), "other_crate::io");
    }
}
