//! Validated description of the child to run and its file bindings

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{Result, RunError};

/// What to run and where its I/O goes.
///
/// Only obtainable through [`ExecutionSpecBuilder::build`], so every value in
/// circulation has passed [`ExecutionSpec::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionSpec {
    input_path: Option<PathBuf>,
    output_path: PathBuf,
    log_path: PathBuf,
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl ExecutionSpec {
    /// Start building a spec for `program`
    pub fn builder(program: impl Into<String>) -> ExecutionSpecBuilder {
        ExecutionSpecBuilder::new(program)
    }

    /// File fed to the child's stdin, if any
    pub fn input_path(&self) -> Option<&Path> {
        self.input_path.as_deref()
    }

    /// Destination of the transformed stdout
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Destination of the timestamped stderr
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Wall-clock budget after which the child is killed
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Program and arguments joined for diagnostics
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check the invariants a supervisor relies on.
    pub fn validate(&self) -> Result<()> {
        if self.program.trim().is_empty() {
            return Err(RunError::InvalidSpec("program cannot be empty".to_string()));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(RunError::InvalidSpec(
                "output path cannot be empty".to_string(),
            ));
        }

        if self.log_path.as_os_str().is_empty() {
            return Err(RunError::InvalidSpec("log path cannot be empty".to_string()));
        }

        if let Some(input) = &self.input_path
            && input.as_os_str().is_empty()
        {
            return Err(RunError::InvalidSpec(
                "input path cannot be empty when given".to_string(),
            ));
        }

        if self.output_path == self.log_path {
            return Err(RunError::InvalidSpec(format!(
                "output and log must be different files: {}",
                self.output_path.display()
            )));
        }

        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(RunError::InvalidSpec(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder pattern for execution specs
#[derive(Debug, Clone, Default)]
pub struct ExecutionSpecBuilder {
    program: String,
    args: Vec<String>,
    input_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    log_path: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl ExecutionSpecBuilder {
    /// Create new builder
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the file sent to the child's stdin
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.input_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the output file (required)
    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.output_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the log file (required)
    pub fn log(mut self, path: impl AsRef<Path>) -> Self {
        self.log_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set timeout
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Build and validate the spec
    pub fn build(self) -> Result<ExecutionSpec> {
        let output_path = self
            .output_path
            .ok_or_else(|| RunError::InvalidSpec("output path is required".to_string()))?;
        let log_path = self
            .log_path
            .ok_or_else(|| RunError::InvalidSpec("log path is required".to_string()))?;

        let spec = ExecutionSpec {
            input_path: self.input_path,
            output_path,
            log_path,
            program: self.program,
            args: self.args,
            timeout: self.timeout,
        };
        spec.validate()?;
        Ok(spec)
    }
}
