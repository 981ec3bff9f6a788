//! System command construction and execution.
//!
//! Reactions never inspect command output; the runner only reports whether the
//! command could be spawned and whether it exited successfully.

use core::{fmt, future::Future};
use std::{io, process::Stdio};

use thiserror::Error as ThisError;
use tokio::process;
use tracing::debug;

/// A program invocation with its argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SystemCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builds a command from a configured argv (program followed by arguments).
    ///
    /// Returns `None` for an empty argv.
    pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
        let (program, rest) = argv.split_first()?;
        Some(Self::new(program.as_ref()).args(rest))
    }

    /// Runs `command` through `sh -c`.
    pub fn shell(command: &str) -> Self {
        Self::new("sh").arg("-c").arg(command)
    }

    /// Prefixes `program` with the configured privilege-escalation argv (e.g. `sudo`).
    ///
    /// An empty prefix runs the program directly.
    pub fn privileged<S: AsRef<str>>(prefix: &[S], program: &str) -> Self {
        match Self::from_argv(prefix) {
            Some(escalate) => escalate.arg(program),
            None => Self::new(program),
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<S: AsRef<str>>(mut self, args: &[S]) -> Self {
        self.args
            .extend(args.iter().map(|a| a.as_ref().to_owned()));
        self
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Failure to run a [`SystemCommand`].
#[derive(Debug, ThisError)]
pub enum CommandError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command}` exited with {status}")]
    Failed { command: String, status: String },
}

/// Executes system commands on behalf of the reactions.
pub trait CommandRunner {
    /// Runs `command` to completion.
    fn run(&self, command: &SystemCommand) -> impl Future<Output = Result<(), CommandError>> + Send;
}

/// Runs commands as child processes with all standard streams detached.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &SystemCommand) -> Result<(), CommandError> {
        debug!(%command, "Executing command");
        let status = process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Failed {
                command: command.to_string(),
                status: status.to_string(),
            })
        }
    }
}
