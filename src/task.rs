//! Units of work that run under a lock.
//!
//! The coordinator treats a task as an opaque body that either completes or
//! fails; its duration is unbounded and it is never interrupted.

use crate::error::{Result, SchedLockError};
use anyhow::{Context, bail};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

/// A zero-argument unit of work.
pub trait GuardedTask: Send + Sync {
    fn run(&self) -> anyhow::Result<()>;
}

impl<F> GuardedTask for F
where
    F: Fn() -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self) -> anyhow::Result<()> {
        self()
    }
}

/// A configured command line run as a child process.
///
/// The command is split with shell-words quoting rules (no shell is involved
/// unless the command invokes one). A non-zero exit status is a failure.
#[derive(Debug, Clone)]
pub struct ShellTask {
    command: String,
    argv: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl ShellTask {
    /// Parse a command line.
    ///
    /// # Returns
    ///
    /// * `Ok(ShellTask)` - The command parsed into at least a program name
    /// * `Err(SchedLockError::ConfigInvalid)` - Unbalanced quotes or empty command
    pub fn new(command: &str) -> Result<Self> {
        let argv = shell_words::split(command).map_err(|e| {
            SchedLockError::ConfigInvalid(format!(
                "failed to parse command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                command, e
            ))
        })?;

        if argv.is_empty() {
            return Err(SchedLockError::ConfigInvalid(format!(
                "command is empty after parsing: '{}'",
                command
            )));
        }

        Ok(Self {
            command: command.to_string(),
            argv,
            working_dir: None,
            env: BTreeMap::new(),
        })
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }
}

impl GuardedTask for ShellTask {
    fn run(&self) -> anyhow::Result<()> {
        let mut command = Command::new(&self.argv[0]);
        command.args(&self.argv[1..]).envs(&self.env);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let status = command
            .status()
            .with_context(|| format!("failed to execute '{}'", self.argv[0]))?;

        if !status.success() {
            match status.code() {
                Some(code) => bail!("'{}' exited with status {}", self.command, code),
                None => bail!("'{}' was terminated by a signal", self.command),
            }
        }
        Ok(())
    }
}
