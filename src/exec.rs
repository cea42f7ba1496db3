//! External tool lookup and invocation (merge tools, diff viewers, editors).
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

use anyhow::{Context as _, Result};

/// Merge tools in preference order.
pub const MERGE_TOOLS: &[&str] = &["meld", "kdiff3", "vimdiff", "code -d"];

/// Diff viewers in preference order.
pub const DIFF_TOOLS: &[&str] = &["meld", "kdiff3", "vimdiff", "code -d", "diff -u"];

/// Editors tried when `$EDITOR` is unset.
pub const EDITORS: &[&str] = &["nano", "vim", "vi", "emacs", "code"];

/// Process capability injected into the engine.
pub trait Executor: Send + Sync {
    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;

    /// Run `program` attached to the terminal and wait for it to exit.
    ///
    /// Returns `true` when the process exited successfully.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_interactive(&self, program: &str, args: &[OsString]) -> Result<bool>;
}

/// [`Executor`] that spawns real processes with inherited stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run_interactive(&self, program: &str, args: &[OsString]) -> Result<bool> {
        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(status.success())
    }
}

/// A tool command line such as `code -d`, split into program and fixed args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name.
    pub program: String,
    /// Arguments placed before the file arguments.
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Split a whitespace-separated command line.
    ///
    /// ```
    /// use dotpilot_cli::exec::ToolCommand;
    ///
    /// let tool = ToolCommand::parse("code -d").unwrap();
    /// assert_eq!(tool.program, "code");
    /// assert_eq!(tool.args, vec!["-d".to_string()]);
    /// assert!(ToolCommand::parse("   ").is_none());
    /// ```
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Full argument list with `files` appended.
    #[must_use]
    pub fn args_with(&self, files: &[&Path]) -> Vec<OsString> {
        self.args
            .iter()
            .map(OsString::from)
            .chain(files.iter().map(|f| f.as_os_str().to_os_string()))
            .collect()
    }

    /// Run the tool with `files` appended; returns `true` on a zero exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    pub fn run(&self, executor: &dyn Executor, files: &[&Path]) -> Result<bool> {
        executor.run_interactive(&self.program, &self.args_with(files))
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// First candidate whose program is on `PATH`.
#[must_use]
pub fn locate(executor: &dyn Executor, candidates: &[&str]) -> Option<ToolCommand> {
    candidates
        .iter()
        .copied()
        .filter_map(ToolCommand::parse)
        .find(|tool| executor.which(&tool.program))
}

/// Configured editor, else the first available of [`EDITORS`].
#[must_use]
pub fn locate_editor(executor: &dyn Executor, configured: Option<&str>) -> Option<ToolCommand> {
    configured
        .and_then(ToolCommand::parse)
        .or_else(|| locate(executor, EDITORS))
}
