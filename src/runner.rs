//! Boundary to the external programs this tool drives (`git`, `yarn`,
//! `npm`, browsers). Nothing outside this module spawns processes, so the
//! rest of the crate can be exercised with a fake [`Runner`].

use anyhow::{bail, Context, Result};
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

/// What happens to the child's stdout/stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    /// Shared with this process so the user sees native progress output.
    #[default]
    Inherit,
    Discard,
}

/// A single external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ToolCall {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub output: Output,
}

impl ToolCall {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.current_dir = Some(dir.to_path_buf());
        self
    }

    #[must_use]
    pub fn output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }
}

impl Display for ToolCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

pub trait Runner {
    /// Runs `call` to completion.
    ///
    /// # Errors
    ///
    /// Returns an [`Err`] if the program could not be started or exited with
    /// a non-zero status.
    fn run(&self, call: &ToolCall) -> Result<()>;

    /// Runs `call` and returns what it printed (stdout, or stderr when stdout
    /// is empty). `None` if the program is missing or failed.
    fn capture(&self, call: &ToolCall) -> Option<String>;

    /// Resolves `program` against `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Whether `program --version` runs successfully.
    fn probe(&self, program: &str) -> bool {
        self.run(
            &ToolCall::new(program)
                .arg("--version")
                .output(Output::Discard),
        )
        .is_ok()
    }
}

/// [`Runner`] backed by [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    /// Builds the command for `call`. The program is looked up on `PATH`
    /// first so Windows `.cmd` shims such as `npm.cmd` are found.
    fn command(call: &ToolCall) -> Command {
        let program = which::which(&call.program).unwrap_or_else(|_| PathBuf::from(&call.program));
        let mut cmd = Command::new(program);
        cmd.args(&call.args);
        if let Some(dir) = &call.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Runner for SystemRunner {
    fn run(&self, call: &ToolCall) -> Result<()> {
        crate::trace!("Running `{call}`");

        let mut cmd = Self::command(call);
        if call.output == Output::Discard {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        let status = cmd
            .status()
            .with_context(|| format!("Failed to start `{}`", call.program))?;

        if !status.success() {
            bail!("`{call}` exited with {status}");
        }

        Ok(())
    }

    fn capture(&self, call: &ToolCall) -> Option<String> {
        let output = Self::command(call).stdin(Stdio::null()).output().ok()?;

        if !output.status.success() {
            return None;
        }

        let text = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr)
        } else {
            String::from_utf8_lossy(&output.stdout)
        };

        Some(text.trim().to_string())
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}
