use anyhow::{Context, Result};
use std::{
    fmt::{self, Display},
    path::Path,
};

use crate::{
    config::Invocation,
    runner::{Output, Runner, ToolCall},
    trace,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Yarn,
    Npm,
}

impl PackageManager {
    /// Yarn when `yarn --version` succeeds, npm otherwise.
    #[must_use]
    pub fn detect(runner: &dyn Runner) -> Self {
        if runner.probe("yarn") {
            PackageManager::Yarn
        } else {
            PackageManager::Npm
        }
    }

    #[must_use]
    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Yarn => "yarn",
            PackageManager::Npm => "npm",
        }
    }

    /// Arguments of the install command. Yarn skips the `engines` check.
    #[must_use]
    pub fn install_args(self) -> &'static [&'static str] {
        match self {
            PackageManager::Yarn => &["--ignore-engines", "install"],
            PackageManager::Npm => &["install"],
        }
    }

    #[must_use]
    pub fn install_call(self, root: &Path) -> ToolCall {
        ToolCall::new(self.program())
            .args(self.install_args().iter().copied())
            .current_dir(root)
            .output(Output::Inherit)
    }
}

impl Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program())
    }
}

/// Installs the project's dependencies with the preferred package manager.
///
/// # Errors
///
/// Returns an [`Err`] if the install command fails.
pub fn install_dependencies(inv: &Invocation, runner: &dyn Runner) -> Result<PackageManager> {
    let manager = PackageManager::detect(runner);
    trace!("Installing dependencies with {manager}");

    runner
        .run(&manager.install_call(inv.root()))
        .with_context(|| format!("Failed to install dependencies with {manager}"))?;

    Ok(manager)
}
