use anyhow::{ensure, Context, Result};
use std::path::{Path, PathBuf};

use crate::{
    config::Invocation,
    runner::{Output, Runner, ToolCall},
    trace, warn,
};

/// The `git clone` that fetches `inv`'s template into its fetch directory.
#[must_use]
pub fn clone_call(inv: &Invocation) -> ToolCall {
    ToolCall::new("git")
        .arg("clone")
        .arg(inv.template_source())
        .arg(inv.fetch_dir().to_string_lossy())
        .current_dir(inv.root())
        .output(Output::Inherit)
}

/// Clones the template into [`Invocation::fetch_dir`] and strips its
/// history. Returns the fetch directory.
///
/// # Errors
///
/// Returns an [`Err`] if a leftover fetch directory cannot be removed, the
/// clone fails, or the `.git` directory cannot be deleted.
pub fn fetch_template(inv: &Invocation, runner: &dyn Runner) -> Result<PathBuf> {
    let dest = inv.fetch_dir();

    if dest.exists() {
        warn!(
            "Removing leftover template checkout at {}",
            dest.display()
        );
        crate::materialize::remove_path(&dest)?;
    }

    runner
        .run(&clone_call(inv))
        .with_context(|| format!("Failed to clone template {}", inv.template()))?;

    ensure!(
        dest.is_dir(),
        "Cloning {} did not produce {}",
        inv.template(),
        dest.display()
    );

    strip_history(&dest)?;

    Ok(dest)
}

/// Deletes the `.git` entry of a checkout so the new project starts without
/// the template's history.
///
/// # Errors
///
/// Returns an [`Err`] if the entry exists and cannot be removed.
pub fn strip_history(checkout: &Path) -> Result<()> {
    let git = checkout.join(".git");

    if git.symlink_metadata().is_ok() {
        trace!("Removing {}", git.display());
        crate::materialize::remove_path(&git)
            .with_context(|| format!("Failed to remove {}", git.display()))?;
    }

    Ok(())
}
