//! Ctrl-C handling. Kept in its own test binary because the interrupt flag
//! is process-wide.

use std::{fs, path::PathBuf};

use anyhow::Result;
use tplnew::{config::FETCH_DIR, log, scaffold, Invocation, Mode, Runner, ToolCall};

/// Clones an empty template and pretends the user pressed Ctrl-C while the
/// clone was running.
struct InterruptedClone;

impl Runner for InterruptedClone {
    fn run(&self, call: &ToolCall) -> Result<()> {
        if call.program == "git" {
            fs::create_dir_all(&call.args[2])?;
            fs::write(PathBuf::from(&call.args[2]).join("package.json"), "{}")?;
            log::mark_interrupted();
        }
        Ok(())
    }

    fn capture(&self, _call: &ToolCall) -> Option<String> {
        None
    }

    fn locate(&self, _program: &str) -> Option<PathBuf> {
        None
    }
}

#[test]
fn interrupt_between_steps_rolls_back() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("my-app");
    let inv = Invocation::builder()
        .root(root.clone())
        .original_dir(dir.path())
        .template("git@example.com:team/project-tpl.git")
        .mode(Mode::Create)
        .build()
        .unwrap();

    let err = scaffold::run(&inv, &InterruptedClone).unwrap_err();

    assert!(log::interrupted());
    assert!(format!("{err:#}").contains("Interrupted by user"), "{err:#}");
    assert!(!root.exists());
    assert!(!root.join(FETCH_DIR).exists());
}
