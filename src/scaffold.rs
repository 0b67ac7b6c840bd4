//! The run itself: validate, fetch, materialize, install, clean up.

use anyhow::{ensure, Context, Result};
use owo_colors::OwoColorize;
use std::path::Path;

use crate::{
    config::{Invocation, Mode, INITIAL_VERSION, MANIFEST},
    dry_run,
    error::Rejection,
    fetch, info, install, materialize,
    runner::Runner,
    trace,
    validate::{check_package_name, is_reserved},
    warn,
};

/// Rejects `name` if npm would refuse it or it shadows a template
/// dependency.
///
/// # Errors
///
/// Returns a [`Rejection`] describing every problem found.
pub fn check_app_name(name: &str) -> Result<(), Rejection> {
    let report = check_package_name(name);

    if !report.valid_for_new_packages() {
        return Err(Rejection::InvalidName {
            name: name.to_string(),
            report,
        });
    }

    if is_reserved(name) {
        return Err(Rejection::ReservedName {
            name: name.to_string(),
        });
    }

    Ok(())
}

/// Runs `inv` to completion.
///
/// In create mode a failure after the project directory was created removes
/// that directory again. Update mode never removes the project, only the
/// template checkout.
///
/// # Errors
///
/// Returns a [`Rejection`] (wrapped in [`anyhow::Error`]) if the name is
/// refused, otherwise the error of the step that failed.
pub fn run(inv: &Invocation, runner: &dyn Runner) -> Result<()> {
    if inv.is_verbose() {
        crate::log::set_verbose(true);
    }

    trace!(
        "root: {}, name: {}, template: {}",
        inv.root().display(),
        inv.app_name(),
        inv.template()
    );

    check_app_name(inv.app_name())?;

    match inv.mode() {
        Mode::Create => info!(
            "Creating a new project in {}",
            inv.root()
                .display()
                .if_supports_color(owo_colors::Stream::Stdout, |s| s.green())
        ),
        Mode::Update => info!(
            "Updating project in {} from {}",
            inv.root()
                .display()
                .if_supports_color(owo_colors::Stream::Stdout, |s| s.green()),
            inv.template()
        ),
    }

    if inv.is_debug() {
        print_plan(inv);
        return Ok(());
    }

    match inv.mode() {
        Mode::Create => create(inv, runner)?,
        Mode::Update => update(inv, runner)?,
    }

    println!(
        "{}",
        "OK".if_supports_color(owo_colors::Stream::Stdout, |s| s.green())
    );

    Ok(())
}

fn create(inv: &Invocation, runner: &dyn Runner) -> Result<()> {
    std::fs::create_dir(inv.root())
        .with_context(|| format!("Failed to create project directory {}", inv.root().display()))?;

    populate(inv, runner).inspect_err(|_| rollback(inv.root()))
}

fn populate(inv: &Invocation, runner: &dyn Runner) -> Result<()> {
    let fetched = fetch::fetch_template(inv, runner)?;
    check_interrupted()?;

    materialize::create(inv, &fetched)?;
    check_interrupted()?;

    install::install_dependencies(inv, runner)?;
    cleanup(&fetched)
}

fn update(inv: &Invocation, runner: &dyn Runner) -> Result<()> {
    ensure!(
        inv.root().is_dir(),
        "Project directory {} does not exist",
        inv.root().display()
    );

    let result = refresh(inv, runner);

    let fetched = inv.fetch_dir();
    if result.is_err() && fetched.exists() {
        if let Err(e) = materialize::remove_path(&fetched) {
            trace!("Failed to remove {}: {e}", fetched.display());
        }
    }

    result
}

fn refresh(inv: &Invocation, runner: &dyn Runner) -> Result<()> {
    let fetched = fetch::fetch_template(inv, runner)?;
    check_interrupted()?;

    let replaced = materialize::update(inv, &fetched)?;
    info!("Updated {} entries from the template", replaced.len());
    check_interrupted()?;

    install::install_dependencies(inv, runner)?;
    cleanup(&fetched)
}

fn check_interrupted() -> Result<()> {
    ensure!(!crate::log::interrupted(), "Interrupted by user");
    Ok(())
}

fn cleanup(fetched: &Path) -> Result<()> {
    trace!("Removing {}", fetched.display());
    materialize::remove_path(fetched)
        .with_context(|| format!("Failed to remove {}", fetched.display()))
}

/// Removes a project directory this run created. Failures are only traced,
/// the original error is what gets reported.
fn rollback(root: &Path) {
    warn!("Removing {}", root.display());

    if let Err(e) = fs_extra::dir::remove(root) {
        trace!("Failed to remove {}: {e}", root.display());
    }
}

fn print_plan(inv: &Invocation) {
    if inv.mode() == Mode::Create {
        dry_run!("would create {}", inv.root().display());
    }
    dry_run!("would run `{}`", fetch::clone_call(inv));
    dry_run!("would remove {}", inv.fetch_dir().join(".git").display());

    match inv.mode() {
        Mode::Create => {
            dry_run!(
                "would copy {} into {}",
                inv.fetch_dir().display(),
                inv.root().display()
            );
            dry_run!(
                "would set name = {:?} and version = {:?} in {MANIFEST}",
                inv.app_name(),
                INITIAL_VERSION
            );
        }
        Mode::Update => {
            for entry in materialize::UPDATE_ALLOW_LIST {
                dry_run!("would replace {}", inv.root().join(entry).display());
            }
        }
    }

    dry_run!("would install dependencies with yarn, or npm when yarn is missing");
    dry_run!("would remove {}", inv.fetch_dir().display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_names() {
        assert_eq!(check_app_name("my-app"), Ok(()));
    }

    #[test]
    fn rejects_invalid_names() {
        match check_app_name("My App") {
            Err(Rejection::InvalidName { name, report }) => {
                assert_eq!(name, "My App");
                assert!(!report.errors.is_empty());
                assert!(!report.warnings.is_empty());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_reserved_names() {
        assert_eq!(
            check_app_name("react-dom"),
            Err(Rejection::ReservedName {
                name: "react-dom".to_string()
            })
        );
    }
}
