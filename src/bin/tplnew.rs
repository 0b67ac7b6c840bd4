use anyhow::{Context, Result};
use std::process::ExitCode;
use tplnew::{
    args::Args, env_info, error, log, scaffold, trace, warn, Invocation, Rejection, Settings,
    SystemRunner,
};

fn app(args: &Args) -> Result<()> {
    let runner = SystemRunner;
    let cwd = std::env::current_dir().context("Failed to get current dir")?;

    if args.info {
        env_info::print(&env_info::gather(&runner, &cwd));

        if args.project_directory.is_none() && !args.update {
            return Ok(());
        }
    }

    let settings = Settings::load()?;
    let invocation = Invocation::from_args(args, &cwd, &settings)?;

    scaffold::run(&invocation, &runner)
}

fn main() -> ExitCode {
    let args = Args::parse_lenient();
    log::set_verbose(args.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!();
        log::mark_interrupted();
        warn!("Interrupted, waiting for the current step to stop");
    }) {
        trace!("Failed to set Ctrl-C handler: {e}");
    }

    for option in &args.ignored {
        trace!("Ignoring unknown option {option}");
    }

    match app(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(rejection) = e.downcast_ref::<Rejection>() {
                eprintln!("{rejection}");
            } else {
                error!("Failed to set up the project: {e:#}");
            }
            ExitCode::FAILURE
        }
    }
}
