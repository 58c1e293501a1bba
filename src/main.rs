use std::process::ExitCode;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use dropship::cli::Cli;
use dropship::error::{DeployResult, Stage, StageExt};
use dropship::logging;
use dropship::pipeline::{Outcome, Pipeline};
use dropship::prompt::{self, NoPrompt, Prompter, TerminalPrompter};

const INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup(&cli) {
        eprintln!("error: {e:#}");
        return ExitCode::FAILURE;
    }

    let code = match run(&cli) {
        Ok(outcome) => {
            report(&outcome);
            0
        }
        Err(e) => {
            error!("{e}");
            e.exit_code()
        }
    };

    finish(code);
    ExitCode::from(code)
}

fn setup(cli: &Cli) -> anyhow::Result<()> {
    let log_path = logging::init(&cli.log_options()).context("initializing logging")?;

    ctrlc::set_handler(|| {
        prompt::restore_terminal();
        error!("Interrupted");
        finish(INTERRUPTED);
        std::process::exit(i32::from(INTERRUPTED));
    })
    .context("installing Ctrl-C handler")?;

    info!("Logging to {}", log_path.display());
    Ok(())
}

fn run(cli: &Cli) -> DeployResult<Outcome> {
    let prompter: &dyn Prompter = if cli.non_interactive {
        &NoPrompt
    } else {
        &TerminalPrompter
    };

    let params = cli
        .params()
        .prompt_missing(prompter)
        .and_then(dropship::params::ParamsBuilder::build)
        .stage(Stage::Input)?;

    let pipeline = Pipeline::new(params, cli.settings());
    pipeline.check_prerequisites()?;
    pipeline.run()
}

fn report(outcome: &Outcome) {
    match outcome {
        Outcome::Deployed(d) => {
            info!("Workspace kept at {}", d.workspace.display());
            info!("Remote directory ~/{} ({} deployment)", d.remote_dir, d.kind);
            info!("Public endpoint answered {}", d.status);
        }
        Outcome::CleanedUp(steps) => {
            for step in steps.iter().filter(|s| !s.ok) {
                info!("Nothing removed for {}", step.step);
            }
        }
        Outcome::Planned => {}
    }
}

fn finish(code: u8) {
    info!(
        "Finished with exit code {code} at {}",
        Local::now().format("%Y-%m-%d %H:%M:%S")
    );
}
