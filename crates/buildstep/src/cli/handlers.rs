//! Subcommand handlers: turn parsed arguments into steps and run them.

use std::path::PathBuf;

use anyhow::{Context, Result};
use buildstep_core::{
    command::ShellCommand,
    config::{load_config, BuildstepConfig},
    lock::{AcquireLock, ReleaseLock},
    Build, Delay, PropertyKey, Step,
};
use clap::{error::ErrorKind, ArgMatches};

use super::{build_cli, setup, signals};
use crate::{
    definition::{command_step, BuildDefinition, DefinitionError, EvaluatorKind},
    report,
};

/// Exit code for configuration and usage errors.
pub const USAGE_EXIT_CODE: i32 = 3;

/// Exit code for an error that ended the CLI before a build could report.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<DefinitionError>().is_some() {
        return USAGE_EXIT_CODE;
    }
    err.downcast_ref::<buildstep_core::Error>()
        .map_or(1, buildstep_core::Error::exit_code)
}

/// Parse arguments, run the selected subcommand and return the exit code.
pub async fn run_cli() -> Result<i32> {
    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            let code = if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                0
            } else {
                USAGE_EXIT_CODE
            };
            let _ = e.print();
            return Ok(code);
        }
    };

    setup::init_tracing(matches.get_flag("verbose"))?;

    let explicit = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = load_config(explicit).map_err(|e| match e {
        buildstep_core::Error::Io(msg) => buildstep_core::Error::InvalidConfig(msg),
        other => other,
    })?;

    let steps = match matches.subcommand() {
        Some(("run", sub_m)) => handle_run(sub_m, &config)?,
        Some(("sleep", sub_m)) => handle_sleep(sub_m)?,
        Some(("lock", sub_m)) => handle_lock(sub_m, &config)?,
        Some(("check-timing", sub_m)) => handle_check_timing(sub_m)?,
        _ => anyhow::bail!("Unknown command"),
    };

    execute(steps).await
}

async fn execute(mut steps: Vec<Box<dyn Step>>) -> Result<i32> {
    let mut build = Build::new();
    signals::forward_signals(build.interrupt_handle())?;

    let report = build.run(&mut steps).await;
    print!("{}", report::render(&report));
    Ok(report::exit_code(report.result()))
}

fn handle_run(matches: &ArgMatches, config: &BuildstepConfig) -> Result<Vec<Box<dyn Step>>> {
    let path = matches
        .get_one::<PathBuf>("definition")
        .context("Missing build definition path")?;
    let steps = BuildDefinition::load(path)?.into_steps(config)?;
    tracing::debug!(definition = %path.display(), steps = steps.len(), "Loaded build definition");
    Ok(steps)
}

fn handle_sleep(matches: &ArgMatches) -> Result<Vec<Box<dyn Step>>> {
    let seconds = matches
        .get_one::<f64>("seconds")
        .copied()
        .context("Missing delay")?;
    let delay: Box<dyn Step> = Box::new(Delay::from_secs_f64(seconds)?);
    Ok(vec![delay])
}

fn handle_lock(matches: &ArgMatches, config: &BuildstepConfig) -> Result<Vec<Box<dyn Step>>> {
    let path = matches
        .get_one::<PathBuf>("path")
        .context("Missing lock path")?;
    let key = matches
        .get_one::<String>("key")
        .map_or_else(|| config.lock.handle_key(), |key| PropertyKey::named(key.clone()));

    let steps: Vec<Box<dyn Step>> = vec![
        Box::new(
            AcquireLock::new(path)
                .with_handle_key(key.clone())
                .with_retry(config.lock.retry_policy()),
        ),
        command_step(trailing_command(matches)?, EvaluatorKind::ExitCode, None),
        Box::new(ReleaseLock::new(path).with_handle_key(key)),
    ];
    Ok(steps)
}

fn handle_check_timing(matches: &ArgMatches) -> Result<Vec<Box<dyn Step>>> {
    Ok(vec![command_step(
        trailing_command(matches)?,
        EvaluatorKind::Timing,
        None,
    )])
}

fn trailing_command(matches: &ArgMatches) -> Result<ShellCommand> {
    let words: Vec<&String> = matches
        .get_many::<String>("command")
        .map(Iterator::collect)
        .unwrap_or_default();
    let (program, args) = words.split_first().context("Missing command to run")?;
    Ok(ShellCommand::new(program.as_str()).args(args.iter().map(|arg| arg.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definition_errors_are_usage_errors() {
        let err = anyhow::Error::from(DefinitionError::Invalid {
            index: 2,
            message: "command step needs a program".to_string(),
        });
        assert_eq!(exit_code_for(&err), USAGE_EXIT_CODE);
    }

    #[test]
    fn test_core_errors_keep_their_exit_code() {
        let config = anyhow::Error::from(buildstep_core::Error::InvalidConfig("x".to_string()));
        assert_eq!(exit_code_for(&config), 3);

        let other = anyhow::anyhow!("boom");
        assert_eq!(exit_code_for(&other), 1);
    }

    #[test]
    fn test_lock_command_builds_three_steps() {
        let matches = build_cli()
            .try_get_matches_from(["buildstep", "lock", "/tmp/x.lock", "--key", "board", "--", "true"])
            .expect("valid args");
        let (_, sub) = matches.subcommand().expect("subcommand");

        let steps = handle_lock(sub, &BuildstepConfig::default()).expect("steps");

        let names: Vec<&str> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["lock", "true", "unlock"]);
    }
}
