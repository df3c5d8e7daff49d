//! Build definition files: an ordered list of `[[steps]]` tables.
//!
//! ```toml
//! [[steps]]
//! kind = "lock"
//! filename = "/tmp/fpga.lock"
//!
//! [[steps]]
//! kind = "command"
//! program = "make"
//! args = ["bitstream"]
//! evaluator = "timing"
//!
//! [[steps]]
//! kind = "unlock"
//! filename = "/tmp/fpga.lock"
//! ```

use std::path::{Path, PathBuf};

use buildstep_core::{
    command::{CommandStep, CoverageUrlEvaluator, ExitCodeEvaluator, ShellCommand, TimingEvaluator},
    config::BuildstepConfig,
    lock::{AcquireLock, LockHandle, ReleaseLock},
    Delay, PropertyKey, Step,
};
use serde::Deserialize;
use thiserror::Error;

/// Program run by a `coverage` step that names none.
const COVERAGE_PROGRAM: &str = "coveralls";

#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("cannot read build definition {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid build definition {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("step {index}: {message}")]
    Invalid { index: usize, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvaluatorKind {
    #[default]
    ExitCode,
    Timing,
    Coverage,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum StepDefinition {
    Lock {
        filename: PathBuf,
        handle_key: Option<String>,
    },
    Unlock {
        filename: PathBuf,
        handle_key: Option<String>,
    },
    Command {
        name: Option<String>,
        program: Option<String>,
        #[serde(default)]
        args: Vec<String>,
        workdir: Option<PathBuf>,
        #[serde(default)]
        evaluator: EvaluatorKind,
    },
    Sleep {
        delay_secs: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildDefinition {
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

impl BuildDefinition {
    pub fn load(path: &Path) -> Result<Self, DefinitionError> {
        let content = std::fs::read_to_string(path).map_err(|source| DefinitionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, DefinitionError> {
        toml::from_str(content).map_err(|source| DefinitionError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Instantiate the steps in file order.
    pub fn into_steps(self, config: &BuildstepConfig) -> Result<Vec<Box<dyn Step>>, DefinitionError> {
        self.steps
            .into_iter()
            .enumerate()
            .map(|(index, step)| step.into_step(index + 1, config))
            .collect()
    }
}

fn handle_key(explicit: Option<String>, config: &BuildstepConfig) -> PropertyKey<LockHandle> {
    explicit.map_or_else(|| config.lock.handle_key(), PropertyKey::named)
}

impl StepDefinition {
    fn into_step(
        self,
        index: usize,
        config: &BuildstepConfig,
    ) -> Result<Box<dyn Step>, DefinitionError> {
        let invalid = |message: String| DefinitionError::Invalid { index, message };
        match self {
            Self::Lock {
                filename,
                handle_key: key,
            } => Ok(Box::new(
                AcquireLock::new(filename)
                    .with_handle_key(handle_key(key, config))
                    .with_retry(config.lock.retry_policy()),
            )),
            Self::Unlock {
                filename,
                handle_key: key,
            } => Ok(Box::new(
                ReleaseLock::new(filename).with_handle_key(handle_key(key, config)),
            )),
            Self::Sleep { delay_secs } => Delay::from_secs_f64(delay_secs)
                .map(|delay| Box::new(delay) as Box<dyn Step>)
                .map_err(|e| invalid(e.to_string())),
            Self::Command {
                name,
                program,
                args,
                workdir,
                evaluator,
            } => {
                let program = match (program, evaluator) {
                    (Some(program), _) if !program.trim().is_empty() => program,
                    (None, EvaluatorKind::Coverage) => COVERAGE_PROGRAM.to_string(),
                    _ => return Err(invalid("command step needs a program".to_string())),
                };
                let command = ShellCommand::new(program).args(args);
                let command = match workdir {
                    Some(dir) => command.current_dir(dir),
                    None => command,
                };
                Ok(command_step(command, evaluator, name))
            }
        }
    }
}

/// Box a command step with the chosen evaluator.
pub fn command_step(
    command: ShellCommand,
    evaluator: EvaluatorKind,
    name: Option<String>,
) -> Box<dyn Step> {
    fn named<E: buildstep_core::command::CommandEvaluator + 'static>(
        step: CommandStep<E>,
        name: Option<String>,
    ) -> Box<dyn Step> {
        match name {
            Some(name) => Box::new(step.with_name(name)),
            None => Box::new(step),
        }
    }

    match evaluator {
        EvaluatorKind::ExitCode => named(CommandStep::new(command, ExitCodeEvaluator), name),
        EvaluatorKind::Timing => named(CommandStep::new(command, TimingEvaluator::new()), name),
        EvaluatorKind::Coverage => {
            named(CommandStep::new(command, CoverageUrlEvaluator::new()), name)
        }
    }
}
