//! Sequential build runner.
//!
//! Steps run one after another in the order given, sharing one
//! [`BuildProperties`]. After the first failure or exception, and after an
//! interrupt, only steps that ask to always run are still executed; the rest
//! are recorded as skipped.

use crate::{run_step, BuildProperties, Interrupt, Outcome, Step, StepStatus};

/// Cloneable handle for stopping a running build from elsewhere
/// (a signal handler, a timeout, another task).
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    interrupt: Interrupt,
}

impl InterruptHandle {
    /// Interrupt the current step and every later step that does not
    /// always run. Returns `false` if the build was already interrupted.
    pub fn interrupt(&self, reason: impl Into<String>) -> bool {
        self.interrupt.interrupt(reason)
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_interrupted()
    }
}

/// Per-step statuses and the overall result of one build.
#[derive(Debug)]
pub struct BuildReport {
    steps: Vec<StepStatus>,
    result: Outcome,
}

impl BuildReport {
    pub fn steps(&self) -> &[StepStatus] {
        &self.steps
    }

    pub const fn result(&self) -> Outcome {
        self.result
    }

    pub fn step(&self, name: &str) -> Option<&StepStatus> {
        self.steps.iter().find(|status| status.name() == name)
    }
}

#[derive(Debug, Default)]
pub struct Build {
    properties: BuildProperties,
    interrupt: Interrupt,
}

impl Build {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_properties(properties: BuildProperties) -> Self {
        Self {
            properties,
            interrupt: Interrupt::new(),
        }
    }

    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            interrupt: self.interrupt.clone(),
        }
    }

    pub const fn properties(&self) -> &BuildProperties {
        &self.properties
    }

    pub fn into_properties(self) -> BuildProperties {
        self.properties
    }

    pub async fn run(&mut self, steps: &mut [Box<dyn Step>]) -> BuildReport {
        let mut result = Outcome::Success;
        let mut statuses = Vec::with_capacity(steps.len());

        for step in steps.iter_mut() {
            let halted = result != Outcome::Success || self.interrupt.is_interrupted();
            let status = if halted && !step.always_run() {
                skipped(step.name())
            } else {
                run_step(step.as_mut(), &mut self.properties, &self.interrupt).await
            };

            if let Some(outcome) = status.outcome() {
                result = result.worst(outcome);
            }
            statuses.push(status);
        }

        if self.interrupt.is_interrupted() {
            result = result.worst(Outcome::Exception);
        }

        tracing::info!(%result, steps = statuses.len(), "Build finished");
        BuildReport {
            steps: statuses,
            result,
        }
    }
}

fn skipped(name: &str) -> StepStatus {
    let mut status = StepStatus::new(name);
    status.set_text(["skipped", name]);
    if let Err(err) = status.finish(Outcome::Skipped) {
        tracing::warn!(step = name, error = %err, "Could not record skipped step");
    }
    tracing::debug!(step = name, "Skipping step");
    status
}
