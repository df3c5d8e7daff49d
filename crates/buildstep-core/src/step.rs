//! The step contract and the driver that executes one step.
//!
//! A step only decides *what* its outcome is. [`run_step`] owns the
//! lifecycle around it: it starts the status, turns a returned error into a
//! `summary` log plus a failure (or an exception for interrupts), and records
//! the terminal outcome exactly once.

use async_trait::async_trait;

use crate::{BuildProperties, Interrupt, Outcome, Result, StepStatus};

/// Everything a running step may touch.
pub struct StepContext<'a> {
    pub properties: &'a mut BuildProperties,
    pub status: &'a mut StepStatus,
    pub interrupt: &'a Interrupt,
}

#[async_trait]
pub trait Step: Send {
    /// Short name used in reports and logs
    fn name(&self) -> &str;

    /// Steps that must run during unwind, even after an earlier failure
    /// or an interrupt (e.g. releasing a lock).
    fn always_run(&self) -> bool {
        false
    }

    /// Execute the step. Suspends only on timer waits or subprocess output;
    /// must return promptly once `cx.interrupt` fires.
    async fn run(&mut self, cx: &mut StepContext<'_>) -> Result<Outcome>;
}

/// Drive `step` from idle to a terminal outcome.
pub async fn run_step(
    step: &mut dyn Step,
    properties: &mut BuildProperties,
    interrupt: &Interrupt,
) -> StepStatus {
    let name = step.name().to_string();
    let mut status = StepStatus::new(&name);

    if interrupt.is_interrupted() && !step.always_run() {
        status.set_text(["interrupted", name.as_str()]);
        status.mark_interrupted();
        record_outcome(&mut status, Outcome::Exception);
        return status;
    }

    if let Err(err) = status.start() {
        tracing::warn!(step = %name, error = %err, "Step could not start");
        record_outcome(&mut status, Outcome::Exception);
        return status;
    }
    tracing::info!(step = %name, "Starting step");

    let result = {
        let mut cx = StepContext {
            properties,
            status: &mut status,
            interrupt,
        };
        step.run(&mut cx).await
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(step = %name, error = %err, "Step failed");
            status.add_log("summary", err.to_string());
            err.outcome()
        }
    };

    if interrupt.is_interrupted() {
        status.mark_interrupted();
    }
    record_outcome(&mut status, outcome);
    status
}

fn record_outcome(status: &mut StepStatus, outcome: Outcome) {
    match status.finish(outcome) {
        Ok(()) => tracing::info!(
            step = status.name(),
            %outcome,
            description = %status.description(),
            "Step finished"
        ),
        Err(err) => tracing::warn!(
            step = status.name(),
            error = %err,
            "Ignoring second outcome for step"
        ),
    }
}
