//! Step outcomes, lifecycle states and the per-step status record.
//!
//! `Idle → Running → {Retrying ⇄ Running} → Finished(outcome)`. The finished
//! state is entered once; [`StepStatus::finish`] refuses a second outcome
//! instead of overwriting the first.

use std::fmt;

use crate::{lifecycle::LifecycleState, Error, Result};

/// Terminal result of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
    Exception,
    Skipped,
}

impl Outcome {
    const fn severity(self) -> u8 {
        match self {
            Self::Success | Self::Skipped => 0,
            Self::Failure => 1,
            Self::Exception => 2,
        }
    }

    /// The more severe of two outcomes. `Skipped` never worsens a result.
    #[must_use]
    pub const fn worst(self, other: Self) -> Self {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Exception => "exception",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    /// Constructed, not yet started
    Idle,
    /// Evaluating its condition
    Running,
    /// Suspended on a pending timer wait
    Retrying,
    Finished(Outcome),
}

const ALL_STEP_STATES: [StepState; 7] = [
    StepState::Idle,
    StepState::Running,
    StepState::Retrying,
    StepState::Finished(Outcome::Success),
    StepState::Finished(Outcome::Failure),
    StepState::Finished(Outcome::Exception),
    StepState::Finished(Outcome::Skipped),
];

const FINISHED_STATES: [StepState; 4] = [
    StepState::Finished(Outcome::Success),
    StepState::Finished(Outcome::Failure),
    StepState::Finished(Outcome::Exception),
    StepState::Finished(Outcome::Skipped),
];

impl LifecycleState for StepState {
    fn can_transition_to(self, next: Self) -> bool {
        self.valid_next_states().contains(&next)
    }

    fn valid_next_states(self) -> Vec<Self> {
        match self {
            // Never started: skipped by the build or interrupted beforehand.
            Self::Idle => vec![
                Self::Running,
                Self::Finished(Outcome::Skipped),
                Self::Finished(Outcome::Exception),
            ],
            Self::Running => std::iter::once(Self::Retrying)
                .chain(FINISHED_STATES)
                .collect(),
            Self::Retrying => std::iter::once(Self::Running)
                .chain(FINISHED_STATES)
                .collect(),
            Self::Finished(_) => Vec::new(),
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Finished(_))
    }

    fn all_states() -> &'static [Self] {
        &ALL_STEP_STATES
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("running"),
            Self::Retrying => f.write_str("retrying"),
            Self::Finished(outcome) => write!(f, "finished({outcome})"),
        }
    }
}

/// Status record of one step instance: lifecycle state, description text,
/// named logs and URLs.
#[derive(Debug, Clone)]
pub struct StepStatus {
    name: String,
    state: StepState,
    text: Vec<String>,
    interrupted: bool,
    logs: Vec<(String, String)>,
    urls: Vec<(String, String)>,
}

impl StepStatus {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: StepState::Idle,
            text: Vec::new(),
            interrupted: false,
            logs: Vec::new(),
            urls: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn state(&self) -> StepState {
        self.state
    }

    pub const fn outcome(&self) -> Option<Outcome> {
        match self.state {
            StepState::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub const fn is_finished(&self) -> bool {
        matches!(self.state, StepState::Finished(_))
    }

    /// Replace the description. Ignored once the step has finished.
    pub fn set_text<I, S>(&mut self, fragments: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.is_finished() {
            tracing::debug!(step = %self.name, "Ignoring description update after finish");
            return;
        }
        self.text = fragments.into_iter().map(Into::into).collect();
    }

    pub fn text(&self) -> &[String] {
        &self.text
    }

    /// Description fragments joined with single spaces.
    pub fn description(&self) -> String {
        self.text.join(" ")
    }

    pub const fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Record that an interrupt reached this step. Never reset.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// Attach a complete log under `name`, appending to an existing one.
    pub fn add_log(&mut self, name: impl Into<String>, content: impl Into<String>) {
        let name = name.into();
        let content = content.into();
        match self.logs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, text)) => {
                text.push('\n');
                text.push_str(&content);
            }
            None => self.logs.push((name, content)),
        }
    }

    pub fn log(&self, name: &str) -> Option<&str> {
        self.logs
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, text)| text.as_str())
    }

    pub fn logs(&self) -> &[(String, String)] {
        &self.logs
    }

    pub fn add_url(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.urls.push((name.into(), url.into()));
    }

    pub fn urls(&self) -> &[(String, String)] {
        &self.urls
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: StepState) -> Result<()> {
        if let StepState::Finished(previous) = self.state {
            return Err(Error::AlreadyFinished { previous });
        }
        if !self.state.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition(StepState::Running)
    }

    /// Enter `Retrying` while a timer wait is pending.
    pub fn retrying(&mut self) -> Result<()> {
        self.transition(StepState::Retrying)
    }

    /// Back to `Running` after the pending wait fired.
    pub fn resume(&mut self) -> Result<()> {
        self.transition(StepState::Running)
    }

    /// Record the terminal outcome. A second call fails with
    /// [`Error::AlreadyFinished`] and leaves the first outcome in place.
    pub fn finish(&mut self, outcome: Outcome) -> Result<()> {
        self.transition(StepState::Finished(outcome))
    }
}
