//! Steps that run an external program and judge it by its output.
//!
//! [`CommandStep`] owns the process plumbing; a [`CommandEvaluator`] sees
//! every stdout line as it arrives and decides the outcome and description
//! once the program exits.

use std::{
    path::PathBuf,
    process::Stdio,
    sync::OnceLock,
};

use async_trait::async_trait;
use regex::Regex;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Command,
};

use crate::{
    observer::{LogObserver, TimingObserver},
    step::{Step, StepContext},
    Error, Outcome, Result, StepStatus,
};

/// Description fragment appended when timing constraints were not met.
pub const TIMING_NOT_MET: &str = "timing not met";

/// Program, arguments and working directory of an external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    program: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
}

impl ShellCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(workdir) = &self.workdir {
            command.current_dir(workdir);
        }
        command
    }
}

/// `["running", program]` while the command runs, `["ran", program]` after.
pub fn default_description(command: &ShellCommand, done: bool) -> Vec<String> {
    let verb = if done { "ran" } else { "running" };
    vec![verb.to_string(), command.program().to_string()]
}

/// Outcome from the exit code alone. A missing code (killed by a signal)
/// counts as failure.
pub const fn exit_outcome(exit_code: Option<i32>) -> Outcome {
    match exit_code {
        Some(0) => Outcome::Success,
        _ => Outcome::Failure,
    }
}

/// Decides what a finished command means.
pub trait CommandEvaluator: Send {
    /// Called once per stdout line, in order.
    fn line_received(&mut self, _line: &str) {}

    fn evaluate(&self, exit_code: Option<i32>) -> Outcome {
        exit_outcome(exit_code)
    }

    fn describe(&self, command: &ShellCommand, done: bool) -> Vec<String> {
        default_description(command, done)
    }

    /// Attach extra logs or URLs once the command has exited.
    fn annotate(&self, _status: &mut StepStatus) {}
}

/// Pass/fail on exit code only.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitCodeEvaluator;

impl CommandEvaluator for ExitCodeEvaluator {}

/// Exit code first, then the timing verdict of the output.
#[derive(Debug, Clone, Default)]
pub struct TimingEvaluator {
    observer: TimingObserver,
}

impl TimingEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_observer(observer: TimingObserver) -> Self {
        Self { observer }
    }

    pub const fn timing_ok(&self) -> bool {
        self.observer.timing_ok()
    }
}

impl CommandEvaluator for TimingEvaluator {
    fn line_received(&mut self, line: &str) {
        self.observer.line_received(line);
    }

    fn evaluate(&self, exit_code: Option<i32>) -> Outcome {
        match exit_outcome(exit_code) {
            Outcome::Success if !self.observer.timing_ok() => Outcome::Failure,
            outcome => outcome,
        }
    }

    fn describe(&self, command: &ShellCommand, done: bool) -> Vec<String> {
        let mut description = default_description(command, done);
        if !self.observer.timing_ok() {
            description.push(TIMING_NOT_MET.to_string());
        }
        description
    }
}

/// Picks the report URL out of a coverage uploader's output.
#[derive(Debug, Clone, Default)]
pub struct CoverageUrlEvaluator {
    url: Option<String>,
}

impl CoverageUrlEvaluator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

fn coverage_url_re() -> Option<&'static Regex> {
    static COVERAGE_URL_RE: OnceLock<Option<Regex>> = OnceLock::new();
    COVERAGE_URL_RE
        .get_or_init(|| Regex::new(r"^https://coveralls.io/(.+)$").ok())
        .as_ref()
}

impl CommandEvaluator for CoverageUrlEvaluator {
    fn line_received(&mut self, line: &str) {
        if self.url.is_some() {
            return;
        }
        if let Some(found) = coverage_url_re().and_then(|re| re.find(line)) {
            self.url = Some(found.as_str().to_string());
        }
    }

    fn annotate(&self, status: &mut StepStatus) {
        if let Some(url) = &self.url {
            status.add_url("coverage", url.clone());
        }
    }
}

/// Runs a [`ShellCommand`] and lets `E` judge it.
pub struct CommandStep<E> {
    name: String,
    command: ShellCommand,
    evaluator: E,
}

impl<E: CommandEvaluator> CommandStep<E> {
    pub fn new(command: ShellCommand, evaluator: E) -> Self {
        Self {
            name: command.program().to_string(),
            command,
            evaluator,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub const fn command(&self) -> &ShellCommand {
        &self.command
    }

    pub const fn evaluator(&self) -> &E {
        &self.evaluator
    }
}

enum Output {
    Line(std::io::Result<Option<Vec<u8>>>),
    Interrupted(String),
}

enum Exit {
    Exited(std::io::Result<std::process::ExitStatus>),
    Interrupted(String),
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(line).into_owned()
}

fn forward_stderr<R>(program: String, stderr: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut segments = BufReader::new(stderr).split(b'\n');
        while let Ok(Some(raw)) = segments.next_segment().await {
            tracing::debug!(%program, line = %decode_line(&raw), "stderr");
        }
    });
}

#[async_trait]
impl<E: CommandEvaluator> Step for CommandStep<E> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self, cx: &mut StepContext<'_>) -> Result<Outcome> {
        let program = self.command.program().to_string();
        cx.status.set_text(self.evaluator.describe(&self.command, false));

        let mut child = self
            .command
            .to_command()
            .spawn()
            .map_err(|e| Error::Command {
                program: program.clone(),
                source: e.into(),
            })?;
        tracing::debug!(%program, args = ?self.command.arguments(), "Spawned command");

        if let Some(stderr) = child.stderr.take() {
            forward_stderr(program.clone(), stderr);
        }

        let mut stdio = String::new();
        if let Some(stdout) = child.stdout.take() {
            let mut segments = BufReader::new(stdout).split(b'\n');
            loop {
                let event = tokio::select! {
                    biased;
                    reason = cx.interrupt.interrupted() => Output::Interrupted(reason),
                    segment = segments.next_segment() => Output::Line(segment),
                };
                match event {
                    Output::Line(Ok(Some(raw))) => {
                        let line = decode_line(&raw);
                        self.evaluator.line_received(&line);
                        stdio.push_str(&line);
                        stdio.push('\n');
                    }
                    Output::Line(Ok(None)) => break,
                    Output::Line(Err(err)) => {
                        tracing::warn!(%program, error = %err, "Stopped reading stdout");
                        break;
                    }
                    Output::Interrupted(reason) => {
                        cx.status.add_log("stdio", stdio);
                        return Err(kill(&mut child, &program, reason).await);
                    }
                }
            }
        }

        let exit = tokio::select! {
            biased;
            reason = cx.interrupt.interrupted() => Exit::Interrupted(reason),
            exit = child.wait() => Exit::Exited(exit),
        };
        cx.status.add_log("stdio", stdio);
        let exit_code = match exit {
            Exit::Exited(Ok(exit)) => exit.code(),
            Exit::Exited(Err(err)) => {
                return Err(Error::Command {
                    program,
                    source: err.into(),
                })
            }
            Exit::Interrupted(reason) => return Err(kill(&mut child, &program, reason).await),
        };

        tracing::debug!(%program, ?exit_code, "Command exited");
        self.evaluator.annotate(cx.status);
        cx.status.set_text(self.evaluator.describe(&self.command, true));
        Ok(self.evaluator.evaluate(exit_code))
    }
}

async fn kill(child: &mut tokio::process::Child, program: &str, reason: String) -> Error {
    if let Err(err) = child.kill().await {
        tracing::warn!(%program, error = %err, "Failed to kill interrupted command");
    } else {
        tracing::debug!(%program, "Killed interrupted command");
    }
    Error::Interrupted { reason }
}
