//! A step that does nothing for a predefined time.

use std::time::Duration;

use async_trait::async_trait;

use crate::{
    step::{Step, StepContext},
    timer::{wait_or_interrupt, Wakeup},
    Error, Outcome, Result,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delay {
    delay: Duration,
}

impl Delay {
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Delay from (possibly fractional) seconds, as written in build files.
    pub fn from_secs_f64(secs: f64) -> Result<Self> {
        Duration::try_from_secs_f64(secs)
            .map(Self::new)
            .map_err(|e| Error::InvalidConfig(format!("invalid delay {secs}: {e}")))
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    fn seconds_text(&self) -> String {
        format!("{} sec", format_g(self.delay.as_secs_f64()))
    }
}

/// `printf("%g")`: six significant digits, trailing zeros dropped, exponent
/// form below 1e-4 and from 1e6 up.
fn format_g(value: f64) -> String {
    let scientific = format!("{value:.5e}");
    let (mantissa, exponent) = scientific
        .split_once('e')
        .map_or((scientific.as_str(), 0), |(m, e)| (m, e.parse::<i32>().unwrap_or(0)));

    if !(-4..6).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs());
    }
    let precision = usize::try_from(5 - exponent).unwrap_or(0);
    trim_fraction(&format!("{value:.precision$}")).to_string()
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

#[async_trait]
impl Step for Delay {
    fn name(&self) -> &str {
        "sleep"
    }

    async fn run(&mut self, cx: &mut StepContext<'_>) -> Result<Outcome> {
        let seconds = self.seconds_text();
        cx.status.set_text(["sleeping", seconds.as_str()]);

        cx.status.retrying()?;
        match wait_or_interrupt(self.delay, cx.interrupt).await {
            Wakeup::Elapsed => {
                cx.status.resume()?;
                cx.status.set_text(["slept", seconds.as_str()]);
                Ok(Outcome::Success)
            }
            Wakeup::Interrupted(reason) => Err(Error::Interrupted { reason }),
        }
    }
}
