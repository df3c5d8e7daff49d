//! Incremental scanning of command output.
//!
//! An observer sees each line once, in order, as it arrives. The timing
//! observer looks for the tool-specific "timing constraint not met" lines
//! and latches its verdict on the first hit.

use std::sync::OnceLock;

use regex::Regex;

use crate::{Error, Result};

/// Consumer of a line-oriented output stream.
pub trait LogObserver: Send {
    fn line_received(&mut self, line: &str);
}

/// A regex tagged with the tool it recognises.
#[derive(Debug, Clone)]
pub struct NamedPattern {
    name: String,
    regex: Regex,
}

impl NamedPattern {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let regex = Regex::new(pattern)
            .map_err(|e| Error::Parse(format!("invalid pattern '{name}': {e}")))?;
        Ok(Self { name, regex })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Failure patterns for Xilinx ISE and Vivado timing reports.
pub const TIMING_PATTERNS: [(&str, &str); 2] = [
    ("ise", r"\d+ constraint not met\."),
    (
        "vivado",
        r"WARNING: \[Route \d+-\d+\] Router estimated timing not met\.",
    ),
];

fn timing_patterns() -> &'static [NamedPattern] {
    static PATTERNS: OnceLock<Vec<NamedPattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        TIMING_PATTERNS
            .iter()
            .filter_map(|(name, pattern)| NamedPattern::new(*name, pattern).ok())
            .collect()
    })
}

/// Watches output for timing violations. Once a line matches, the verdict
/// stays "not met" for the rest of the stream.
#[derive(Debug, Clone)]
pub struct TimingObserver {
    patterns: Vec<NamedPattern>,
    timing_ok: bool,
    matched: Option<String>,
}

impl TimingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::with_patterns(timing_patterns().to_vec())
    }

    #[must_use]
    pub const fn with_patterns(patterns: Vec<NamedPattern>) -> Self {
        Self {
            patterns,
            timing_ok: true,
            matched: None,
        }
    }

    pub const fn timing_ok(&self) -> bool {
        self.timing_ok
    }

    /// Name of the pattern that flipped the verdict.
    pub fn matched_pattern(&self) -> Option<&str> {
        self.matched.as_deref()
    }

    pub fn patterns(&self) -> &[NamedPattern] {
        &self.patterns
    }
}

impl Default for TimingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LogObserver for TimingObserver {
    fn line_received(&mut self, line: &str) {
        if !self.timing_ok {
            return;
        }
        if let Some(pattern) = self.patterns.iter().find(|p| p.is_match(line)) {
            tracing::debug!(pattern = pattern.name(), %line, "Timing constraint not met");
            self.timing_ok = false;
            self.matched = Some(pattern.name().to_string());
        }
    }
}
