//! Plain-text build report on stdout.

use std::fmt::Write;

use buildstep_core::{BuildReport, Outcome};

/// Process exit code for a build result.
pub const fn exit_code(outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Success | Outcome::Skipped => 0,
        Outcome::Failure => 1,
        Outcome::Exception => 2,
    }
}

/// One line per step, then its summary log and URLs, then the result.
pub fn render(report: &BuildReport) -> String {
    let mut out = String::new();
    for status in report.steps() {
        let outcome = status.outcome().map_or("pending", Outcome::as_str);
        let _ = writeln!(out, "{outcome:<9} {}: {}", status.name(), status.description());
        if let Some(summary) = status.log("summary") {
            for line in summary.lines() {
                let _ = writeln!(out, "{:<9}   {line}", "");
            }
        }
        for (name, url) in status.urls() {
            let _ = writeln!(out, "{:<9}   {name}: {url}", "");
        }
    }
    let _ = writeln!(out, "build {}", report.result());
    out
}

#[cfg(test)]
mod tests {
    use buildstep_core::{
        lock::{AcquireLock, ReleaseLock},
        Build, Step,
    };

    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(Outcome::Success), 0);
        assert_eq!(exit_code(Outcome::Skipped), 0);
        assert_eq!(exit_code(Outcome::Failure), 1);
        assert_eq!(exit_code(Outcome::Exception), 2);
    }

    #[tokio::test]
    async fn test_render_includes_summary_and_result() {
        let mut steps: Vec<Box<dyn Step>> = vec![
            Box::new(AcquireLock::new("/nonexistent/buildstep.lock")),
            Box::new(ReleaseLock::new("/nonexistent/buildstep.lock")),
        ];
        let report = Build::new().run(&mut steps).await;

        let text = render(&report);

        assert!(text.contains("failure   lock: locking /nonexistent/buildstep.lock"), "{text}");
        assert!(text.contains("cannot open file '/nonexistent/buildstep.lock'"), "{text}");
        assert!(text.contains("skipped   unlock: skipped unlock /nonexistent/buildstep.lock"), "{text}");
        assert!(text.ends_with("build failure\n"), "{text}");
    }
}
