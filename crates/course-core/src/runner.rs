//! Test-runner collaborator.
//!
//! Chapters ship a `tests.html` that runs in a headless browser. The browser
//! side lives in an external harness command; this module only defines the
//! contract (path in, structured report out) and a subprocess implementation
//! of it.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::Deserialize;
use tracing::debug;

use crate::error::{CourseError, Result};

/// Default harness command, overridable via `course.toml`.
pub const DEFAULT_RUNNER_COMMAND: &str = "course-harness";

/// Score for one section of a chapter's test suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SectionScore {
    pub grade: u32,
    pub maximum: u32,
}

/// Report produced by one harness run, keyed by section name.
///
/// Treated opaquely apart from totalling; section names mean whatever the
/// chapter's test suite says they mean.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TestReport {
    pub results: BTreeMap<String, SectionScore>,
}

impl TestReport {
    /// `(sum of grades, sum of maxima)` across all sections.
    pub fn total(&self) -> (u32, u32) {
        self.results
            .values()
            .fold((0, 0), |(grade, maximum), score| {
                (grade + score.grade, maximum + score.maximum)
            })
    }

    /// Repository-level total across several chapters' reports.
    pub fn combined_total<'a>(reports: impl IntoIterator<Item = &'a TestReport>) -> (u32, u32) {
        reports.into_iter().fold((0, 0), |(grade, maximum), report| {
            let (chapter_grade, chapter_maximum) = report.total();
            (grade + chapter_grade, maximum + chapter_maximum)
        })
    }
}

/// Executes a chapter's test-definition file and reports the scores.
pub trait TestRunner {
    fn run(&self, tests_html: &Path) -> Result<TestReport>;
}

/// [`TestRunner`] that spawns the harness command with the tests.html path
/// as its final argument and reads a JSON report from its stdout.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    command: String,
}

impl ProcessRunner {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// `--version` probe; true when the harness can be spawned.
    pub fn check_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Like [`Self::check_available`] but with a typed error for callers
    /// that cannot proceed without the harness.
    pub fn require_available(&self) -> Result<()> {
        if self.check_available() {
            Ok(())
        } else {
            Err(CourseError::RunnerNotFound {
                command: self.command.clone(),
            })
        }
    }
}

impl TestRunner for ProcessRunner {
    fn run(&self, tests_html: &Path) -> Result<TestReport> {
        debug!(command = %self.command, tests = %tests_html.display(), "spawning test harness");

        let output = Command::new(&self.command)
            .arg(tests_html)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CourseError::RunnerNotFound {
                    command: self.command.clone(),
                },
                _ => CourseError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CourseError::RunnerFailed {
                message: stderr.trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| CourseError::ReportParse {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_deserializes_from_harness_json() {
        let json = r#"{"results": {"section1": {"grade": 8, "maximum": 10}}}"#;
        let report: TestReport = serde_json::from_str(json).unwrap();
        assert_eq!(
            report.results["section1"],
            SectionScore {
                grade: 8,
                maximum: 10
            }
        );
    }

    #[test]
    fn total_sums_sections() {
        let json = r#"{"results": {
            "a": {"grade": 8, "maximum": 10},
            "b": {"grade": 5, "maximum": 5}
        }}"#;
        let report: TestReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.total(), (13, 15));
    }

    #[test]
    fn combined_total_sums_across_chapters() {
        let intro: TestReport =
            serde_json::from_str(r#"{"results": {"section1": {"grade": 8, "maximum": 10}}}"#)
                .unwrap();
        let basics: TestReport =
            serde_json::from_str(r#"{"results": {"section1": {"grade": 5, "maximum": 5}}}"#)
                .unwrap();

        assert_eq!(TestReport::combined_total([&intro, &basics]), (13, 15));
    }

    #[test]
    fn combined_total_of_nothing_is_zero() {
        assert_eq!(TestReport::combined_total([]), (0, 0));
    }

    #[test]
    fn empty_report_totals_zero() {
        assert_eq!(TestReport::default().total(), (0, 0));
    }

    #[test]
    fn missing_harness_is_not_available() {
        let runner = ProcessRunner::new("definitely-not-a-real-harness-command");
        assert!(!runner.check_available());
        assert!(matches!(
            runner.require_available().unwrap_err(),
            CourseError::RunnerNotFound { .. }
        ));
    }
}
