//! Test runner implementation
//!
//! Discovers fixture sets, runs the tool pipeline for every case and
//! compares the reported health status with the fixture.

use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

use crate::common::{Error, Result, Settings};
use crate::health::HealthStatus;

use super::config::TestCase;
use super::discovery::{discover, DiscoveryOptions, FixtureSet};
use super::output::ParsedOutput;
use super::pipeline::Pipeline;

/// Options for a run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Only run cases whose name or qualified name contains this
    pub filter: Option<String>,
    /// Print every case's log and command, not only failures
    pub verbose: bool,
    /// Suppress the human-readable report
    pub quiet: bool,
}

impl RunOptions {
    fn selects(&self, case: &TestCase) -> bool {
        match &self.filter {
            Some(filter) => {
                case.name().contains(filter.as_str()) || case.qualified_name().contains(filter.as_str())
            }
            None => true,
        }
    }
}

/// Result of a single case, or of a fixture file that could not be loaded
#[derive(Debug, Clone, Serialize)]
pub struct CaseOutcome {
    pub dir: PathBuf,
    pub name: String,
    /// Shell rendering of the pipeline that ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<HealthStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<HealthStatus>,
    /// Everything that went wrong; empty means the case passed
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Output lines that were not STATUS or MESSAGE
    pub log: Vec<String>,
}

impl CaseOutcome {
    fn new(case: &TestCase) -> Self {
        Self {
            dir: case.dir.clone(),
            name: case.name().to_string(),
            command: None,
            expected: Some(case.test.health_status.clone()),
            actual: None,
            errors: Vec::new(),
            stderr: None,
            log: Vec::new(),
        }
    }

    fn fixture_failure(set: &FixtureSet, error: &Error) -> Self {
        Self {
            dir: set.dir.clone(),
            name: set.script.display().to_string(),
            command: None,
            expected: None,
            actual: None,
            errors: vec![error.to_string()],
            stderr: None,
            log: Vec::new(),
        }
    }

    fn fail(&mut self, error: Error) {
        self.errors.push(error.to_string());
    }

    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// All outcomes of a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub cases: Vec<CaseOutcome>,
    pub passed: usize,
    pub failed: usize,
}

impl RunSummary {
    fn push(&mut self, outcome: CaseOutcome) {
        if outcome.passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.cases.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed
    }

    /// `Err(TestsFailed)` if any case failed
    pub fn check(&self) -> Result<()> {
        if self.failed > 0 {
            return Err(Error::TestsFailed {
                failed: self.failed,
                total: self.total(),
            });
        }
        Ok(())
    }
}

/// Compare the fixture's expectation with what the CLI reported
pub fn compare(expected: &HealthStatus, actual: &HealthStatus) -> Result<()> {
    if expected == actual {
        return Ok(());
    }
    Err(Error::Mismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

/// Run the pipeline for one case and judge the result
///
/// An execution failure does not stop the comparison: whatever stdout was
/// captured is still parsed and compared.
pub async fn run_case(settings: &Settings, case: &TestCase) -> CaseOutcome {
    let mut outcome = CaseOutcome::new(case);
    let pipeline = Pipeline::health_check(settings, &case.input());
    outcome.command = Some(pipeline.to_string());

    let stdout = match pipeline.run().await {
        Ok(output) => {
            if let Err(e) = output.check() {
                outcome.fail(e);
            }
            let stderr = output.stderr();
            if !stderr.is_empty() {
                outcome.stderr = Some(stderr);
            }
            output.stdout
        }
        Err(e) => {
            outcome.fail(e);
            String::new()
        }
    };

    let parsed = ParsedOutput::from_stdout(&stdout);
    if let Err(e) = compare(&case.test.health_status, &parsed.status) {
        outcome.fail(e);
    }
    outcome.actual = Some(parsed.status);
    outcome.log = parsed.unrecognized;
    outcome
}

/// Discover every fixture set under the configured root and run its cases
///
/// Only a failed directory walk is returned as an error; everything else is
/// recorded in the summary.
pub async fn run_all(settings: &Settings, options: &RunOptions) -> Result<RunSummary> {
    let sets = discover(&settings.fixtures_root, &DiscoveryOptions::from(settings))?;
    tracing::info!(
        root = %settings.fixtures_root.display(),
        directories = sets.len(),
        "discovered health scripts"
    );

    let mut summary = RunSummary::default();

    for set in &sets {
        if let Err(e) = &set.fixture {
            let outcome = CaseOutcome::fixture_failure(set, e);
            report_header(set, options);
            report_case(&outcome, options);
            summary.push(outcome);
            continue;
        }

        let cases: Vec<_> = set
            .cases()
            .into_iter()
            .filter(|case| options.selects(case))
            .collect();
        if cases.is_empty() {
            continue;
        }

        report_header(set, options);
        for case in &cases {
            let outcome = run_case(settings, case).await;
            report_case(&outcome, options);
            summary.push(outcome);
        }
    }

    report_summary(&summary, options);
    Ok(summary)
}

fn report_header(set: &FixtureSet, options: &RunOptions) {
    if options.quiet {
        return;
    }
    println!(
        "\n{} {}",
        "Health Script:".blue().bold(),
        set.dir.display().to_string().white().bold()
    );
}

fn report_case(outcome: &CaseOutcome, options: &RunOptions) {
    if options.quiet {
        return;
    }

    if outcome.passed() {
        println!("  {} {}", "✓".green(), outcome.name);
    } else {
        println!("  {} {}", "✗".red(), outcome.name.red());
    }

    if options.verbose {
        if let Some(command) = &outcome.command {
            println!("      $ {}", command.dimmed());
        }
    }

    for error in &outcome.errors {
        println!("      {}", error);
    }

    if !outcome.passed() {
        if let (Some(expected), Some(actual)) = (&outcome.expected, &outcome.actual) {
            println!("      {} {}", "expected:".cyan(), expected);
            println!("      {} {}", "actual:  ".cyan(), actual);
        }
        if let Some(stderr) = &outcome.stderr {
            for line in stderr.lines() {
                println!("      {}", line.dimmed());
            }
        }
    }

    if options.verbose || !outcome.passed() {
        for line in &outcome.log {
            println!("      | {}", line.dimmed());
        }
    }
}

fn report_summary(summary: &RunSummary, options: &RunOptions) {
    if options.quiet {
        return;
    }
    if summary.failed == 0 {
        println!(
            "\n{} {}\n",
            "✓".green().bold(),
            format!("{} passed", summary.passed).green().bold()
        );
    } else {
        println!(
            "\n{} {}, {} passed\n",
            "✗".red().bold(),
            format!("{} failed", summary.failed).red().bold(),
            summary.passed
        );
    }
}
