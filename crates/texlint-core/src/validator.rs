//! Validation runs: a one-shot [`validate`] and a long-lived [`Validator`]
//! guarded by a [`CircuitBreaker`].

use crate::config::{BreakerPolicy, ValidatorConfig};
use crate::delimiters::Context;
use crate::interpreter::interpret;
use crate::reporter::{Diagnostic, ErrorReporter, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;
use texlint_syntax::{tokenize_with_limit, TokenizeError};

/// Diagnostics and math regions of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub diagnostics: Vec<Diagnostic>,
    pub contexts: Vec<Context>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in &self.diagnostics {
            writeln!(f, "{}", diagnostic)?;
        }
        Ok(())
    }
}

/// Validates `text` with the default configuration.
///
/// ```
/// let report = texlint_core::validate("this is a^b test").unwrap();
/// assert_eq!(report.diagnostics[0].message, "^ must be inside math mode");
/// ```
pub fn validate(text: &str) -> Result<Report, TokenizeError> {
    validate_with(text, &ValidatorConfig::default())
}

/// Validates `text`. Only tokenizer faults are errors; everything wrong
/// with the document itself ends up in the report.
pub fn validate_with(text: &str, config: &ValidatorConfig) -> Result<Report, TokenizeError> {
    let source = tokenize_with_limit(text, config.max_tokens)?;
    let mut reporter = ErrorReporter::new(&source);
    let mut environments = interpret(&source, &mut reporter);
    environments.finish(&mut reporter);
    let contexts = environments.contexts(&source.lines);
    let diagnostics = reporter.finish(config.max_math_errors);
    Ok(Report {
        diagnostics,
        contexts,
    })
}

/// The result of a [`Validator::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Report(Report),
    /// The tokenizer failed; no diagnostics are available for this run.
    Fatal(TokenizeError),
    /// A previous fault tripped the breaker and this run was skipped.
    Disabled,
}

impl Outcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Report(report) => Some(report),
            _ => None,
        }
    }
}

/// Stops validation after a tokenizer fault, according to a
/// [`BreakerPolicy`].
#[derive(Debug, Clone, Default)]
pub struct CircuitBreaker {
    policy: BreakerPolicy,
    open: bool,
    skip_remaining: u32,
}

impl CircuitBreaker {
    pub fn new(policy: BreakerPolicy) -> Self {
        Self {
            policy,
            open: false,
            skip_remaining: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the next run may go ahead. Counts down a cooldown.
    pub fn allow(&mut self) -> bool {
        if !self.open {
            return true;
        }
        match self.policy {
            BreakerPolicy::Permanent => false,
            BreakerPolicy::PerRun => {
                self.open = false;
                true
            }
            BreakerPolicy::Cooldown { .. } => {
                if self.skip_remaining > 0 {
                    self.skip_remaining -= 1;
                    false
                } else {
                    self.open = false;
                    true
                }
            }
        }
    }

    pub fn trip(&mut self) {
        match self.policy {
            BreakerPolicy::PerRun => {}
            BreakerPolicy::Permanent => self.open = true,
            BreakerPolicy::Cooldown { runs } => {
                self.open = true;
                self.skip_remaining = runs;
            }
        }
    }

    pub fn reset(&mut self) {
        self.open = false;
        self.skip_remaining = 0;
    }
}

/// Validates successive versions of a document, as an editor would.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidatorConfig,
    breaker: CircuitBreaker,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Self {
        let breaker = CircuitBreaker::new(config.breaker);
        Self { config, breaker }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn run(&mut self, text: &str) -> Outcome {
        if !self.breaker.allow() {
            log::debug!("validation disabled after an earlier tokenizer fault");
            return Outcome::Disabled;
        }
        if text.is_empty() {
            return Outcome::Report(Report::default());
        }
        match validate_with(text, &self.config) {
            Ok(report) => Outcome::Report(report),
            Err(err) => {
                log::warn!("validation aborted: {}", err);
                self.breaker.trip();
                Outcome::Fatal(err)
            }
        }
    }

    /// Closes the breaker so the next run is attempted.
    pub fn reset(&mut self) {
        self.breaker.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny(policy: BreakerPolicy) -> Validator {
        Validator::new(ValidatorConfig {
            max_tokens: 3,
            breaker: policy,
            ..ValidatorConfig::default()
        })
    }

    const LONG: &str = "a^b^c^d^e";

    #[test]
    fn test_permanent_breaker() {
        let mut validator = tiny(BreakerPolicy::Permanent);
        assert!(matches!(validator.run(LONG), Outcome::Fatal(_)));
        assert_eq!(validator.run("ok"), Outcome::Disabled);
        assert_eq!(validator.run("ok"), Outcome::Disabled);
        validator.reset();
        assert!(validator.run("ok").report().is_some_and(Report::is_clean));
    }

    #[test]
    fn test_per_run_breaker() {
        let mut validator = tiny(BreakerPolicy::PerRun);
        assert!(matches!(validator.run(LONG), Outcome::Fatal(_)));
        assert!(validator.run("ok").report().is_some());
    }

    #[test]
    fn test_cooldown_breaker() {
        let mut validator = tiny(BreakerPolicy::Cooldown { runs: 2 });
        assert!(matches!(validator.run(LONG), Outcome::Fatal(_)));
        assert_eq!(validator.run("ok"), Outcome::Disabled);
        assert_eq!(validator.run("ok"), Outcome::Disabled);
        assert!(validator.run("ok").report().is_some());
        assert!(!validator.breaker().is_open());
    }

    #[test]
    fn test_empty_input() {
        let mut validator = Validator::default();
        assert_eq!(validator.run(""), Outcome::Report(Report::default()));
    }

    #[test]
    fn test_report_counts() {
        let report = validate("{\n\\end{foo}").unwrap();
        assert_eq!(report.count(Severity::Warning), 1);
        assert_eq!(report.count(Severity::Error), 1);
        assert!(report.has_errors());
        assert!(!report.is_clean());
    }
}
