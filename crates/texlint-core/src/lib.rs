//! # texlint core
//!
//! Structural validation of TeX/LaTeX documents.
//!
//! ## Overview
//!
//! The validator checks the things that break a document before TeX ever
//! sees it: unbalanced `\begin`/`\end` pairs, stray or missing braces, math
//! shifts that never close, and math-only constructs (`^`, `_`, Greek
//! letters, `array`) used in text. It also reports the regions of the
//! document that are in math mode, for editors that switch completion or
//! highlighting there.
//!
//! A run goes through four stages:
//!
//! 1. [`texlint_syntax::lexer`] tokenizes the text
//! 2. [`interpreter`] walks the tokens, skipping command definitions and
//!    verbatim arguments, and pushes every structural delimiter
//! 3. [`delimiters::Environments`] matches delimiters, tracks math mode and
//!    recovers from mismatches
//! 4. [`reporter::ErrorReporter`] finalizes the diagnostics
//!
//! ## Modules
//!
//! - [`math_mode`] - Environment and macro classification
//! - [`delimiters`] - Delimiter state machine and document tree
//! - [`reporter`] - Diagnostics
//! - [`interpreter`] - Token walk
//! - [`validator`] - Entry points and circuit breaker
//! - [`config`] - Settings
//!
//! ## Examples
//!
//! ```
//! use texlint_core::{validate, Severity};
//!
//! let report = validate("\\begin{itemize}\n\\item $x^2$\n").unwrap();
//! assert_eq!(report.diagnostics.len(), 1);
//! assert_eq!(report.diagnostics[0].message, "unclosed \\begin{itemize}");
//! assert_eq!(report.diagnostics[0].severity, Severity::Error);
//! assert_eq!(report.contexts.len(), 1);
//! ```
//!
//! Editors re-validating on every change should hold a [`Validator`], which
//! stops running after a tokenizer fault:
//!
//! ```
//! use texlint_core::{Outcome, Validator, ValidatorConfig};
//!
//! let mut validator = Validator::new(ValidatorConfig::default());
//! match validator.run("$a$$b$") {
//!     Outcome::Report(report) => assert!(report.is_clean()),
//!     other => panic!("unexpected outcome {:?}", other),
//! }
//! ```

pub mod config;
pub mod delimiters;
pub mod interpreter;
pub mod math_mode;
pub mod reporter;
pub mod validator;

pub use config::{BreakerPolicy, ConfigError, ValidatorConfig};
pub use delimiters::{Context, ContextKind, ContextRange};
pub use reporter::{Diagnostic, Severity};
pub use texlint_syntax::{Position, Span, TokenizeError};
pub use validator::{validate, validate_with, CircuitBreaker, Outcome, Report, Validator};
