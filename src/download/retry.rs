//! Persona escalation for extraction attempts.
//!
//! The [`Escalator`] runs an operation once per persona, in order, until one
//! succeeds or `max_attempts` personas have failed.
//!
//! # Overview
//!
//! - attempt `k` uses `PersonaGenerator::next(k)`
//! - success returns immediately; later personas are never generated
//! - a failure is recorded in the trace and the next persona is tried at once
//! - after `max_attempts` failures the run ends in [`ExhaustedError`]
//!
//! Attempts are strictly sequential. The full trace is returned with every
//! outcome as an [`EscalationReport`].
//!
//! # Example
//!
//! ```
//! use audio_fetch_core::download::{AttemptOutcome, Escalator};
//! use audio_fetch_core::extract::ExtractionError;
//! use audio_fetch_core::parser::validate_video_url;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let url = validate_video_url("https://youtu.be/abc123").unwrap();
//! let report = Escalator::new(3)
//!     .run(&url, |_url, persona| async move {
//!         if persona.index() < 1 {
//!             Err(ExtractionError::timeout(Duration::from_secs(1)))
//!         } else {
//!             Ok(persona.index())
//!         }
//!     })
//!     .await;
//!
//! assert_eq!(report.attempts().len(), 2);
//! assert_eq!(report.attempts()[0].outcome, AttemptOutcome::Failed);
//! assert_eq!(report.into_result().unwrap(), 1);
//! # });
//! ```

use std::fmt;
use std::future::Future;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::extract::ExtractionError;
use crate::parser::ValidatedUrl;
use crate::persona::{Persona, PersonaGenerator};

/// Default number of personas tried per operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Upper bound on `max_attempts`.
///
/// Personas stay pairwise distinct well past this index.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// State of one escalation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Started but not yet resolved.
    Pending,
    /// The operation succeeded with this persona.
    Success,
    /// The operation failed with this persona.
    Failed,
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One entry in an escalation trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationAttempt {
    /// Index of the persona used.
    pub persona_index: u32,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// Failure description, for failed attempts.
    pub error: Option<String>,
}

impl EscalationAttempt {
    fn pending(persona_index: u32) -> Self {
        Self {
            persona_index,
            outcome: AttemptOutcome::Pending,
            error: None,
        }
    }
}

/// Every persona failed.
///
/// Only the last cause is kept as a value; earlier ones survive as strings in
/// [`attempts`](Self::attempts).
#[derive(Debug, Error)]
#[error("all {} extraction attempts failed; last error: {last_error}", .attempts.len())]
pub struct ExhaustedError {
    /// Full attempt trace.
    pub attempts: Vec<EscalationAttempt>,
    /// Cause of the final failure.
    #[source]
    pub last_error: ExtractionError,
}

/// Outcome of an escalation run together with its trace.
#[derive(Debug)]
pub struct EscalationReport<T> {
    outcome: Result<T, ExhaustedError>,
    attempts: Vec<EscalationAttempt>,
}

impl<T> EscalationReport<T> {
    /// Attempt trace, in order.
    #[must_use]
    pub fn attempts(&self) -> &[EscalationAttempt] {
        &self.attempts
    }

    /// Consumes the report, yielding the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ExhaustedError`] when every persona failed.
    pub fn into_result(self) -> Result<T, ExhaustedError> {
        self.outcome
    }
}

/// Sequential persona escalation.
#[derive(Debug, Clone, Copy)]
pub struct Escalator {
    generator: PersonaGenerator,
    max_attempts: u32,
}

impl Default for Escalator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl Escalator {
    /// Creates an escalator. `max_attempts` is clamped to `1..=10`.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            generator: PersonaGenerator::new(),
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_LIMIT),
        }
    }

    /// Effective attempt bound.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `operation` with successive personas until one succeeds.
    #[instrument(skip(self, url, operation), fields(url = %url, max_attempts = self.max_attempts))]
    pub async fn run<T, F, Fut>(&self, url: &ValidatedUrl, mut operation: F) -> EscalationReport<T>
    where
        F: FnMut(ValidatedUrl, Persona) -> Fut,
        Fut: Future<Output = Result<T, ExtractionError>>,
    {
        let mut attempts = Vec::with_capacity(self.max_attempts as usize);
        let mut last_error = None;

        for attempt_index in 0..self.max_attempts {
            let persona = self.generator.next(attempt_index);
            debug!(attempt = attempt_index, %persona, "trying persona");

            attempts.push(EscalationAttempt::pending(attempt_index));
            let result = operation(url.clone(), persona).await;
            let Some(entry) = attempts.last_mut() else {
                break;
            };

            match result {
                Ok(value) => {
                    entry.outcome = AttemptOutcome::Success;
                    if attempt_index > 0 {
                        info!(attempt = attempt_index, "succeeded after escalation");
                    }
                    return EscalationReport {
                        outcome: Ok(value),
                        attempts,
                    };
                }
                Err(error) => {
                    warn!(
                        attempt = attempt_index,
                        kind = ?error.failure_kind(),
                        error = %error,
                        "extraction attempt failed"
                    );
                    entry.outcome = AttemptOutcome::Failed;
                    entry.error = Some(error.to_string());
                    last_error = Some(error);
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| {
            ExtractionError::tool_failed("not run", "no extraction attempt was made")
        });
        warn!(attempts = attempts.len(), "all personas exhausted");
        EscalationReport {
            outcome: Err(ExhaustedError {
                attempts: attempts.clone(),
                last_error,
            }),
            attempts,
        }
    }
}
