use crate::diff::Diff;
use crate::request::BodyPrintLimit;
use crate::{CountMatchingStrategy, LoggedRequest, RequestPattern};
use std::fmt::{self, Display, Formatter};

/// The expectation set on a verification was not met.
///
/// What it carries depends on how the mismatch played out:
/// - some requests matched, just not the expected number of them: [`CountMismatch`];
/// - nothing matched, but the server logged a request close to the pattern: [`NearMiss`],
///   with a field-by-field diff against the closest one;
/// - nothing matched and nothing came close: [`NoMatch`], with the requests the server
///   did receive.
///
/// [`CountMismatch`]: VerificationFailure::CountMismatch
/// [`NearMiss`]: VerificationFailure::NearMiss
/// [`NoMatch`]: VerificationFailure::NoMatch
#[derive(Debug, Clone)]
pub enum VerificationFailure {
    CountMismatch {
        pattern: RequestPattern,
        expected: CountMatchingStrategy,
        actual: u64,
    },
    NearMiss {
        pattern: RequestPattern,
        expected: CountMatchingStrategy,
        diff: Diff,
    },
    NoMatch {
        pattern: RequestPattern,
        expected: CountMatchingStrategy,
        received: Vec<LoggedRequest>,
        body_print_limit: BodyPrintLimit,
    },
}

impl VerificationFailure {
    pub fn pattern(&self) -> &RequestPattern {
        match self {
            VerificationFailure::CountMismatch { pattern, .. }
            | VerificationFailure::NearMiss { pattern, .. }
            | VerificationFailure::NoMatch { pattern, .. } => pattern,
        }
    }

    pub fn expected(&self) -> CountMatchingStrategy {
        match self {
            VerificationFailure::CountMismatch { expected, .. }
            | VerificationFailure::NearMiss { expected, .. }
            | VerificationFailure::NoMatch { expected, .. } => *expected,
        }
    }

    /// Number of logged requests that matched the pattern.
    pub fn actual(&self) -> u64 {
        match self {
            VerificationFailure::CountMismatch { actual, .. } => *actual,
            VerificationFailure::NearMiss { .. } | VerificationFailure::NoMatch { .. } => 0,
        }
    }

    /// The diff against the closest request, if nothing matched and something came close.
    pub fn diff(&self) -> Option<&Diff> {
        match self {
            VerificationFailure::NearMiss { diff, .. } => Some(diff),
            _ => None,
        }
    }
}

impl Display for VerificationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            VerificationFailure::CountMismatch {
                pattern,
                expected,
                actual,
            } => write!(
                f,
                "Expected {} requests matching the following pattern but received {}:\n{}",
                expected, actual, pattern
            ),
            VerificationFailure::NearMiss {
                pattern,
                expected,
                diff,
            } => write!(
                f,
                "Expected {} requests matching the following pattern but no request matched:\n{}\n\n{}",
                expected, pattern, diff
            ),
            VerificationFailure::NoMatch {
                pattern,
                expected,
                received,
                body_print_limit,
            } => {
                writeln!(
                    f,
                    "Expected {} requests matching the following pattern but no request matched:\n{}\n",
                    expected, pattern
                )?;
                if received.is_empty() {
                    write!(f, "The server did not receive any request.")
                } else {
                    writeln!(f, "Received requests:")?;
                    for (index, request) in received.iter().enumerate() {
                        let mut printed = String::new();
                        request.print_with_limit(&mut printed, *body_print_limit)?;
                        writeln!(f, "- Request #{}", index + 1)?;
                        for line in printed.lines() {
                            writeln!(f, "\t{}", line)?;
                        }
                    }
                    Ok(())
                }
            }
        }
    }
}

impl std::error::Error for VerificationFailure {}
