use crate::admin::TransportError;
use crate::verification::VerificationFailure;
use thiserror::Error;
use uuid::Uuid;

/// Everything that can go wrong while verifying traffic against a mock server.
#[derive(Debug, Error)]
pub enum Error {
    /// The mock server is not recording requests, so there is nothing to count.
    #[error("Requests cannot be verified because the request journal is disabled on the mock server")]
    JournalDisabled,
    /// The traffic did not meet the expectation.
    #[error(transparent)]
    Verification(#[from] VerificationFailure),
    /// The mock server has no stub mapping with this id.
    #[error("No stub mapping found with id {0}")]
    StubNotFound(Uuid),
    /// We could not find out what the traffic looked like.
    #[error("Failed to reach the mock server admin API: {0}")]
    Transport(#[from] TransportError),
}

impl Error {
    pub fn is_journal_disabled(&self) -> bool {
        matches!(self, Error::JournalDisabled)
    }

    pub fn verification_failure(&self) -> Option<&VerificationFailure> {
        match self {
            Error::Verification(failure) => Some(failure),
            _ => None,
        }
    }
}
