//! The boundary towards the remote mock server's admin API.
mod in_memory;

pub use in_memory::InMemoryAdmin;

use crate::near_miss::NearMiss;
use crate::settings::GlobalSettings;
use crate::stub::{ServeEvent, StubMapping};
use crate::{LoggedRequest, RequestPattern};
use async_trait::async_trait;
use std::error::Error as StdError;
use thiserror::Error;
use uuid::Uuid;

/// Operations the verification client needs from the admin API of a mock server.
///
/// Implementations own the transport: every failure to reach the server, or to make sense
/// of its answer, surfaces as a [`TransportError`]. Timeouts and retries are theirs to
/// decide.
#[async_trait]
pub trait Admin: Send + Sync {
    /// Count the logged requests matching a declarative `pattern`.
    async fn count_requests_matching(
        &self,
        pattern: &RequestPattern,
    ) -> Result<VerificationResult, TransportError>;

    /// All logged requests matching `pattern`, in the order the server logged them.
    async fn find_requests_matching(
        &self,
        pattern: &RequestPattern,
    ) -> Result<FindRequestsResult, TransportError>;

    /// Logged requests that did not match any stub mapping.
    async fn find_unmatched_requests(&self) -> Result<FindRequestsResult, TransportError>;

    /// Near misses for every request that did not match any stub mapping.
    async fn find_near_misses_for_unmatched_requests(
        &self,
    ) -> Result<FindNearMissesResult, TransportError>;

    /// Stub mappings closest to matching `request`, best first.
    async fn find_top_near_misses_for_request(
        &self,
        request: &LoggedRequest,
    ) -> Result<FindNearMissesResult, TransportError>;

    /// Logged requests closest to matching `pattern`, best first.
    async fn find_top_near_misses_for_pattern(
        &self,
        pattern: &RequestPattern,
    ) -> Result<FindNearMissesResult, TransportError>;

    /// Replace the server-wide settings with a full snapshot.
    async fn update_global_settings(&self, settings: &GlobalSettings)
        -> Result<(), TransportError>;

    /// Empty the request journal.
    async fn reset_requests(&self) -> Result<(), TransportError>;

    /// Every served request with the stub mapping that answered it, oldest first.
    async fn get_serve_events(&self) -> Result<FindServeEventsResult, TransportError>;

    /// Register a new stub mapping.
    async fn add_stub_mapping(&self, stub: &StubMapping) -> Result<(), TransportError>;

    /// Replace the stub mapping with the same id. `false` if there is none.
    async fn edit_stub_mapping(&self, stub: &StubMapping) -> Result<bool, TransportError>;

    /// Remove the stub mapping with id `id`. `false` if there is none.
    async fn remove_stub_mapping(&self, id: Uuid) -> Result<bool, TransportError>;

    /// All registered stub mappings, in registration order.
    async fn list_stub_mappings(&self) -> Result<Vec<StubMapping>, TransportError>;

    async fn get_stub_mapping(&self, id: Uuid) -> Result<Option<StubMapping>, TransportError>;

    /// Remove every stub mapping.
    async fn reset_mappings(&self) -> Result<(), TransportError>;

    /// Remove every stub mapping and empty the request journal.
    async fn reset_all(&self) -> Result<(), TransportError>;
}

/// The answer to a count query.
///
/// `count` is only meaningful when `request_journal_enabled` is `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationResult {
    pub count: u64,
    pub request_journal_enabled: bool,
}

impl VerificationResult {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            request_journal_enabled: true,
        }
    }

    pub fn journal_disabled() -> Self {
        Self {
            count: 0,
            request_journal_enabled: false,
        }
    }
}

/// The answer to a find query.
///
/// `requests` is only meaningful when `request_journal_enabled` is `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct FindRequestsResult {
    pub requests: Vec<LoggedRequest>,
    pub request_journal_enabled: bool,
}

impl FindRequestsResult {
    pub fn new(requests: Vec<LoggedRequest>) -> Self {
        Self {
            requests,
            request_journal_enabled: true,
        }
    }

    pub fn journal_disabled() -> Self {
        Self {
            requests: vec![],
            request_journal_enabled: false,
        }
    }
}

/// The answer to a serve events query.
///
/// `serve_events` is only meaningful when `request_journal_enabled` is `true`.
#[derive(Debug, Clone, PartialEq)]
pub struct FindServeEventsResult {
    pub serve_events: Vec<ServeEvent>,
    pub request_journal_enabled: bool,
}

impl FindServeEventsResult {
    pub fn new(serve_events: Vec<ServeEvent>) -> Self {
        Self {
            serve_events,
            request_journal_enabled: true,
        }
    }

    pub fn journal_disabled() -> Self {
        Self {
            serve_events: vec![],
            request_journal_enabled: false,
        }
    }
}

/// Near misses, best first. Empty means there was nothing to compare.
#[derive(Debug, Clone, Default)]
pub struct FindNearMissesResult {
    pub near_misses: Vec<NearMiss>,
}

impl FindNearMissesResult {
    pub fn new(near_misses: Vec<NearMiss>) -> Self {
        Self { near_misses }
    }
}

/// The admin API could not be reached, or its answer could not be understood.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
