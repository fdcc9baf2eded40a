use crate::{LoggedRequest, RequestPattern};
use std::fmt::{self, Display, Formatter};
use uuid::Uuid;

/// A stub mapping registered on the mock server, identified by its id.
///
/// Only the request side of a mapping matters to this crate: it decides which logged
/// requests count as matched, and which stubs are near misses for an unmatched request.
#[derive(Debug, Clone)]
pub struct StubMapping {
    pub id: Uuid,
    pub request: RequestPattern,
}

impl StubMapping {
    /// A new mapping for `request`, with a random id.
    pub fn new(request: impl Into<RequestPattern>) -> Self {
        Self::with_id(Uuid::new_v4(), request)
    }

    /// A mapping with a known id, e.g. to replace an existing one with
    /// [`WireMock::edit_stub`](crate::WireMock::edit_stub).
    pub fn with_id(id: Uuid, request: impl Into<RequestPattern>) -> Self {
        Self {
            id,
            request: request.into(),
        }
    }
}

impl Display for StubMapping {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.id, self.request)
    }
}

/// A request served by the mock server, together with the stub mapping that answered it.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeEvent {
    pub id: Uuid,
    pub request: LoggedRequest,
    /// `None` if no stub mapping matched the request.
    pub stub_mapping_id: Option<Uuid>,
}

impl ServeEvent {
    pub fn new(request: LoggedRequest, stub_mapping_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            stub_mapping_id,
        }
    }

    pub fn was_matched(&self) -> bool {
        self.stub_mapping_id.is_some()
    }
}
