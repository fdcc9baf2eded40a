use crate::admin::{
    Admin, FindNearMissesResult, FindRequestsResult, FindServeEventsResult, TransportError,
    VerificationResult,
};
use crate::near_miss::NearMissCalculator;
use crate::settings::GlobalSettings;
use crate::stub::{ServeEvent, StubMapping};
use crate::{LoggedRequest, RequestPattern};
use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;
use uuid::Uuid;

/// An [`Admin`] that keeps everything in process: a request journal, the stub mappings
/// requests are matched against, and the global settings.
///
/// Handy to exercise verification code without a running mock server:
/// ```rust
/// use wiremock_client::{get_requested_for, InMemoryAdmin, LoggedRequest, WireMock};
/// use wiremock_client::matchers::url_equal_to;
/// use std::sync::Arc;
///
/// #[async_std::main]
/// async fn main() {
///     let admin = Arc::new(InMemoryAdmin::new());
///     admin
///         .record(LoggedRequest::new(http::Method::GET, "/health").unwrap())
///         .await;
///
///     let wiremock = WireMock::new(admin);
///     wiremock
///         .verify_that(1, get_requested_for(url_equal_to("/health")))
///         .await
///         .unwrap();
/// }
/// ```
#[derive(Debug)]
pub struct InMemoryAdmin {
    state: RwLock<State>,
    calculator: NearMissCalculator,
}

#[derive(Debug, Default)]
struct State {
    // `None` when the journal is disabled.
    journal: Option<Vec<ServeEvent>>,
    stubs: Vec<StubMapping>,
    settings: GlobalSettings,
    n_settings_updates: u64,
}

impl State {
    fn requests(&self) -> impl Iterator<Item = &LoggedRequest> + '_ {
        self.journal.iter().flatten().map(|event| &event.request)
    }

    fn stub_patterns(&self) -> Vec<RequestPattern> {
        self.stubs.iter().map(|stub| stub.request.clone()).collect()
    }
}

impl InMemoryAdmin {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State {
                journal: Some(vec![]),
                ..State::default()
            }),
            calculator: NearMissCalculator::default(),
        }
    }

    /// An admin whose request journal is disabled: requests are not recorded and
    /// count/find queries report it.
    pub fn with_journal_disabled() -> Self {
        Self {
            state: RwLock::new(State::default()),
            calculator: NearMissCalculator::default(),
        }
    }

    /// Serve a request: it is matched against the stub mappings registered right now
    /// (the most recently added wins) and added to the journal.
    /// A no-op if the journal is disabled.
    pub async fn record(&self, request: LoggedRequest) {
        let mut state = self.state.write().await;
        let stub_mapping_id = state
            .stubs
            .iter()
            .rev()
            .find(|stub| stub.request.matches(&request))
            .map(|stub| stub.id);
        if let Some(journal) = state.journal.as_mut() {
            debug!("Recording request: {} {}", request.method, request.url);
            journal.push(ServeEvent::new(request, stub_mapping_id));
        }
    }

    /// The settings last pushed through [`Admin::update_global_settings`].
    pub async fn global_settings(&self) -> GlobalSettings {
        self.state.read().await.settings.clone()
    }

    /// How many times the global settings have been updated.
    pub async fn n_settings_updates(&self) -> u64 {
        self.state.read().await.n_settings_updates
    }

    fn unmatched(state: &State) -> Vec<&LoggedRequest> {
        state
            .journal
            .iter()
            .flatten()
            .filter(|event| !event.was_matched())
            .map(|event| &event.request)
            .collect()
    }
}

impl Default for InMemoryAdmin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Admin for InMemoryAdmin {
    async fn count_requests_matching(
        &self,
        pattern: &RequestPattern,
    ) -> Result<VerificationResult, TransportError> {
        let state = self.state.read().await;
        if state.journal.is_none() {
            return Ok(VerificationResult::journal_disabled());
        }
        Ok(VerificationResult::new(
            state.requests().filter(|request| pattern.matches(request)).count() as u64,
        ))
    }

    async fn find_requests_matching(
        &self,
        pattern: &RequestPattern,
    ) -> Result<FindRequestsResult, TransportError> {
        let state = self.state.read().await;
        if state.journal.is_none() {
            return Ok(FindRequestsResult::journal_disabled());
        }
        Ok(FindRequestsResult::new(
            state
                .requests()
                .filter(|request| pattern.matches(request))
                .cloned()
                .collect(),
        ))
    }

    async fn find_unmatched_requests(&self) -> Result<FindRequestsResult, TransportError> {
        let state = self.state.read().await;
        if state.journal.is_none() {
            return Ok(FindRequestsResult::journal_disabled());
        }
        Ok(FindRequestsResult::new(
            Self::unmatched(&state).into_iter().cloned().collect(),
        ))
    }

    async fn find_near_misses_for_unmatched_requests(
        &self,
    ) -> Result<FindNearMissesResult, TransportError> {
        let state = self.state.read().await;
        let patterns = state.stub_patterns();
        let near_misses = Self::unmatched(&state)
            .into_iter()
            .flat_map(|request| self.calculator.near_misses_for_request(request, &patterns))
            .collect();
        Ok(FindNearMissesResult::new(near_misses))
    }

    async fn find_top_near_misses_for_request(
        &self,
        request: &LoggedRequest,
    ) -> Result<FindNearMissesResult, TransportError> {
        let state = self.state.read().await;
        Ok(FindNearMissesResult::new(
            self.calculator
                .near_misses_for_request(request, &state.stub_patterns()),
        ))
    }

    async fn find_top_near_misses_for_pattern(
        &self,
        pattern: &RequestPattern,
    ) -> Result<FindNearMissesResult, TransportError> {
        let state = self.state.read().await;
        let journal: Vec<LoggedRequest> = state.requests().cloned().collect();
        Ok(FindNearMissesResult::new(
            self.calculator.near_misses_for_pattern(pattern, &journal),
        ))
    }

    async fn update_global_settings(
        &self,
        settings: &GlobalSettings,
    ) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        state.settings = settings.clone();
        state.n_settings_updates += 1;
        Ok(())
    }

    async fn reset_requests(&self) -> Result<(), TransportError> {
        if let Some(journal) = self.state.write().await.journal.as_mut() {
            journal.clear();
        }
        Ok(())
    }

    async fn get_serve_events(&self) -> Result<FindServeEventsResult, TransportError> {
        Ok(match &self.state.read().await.journal {
            Some(journal) => FindServeEventsResult::new(journal.clone()),
            None => FindServeEventsResult::journal_disabled(),
        })
    }

    async fn add_stub_mapping(&self, stub: &StubMapping) -> Result<(), TransportError> {
        debug!("Registering stub mapping {}", stub);
        self.state.write().await.stubs.push(stub.clone());
        Ok(())
    }

    async fn edit_stub_mapping(&self, stub: &StubMapping) -> Result<bool, TransportError> {
        let mut state = self.state.write().await;
        match state.stubs.iter_mut().find(|existing| existing.id == stub.id) {
            Some(existing) => {
                *existing = stub.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_stub_mapping(&self, id: Uuid) -> Result<bool, TransportError> {
        let mut state = self.state.write().await;
        let before = state.stubs.len();
        state.stubs.retain(|stub| stub.id != id);
        Ok(state.stubs.len() != before)
    }

    async fn list_stub_mappings(&self) -> Result<Vec<StubMapping>, TransportError> {
        Ok(self.state.read().await.stubs.clone())
    }

    async fn get_stub_mapping(&self, id: Uuid) -> Result<Option<StubMapping>, TransportError> {
        Ok(self
            .state
            .read()
            .await
            .stubs
            .iter()
            .find(|stub| stub.id == id)
            .cloned())
    }

    async fn reset_mappings(&self) -> Result<(), TransportError> {
        self.state.write().await.stubs.clear();
        Ok(())
    }

    async fn reset_all(&self) -> Result<(), TransportError> {
        let mut state = self.state.write().await;
        state.stubs.clear();
        if let Some(journal) = state.journal.as_mut() {
            journal.clear();
        }
        Ok(())
    }
}
