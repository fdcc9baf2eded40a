use crate::error::Error;
use crate::near_miss::NearMiss;
use crate::settings::{DelayDistribution, GlobalSettings};
use crate::stub::{ServeEvent, StubMapping};
use crate::{CountMatchingStrategy, LoggedRequest, RequestPattern, WireMock};
use futures::executor::block_on;
use std::sync::Arc;
use uuid::Uuid;

/// A synchronous facade over [`WireMock`]: every call blocks the current thread until the
/// admin API has answered.
///
/// Do not use it from within an async task; `.await` the [`WireMock`] methods instead.
#[derive(Debug)]
pub struct BlockingWireMock {
    inner: WireMock,
}

impl BlockingWireMock {
    pub fn new(inner: WireMock) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &WireMock {
        &self.inner
    }

    pub fn verify(&self, pattern: impl Into<RequestPattern>) -> Result<(), Error> {
        block_on(self.inner.verify(pattern))
    }

    pub fn verify_that(
        &self,
        expected: impl Into<CountMatchingStrategy>,
        pattern: impl Into<RequestPattern>,
    ) -> Result<(), Error> {
        block_on(self.inner.verify_that(expected, pattern))
    }

    pub fn find(&self, pattern: impl Into<RequestPattern>) -> Result<Vec<LoggedRequest>, Error> {
        block_on(self.inner.find(pattern))
    }

    pub fn find_unmatched_requests(&self) -> Result<Vec<LoggedRequest>, Error> {
        block_on(self.inner.find_unmatched_requests())
    }

    pub fn find_near_misses_for_all_unmatched_requests(&self) -> Result<Vec<NearMiss>, Error> {
        block_on(self.inner.find_near_misses_for_all_unmatched_requests())
    }

    pub fn find_top_near_misses_for(&self, request: &LoggedRequest) -> Result<Vec<NearMiss>, Error> {
        block_on(self.inner.find_top_near_misses_for(request))
    }

    pub fn find_near_misses_for(&self, pattern: &RequestPattern) -> Result<Vec<NearMiss>, Error> {
        block_on(self.inner.find_near_misses_for(pattern))
    }

    pub fn set_global_fixed_delay(&self, milliseconds: u64) -> Result<(), Error> {
        block_on(self.inner.set_global_fixed_delay(milliseconds))
    }

    pub fn set_global_random_delay(&self, distribution: DelayDistribution) -> Result<(), Error> {
        block_on(self.inner.set_global_random_delay(distribution))
    }

    pub fn global_settings(&self) -> Arc<GlobalSettings> {
        self.inner.global_settings()
    }

    pub fn reset_requests(&self) -> Result<(), Error> {
        block_on(self.inner.reset_requests())
    }

    pub fn get_serve_events(&self) -> Result<Vec<ServeEvent>, Error> {
        block_on(self.inner.get_serve_events())
    }

    pub fn stub_for(&self, pattern: impl Into<RequestPattern>) -> Result<StubMapping, Error> {
        block_on(self.inner.stub_for(pattern))
    }

    pub fn register(&self, stub: &StubMapping) -> Result<(), Error> {
        block_on(self.inner.register(stub))
    }

    pub fn edit_stub(&self, stub: &StubMapping) -> Result<(), Error> {
        block_on(self.inner.edit_stub(stub))
    }

    pub fn remove_stub(&self, id: Uuid) -> Result<(), Error> {
        block_on(self.inner.remove_stub(id))
    }

    pub fn list_all_stub_mappings(&self) -> Result<Vec<StubMapping>, Error> {
        block_on(self.inner.list_all_stub_mappings())
    }

    pub fn get_single_stub_mapping(&self, id: Uuid) -> Result<StubMapping, Error> {
        block_on(self.inner.get_single_stub_mapping(id))
    }

    pub fn reset_mappings(&self) -> Result<(), Error> {
        block_on(self.inner.reset_mappings())
    }

    pub fn reset_all(&self) -> Result<(), Error> {
        block_on(self.inner.reset_all())
    }
}

impl From<WireMock> for BlockingWireMock {
    fn from(inner: WireMock) -> Self {
        Self::new(inner)
    }
}
