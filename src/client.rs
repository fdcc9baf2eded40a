use crate::admin::Admin;
use crate::config::AdminConfig;
use crate::diff::Diff;
use crate::error::Error;
use crate::near_miss::NearMiss;
use crate::request::BodyPrintLimit;
use crate::settings::{DelayDistribution, GlobalSettings, GlobalSettingsHolder};
use crate::stub::{ServeEvent, StubMapping};
use crate::verification::VerificationFailure;
use crate::{more_than_or_exactly, CountMatchingStrategy, LoggedRequest, RequestPattern};
use log::{debug, warn};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// A client for the admin API of a remote mock server, focused on verifying the traffic
/// the server has seen.
///
/// All operations are asynchronous and talk to the server one call at a time; use
/// [`BlockingWireMock`] if you need to verify from synchronous code.
///
/// ### Example:
/// ```rust
/// use wiremock_client::{exactly, get_requested_for, InMemoryAdmin, LoggedRequest, WireMock};
/// use wiremock_client::matchers::url_equal_to;
/// use std::sync::Arc;
///
/// #[async_std::main]
/// async fn main() {
///     let admin = Arc::new(InMemoryAdmin::new());
///     let wiremock = WireMock::new(admin.clone());
///
///     // Exercise the system under test...
///     admin
///         .record(LoggedRequest::new(http::Method::GET, "/helth").unwrap())
///         .await;
///
///     // ...then check what it sent.
///     let error = wiremock
///         .verify_that(exactly(1), get_requested_for(url_equal_to("/health")))
///         .await
///         .unwrap_err();
///     let failure = error.verification_failure().unwrap();
///     assert!(failure.to_string().contains("<<<<< URL does not match"));
/// }
/// ```
///
/// [`BlockingWireMock`]: crate::BlockingWireMock
pub struct WireMock {
    admin: Arc<dyn Admin>,
    settings: GlobalSettingsHolder,
    body_print_limit: BodyPrintLimit,
}

impl Debug for WireMock {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("WireMock")
            .field("settings", &self.settings)
            .field("body_print_limit", &self.body_print_limit)
            .finish_non_exhaustive()
    }
}

impl WireMock {
    pub fn new(admin: Arc<dyn Admin>) -> Self {
        Self {
            admin,
            settings: GlobalSettingsHolder::default(),
            body_print_limit: BodyPrintLimit::default(),
        }
    }

    /// A client talking to `admin`, printing failures according to `config`.
    pub fn with_config(admin: Arc<dyn Admin>, config: &AdminConfig) -> Self {
        Self {
            body_print_limit: config.get_body_print_limit(),
            ..Self::new(admin)
        }
    }

    /// Verify that at least one logged request matches `pattern`.
    pub async fn verify(&self, pattern: impl Into<RequestPattern>) -> Result<(), Error> {
        self.verify_that(more_than_or_exactly(1), pattern).await
    }

    /// Verify that the number of logged requests matching `pattern` satisfies `expected`.
    ///
    /// An integer stands for an exact count. Declarative patterns are counted by the mock
    /// server; patterns with a custom matcher are evaluated here, over the whole request
    /// journal.
    ///
    /// If no request matched, the failure carries a diff against the closest logged
    /// request when there is one, or the list of requests the server received otherwise.
    pub async fn verify_that(
        &self,
        expected: impl Into<CountMatchingStrategy>,
        pattern: impl Into<RequestPattern>,
    ) -> Result<(), Error> {
        let expected = expected.into();
        let pattern = pattern.into();
        debug!("Verifying {} requests matching: {}", expected, pattern);

        let actual = self.count(&pattern).await?;
        if expected.matches(actual) {
            return Ok(());
        }

        let failure = if actual == 0 {
            self.diagnose_no_match(pattern, expected).await?
        } else {
            VerificationFailure::CountMismatch {
                pattern,
                expected,
                actual,
            }
        };
        Err(failure.into())
    }

    async fn count(&self, pattern: &RequestPattern) -> Result<u64, Error> {
        let (actual, journal_enabled) = match pattern {
            RequestPattern::Declarative(_) => {
                debug!("Counting matching requests on the mock server.");
                let result = self.admin.count_requests_matching(pattern).await?;
                (result.count, result.request_journal_enabled)
            }
            RequestPattern::Custom(matcher) => {
                debug!(
                    "Pattern uses custom matcher `{}`: fetching all requests to count locally.",
                    matcher.name
                );
                let result = self
                    .admin
                    .find_requests_matching(&RequestPattern::everything())
                    .await?;
                let actual = result
                    .requests
                    .iter()
                    .filter(|request| matcher.matches(request))
                    .count() as u64;
                (actual, result.request_journal_enabled)
            }
        };

        if !journal_enabled {
            warn!("The request journal is disabled on the mock server.");
            return Err(Error::JournalDisabled);
        }
        debug!("{} requests matched.", actual);
        Ok(actual)
    }

    // Second phase of a failed verification, run only once the count is known.
    async fn diagnose_no_match(
        &self,
        pattern: RequestPattern,
        expected: CountMatchingStrategy,
    ) -> Result<VerificationFailure, Error> {
        debug!("No request matched, looking for near misses.");
        let near_misses = self.find_near_misses_for(&pattern).await?;
        if let Some(closest) = near_misses.first() {
            let diff = Diff::new(&pattern, &closest.request);
            return Ok(VerificationFailure::NearMiss {
                pattern,
                expected,
                diff,
            });
        }

        let received = self.find(RequestPattern::everything()).await?;
        Ok(VerificationFailure::NoMatch {
            pattern,
            expected,
            received,
            body_print_limit: self.body_print_limit,
        })
    }

    /// Logged requests matching `pattern`.
    pub async fn find(
        &self,
        pattern: impl Into<RequestPattern>,
    ) -> Result<Vec<LoggedRequest>, Error> {
        let result = self.admin.find_requests_matching(&pattern.into()).await?;
        if !result.request_journal_enabled {
            warn!("The request journal is disabled on the mock server.");
            return Err(Error::JournalDisabled);
        }
        Ok(result.requests)
    }

    /// Logged requests that did not match any stub mapping.
    pub async fn find_unmatched_requests(&self) -> Result<Vec<LoggedRequest>, Error> {
        let result = self.admin.find_unmatched_requests().await?;
        if !result.request_journal_enabled {
            warn!("The request journal is disabled on the mock server.");
            return Err(Error::JournalDisabled);
        }
        Ok(result.requests)
    }

    /// Near misses for every logged request that did not match any stub mapping.
    pub async fn find_near_misses_for_all_unmatched_requests(
        &self,
    ) -> Result<Vec<NearMiss>, Error> {
        Ok(self
            .admin
            .find_near_misses_for_unmatched_requests()
            .await?
            .near_misses)
    }

    /// The stub mappings closest to matching `request`, best first.
    pub async fn find_top_near_misses_for(
        &self,
        request: &LoggedRequest,
    ) -> Result<Vec<NearMiss>, Error> {
        Ok(self
            .admin
            .find_top_near_misses_for_request(request)
            .await?
            .near_misses)
    }

    /// The logged requests closest to matching `pattern`, best first.
    pub async fn find_near_misses_for(
        &self,
        pattern: &RequestPattern,
    ) -> Result<Vec<NearMiss>, Error> {
        Ok(self
            .admin
            .find_top_near_misses_for_pattern(pattern)
            .await?
            .near_misses)
    }

    /// Add a fixed delay, in milliseconds, to every response of the mock server.
    pub async fn set_global_fixed_delay(&self, milliseconds: u64) -> Result<(), Error> {
        let settings = self.settings.get().with_fixed_delay(milliseconds);
        self.update_global_settings(settings).await
    }

    /// Add a random delay to every response of the mock server.
    pub async fn set_global_random_delay(
        &self,
        distribution: DelayDistribution,
    ) -> Result<(), Error> {
        let settings = self.settings.get().with_delay_distribution(distribution);
        self.update_global_settings(settings).await
    }

    /// The settings last applied to the mock server through this client.
    pub fn global_settings(&self) -> Arc<GlobalSettings> {
        self.settings.get()
    }

    // The cache only ever holds settings the server accepted.
    async fn update_global_settings(&self, settings: GlobalSettings) -> Result<(), Error> {
        debug!("Pushing global settings: {:?}", settings);
        self.admin.update_global_settings(&settings).await?;
        self.settings.replace_with(settings);
        Ok(())
    }

    /// Empty the request journal of the mock server.
    pub async fn reset_requests(&self) -> Result<(), Error> {
        Ok(self.admin.reset_requests().await?)
    }

    /// Every request the mock server served, with the stub mapping that answered it.
    pub async fn get_serve_events(&self) -> Result<Vec<ServeEvent>, Error> {
        let result = self.admin.get_serve_events().await?;
        if !result.request_journal_enabled {
            warn!("The request journal is disabled on the mock server.");
            return Err(Error::JournalDisabled);
        }
        Ok(result.serve_events)
    }

    /// Register a stub mapping for `pattern` and return it, with its newly assigned id.
    pub async fn stub_for(&self, pattern: impl Into<RequestPattern>) -> Result<StubMapping, Error> {
        let stub = StubMapping::new(pattern);
        self.register(&stub).await?;
        Ok(stub)
    }

    /// Register `stub` as is.
    pub async fn register(&self, stub: &StubMapping) -> Result<(), Error> {
        debug!("Registering stub mapping {}", stub);
        Ok(self.admin.add_stub_mapping(stub).await?)
    }

    /// Replace the stub mapping that has the same id as `stub`.
    pub async fn edit_stub(&self, stub: &StubMapping) -> Result<(), Error> {
        if self.admin.edit_stub_mapping(stub).await? {
            Ok(())
        } else {
            Err(Error::StubNotFound(stub.id))
        }
    }

    pub async fn remove_stub(&self, id: Uuid) -> Result<(), Error> {
        if self.admin.remove_stub_mapping(id).await? {
            Ok(())
        } else {
            Err(Error::StubNotFound(id))
        }
    }

    pub async fn list_all_stub_mappings(&self) -> Result<Vec<StubMapping>, Error> {
        Ok(self.admin.list_stub_mappings().await?)
    }

    pub async fn get_single_stub_mapping(&self, id: Uuid) -> Result<StubMapping, Error> {
        self.admin
            .get_stub_mapping(id)
            .await?
            .ok_or(Error::StubNotFound(id))
    }

    /// Remove every stub mapping. The request journal is left alone.
    pub async fn reset_mappings(&self) -> Result<(), Error> {
        Ok(self.admin.reset_mappings().await?)
    }

    /// Remove every stub mapping and empty the request journal.
    pub async fn reset_all(&self) -> Result<(), Error> {
        Ok(self.admin.reset_all().await?)
    }
}
