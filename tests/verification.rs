use async_trait::async_trait;
use http::Method;
use std::sync::{Arc, Mutex};
use wiremock_client::matchers::{url_equal_to, url_path_equal_to};
use wiremock_client::{
    exactly, get_requested_for, less_than, less_than_or_exactly, more_than,
    more_than_or_exactly, post_requested_for, request_made_for, Admin, CountMatchingStrategy,
    Error, FindNearMissesResult, FindRequestsResult, FindServeEventsResult, GlobalSettings,
    LoggedRequest, MatchDistance, NearMiss, Parameters, RequestPattern, StubMapping,
    TransportError, VerificationFailure, VerificationResult, WireMock,
};
use uuid::Uuid;

/// An `Admin` returning canned answers and keeping track of the operations it served.
struct ScriptedAdmin {
    count: VerificationResult,
    journal: FindRequestsResult,
    near_misses: Vec<NearMiss>,
    unreachable: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedAdmin {
    fn new() -> Self {
        Self {
            count: VerificationResult::new(0),
            journal: FindRequestsResult::new(vec![]),
            near_misses: vec![],
            unreachable: false,
            calls: Mutex::new(vec![]),
        }
    }

    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn serve(&self, operation: &'static str) -> Result<(), TransportError> {
        self.calls.lock().unwrap().push(operation);
        if self.unreachable {
            Err(TransportError::new("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Admin for ScriptedAdmin {
    async fn count_requests_matching(
        &self,
        _pattern: &RequestPattern,
    ) -> Result<VerificationResult, TransportError> {
        self.serve("count_requests_matching")?;
        Ok(self.count)
    }

    async fn find_requests_matching(
        &self,
        _pattern: &RequestPattern,
    ) -> Result<FindRequestsResult, TransportError> {
        self.serve("find_requests_matching")?;
        Ok(self.journal.clone())
    }

    async fn find_unmatched_requests(&self) -> Result<FindRequestsResult, TransportError> {
        self.serve("find_unmatched_requests")?;
        Ok(self.journal.clone())
    }

    async fn find_near_misses_for_unmatched_requests(
        &self,
    ) -> Result<FindNearMissesResult, TransportError> {
        self.serve("find_near_misses_for_unmatched_requests")?;
        Ok(FindNearMissesResult::new(self.near_misses.clone()))
    }

    async fn find_top_near_misses_for_request(
        &self,
        _request: &LoggedRequest,
    ) -> Result<FindNearMissesResult, TransportError> {
        self.serve("find_top_near_misses_for_request")?;
        Ok(FindNearMissesResult::new(self.near_misses.clone()))
    }

    async fn find_top_near_misses_for_pattern(
        &self,
        _pattern: &RequestPattern,
    ) -> Result<FindNearMissesResult, TransportError> {
        self.serve("find_top_near_misses_for_pattern")?;
        Ok(FindNearMissesResult::new(self.near_misses.clone()))
    }

    async fn update_global_settings(
        &self,
        _settings: &GlobalSettings,
    ) -> Result<(), TransportError> {
        self.serve("update_global_settings")
    }

    async fn reset_requests(&self) -> Result<(), TransportError> {
        self.serve("reset_requests")
    }

    async fn get_serve_events(&self) -> Result<FindServeEventsResult, TransportError> {
        self.serve("get_serve_events")?;
        Ok(FindServeEventsResult::new(vec![]))
    }

    async fn add_stub_mapping(&self, _stub: &StubMapping) -> Result<(), TransportError> {
        self.serve("add_stub_mapping")
    }

    async fn edit_stub_mapping(&self, _stub: &StubMapping) -> Result<bool, TransportError> {
        self.serve("edit_stub_mapping")?;
        Ok(false)
    }

    async fn remove_stub_mapping(&self, _id: Uuid) -> Result<bool, TransportError> {
        self.serve("remove_stub_mapping")?;
        Ok(false)
    }

    async fn list_stub_mappings(&self) -> Result<Vec<StubMapping>, TransportError> {
        self.serve("list_stub_mappings")?;
        Ok(vec![])
    }

    async fn get_stub_mapping(&self, _id: Uuid) -> Result<Option<StubMapping>, TransportError> {
        self.serve("get_stub_mapping")?;
        Ok(None)
    }

    async fn reset_mappings(&self) -> Result<(), TransportError> {
        self.serve("reset_mappings")
    }

    async fn reset_all(&self) -> Result<(), TransportError> {
        self.serve("reset_all")
    }
}

fn request(method: Method, path: &str) -> LoggedRequest {
    LoggedRequest::new(method, path).unwrap()
}

fn near_miss(pattern: &RequestPattern, request: LoggedRequest, distance: f64) -> NearMiss {
    NearMiss {
        request,
        pattern: pattern.clone(),
        distance: MatchDistance::new(distance),
    }
}

fn failure(result: Result<(), Error>) -> VerificationFailure {
    match result {
        Err(Error::Verification(failure)) => failure,
        other => panic!("Expected a verification failure, got {:?}", other),
    }
}

fn client(admin: &Arc<ScriptedAdmin>) -> WireMock {
    WireMock::new(admin.clone())
}

#[async_std::test]
async fn declarative_patterns_are_counted_by_the_server() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        count: VerificationResult::new(2),
        ..ScriptedAdmin::new()
    });

    // Act
    let outcome = client(&admin)
        .verify_that(exactly(2), get_requested_for(url_equal_to("/orders")))
        .await;

    // Assert
    assert!(outcome.is_ok());
    assert_eq!(admin.calls(), vec!["count_requests_matching"]);
}

#[async_std::test]
async fn a_wrong_non_zero_count_is_reported_without_looking_for_near_misses() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        count: VerificationResult::new(1),
        ..ScriptedAdmin::new()
    });

    // Act
    let failure = failure(
        client(&admin)
            .verify_that(exactly(2), get_requested_for(url_equal_to("/orders")))
            .await,
    );

    // Assert
    assert!(matches!(failure, VerificationFailure::CountMismatch { .. }));
    assert_eq!(failure.actual(), 1);
    assert_eq!(failure.expected(), exactly(2));
    assert_eq!(admin.calls(), vec!["count_requests_matching"]);
}

#[async_std::test]
async fn custom_matchers_are_counted_locally_over_the_whole_journal() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        journal: FindRequestsResult::new(vec![
            request(Method::POST, "/orders").with_body(r#"{"priority": "high"}"#),
            request(Method::POST, "/orders").with_body(r#"{"priority": "low"}"#),
            request(Method::POST, "/orders").with_body(r#"{"priority": "high"}"#),
        ]),
        ..ScriptedAdmin::new()
    });
    let high_priority = request_made_for(
        "high-priority",
        Parameters::new(),
        |request: &LoggedRequest| {
            request
                .body_json::<serde_json::Value>()
                .map(|body| body["priority"] == "high")
                .unwrap_or(false)
        },
    );

    // Act
    let outcome = client(&admin)
        .verify_that(more_than_or_exactly(2), high_priority)
        .await;

    // Assert
    assert!(outcome.is_ok());
    assert_eq!(admin.calls(), vec!["find_requests_matching"]);
}

#[async_std::test]
async fn custom_matcher_counts_are_reported_when_they_fall_short() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        journal: FindRequestsResult::new(vec![
            request(Method::GET, "/a"),
            request(Method::GET, "/b"),
            request(Method::GET, "/a"),
        ]),
        ..ScriptedAdmin::new()
    });
    let hits_a = request_made_for("hits-a", Parameters::new(), |request: &LoggedRequest| {
        request.url.path() == "/a"
    });

    // Act
    let failure = failure(client(&admin).verify_that(3, hits_a).await);

    // Assert
    assert_eq!(failure.actual(), 2);
    assert!(!admin.calls().contains(&"count_requests_matching"));
}

#[async_std::test]
async fn a_disabled_journal_always_fails_verification() {
    let strategies: Vec<CountMatchingStrategy> = vec![
        less_than(1),
        less_than_or_exactly(0),
        exactly(0),
        more_than_or_exactly(0),
        more_than(5),
    ];

    for strategy in strategies {
        // Arrange
        let admin = Arc::new(ScriptedAdmin {
            count: VerificationResult::journal_disabled(),
            ..ScriptedAdmin::new()
        });

        // Act
        let outcome = client(&admin)
            .verify_that(strategy, get_requested_for(url_equal_to("/orders")))
            .await;

        // Assert
        assert!(
            matches!(outcome, Err(Error::JournalDisabled)),
            "{} should have failed with a disabled journal",
            strategy
        );
        assert_eq!(admin.calls(), vec!["count_requests_matching"]);
    }
}

#[async_std::test]
async fn a_disabled_journal_fails_custom_matcher_verification_too() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        journal: FindRequestsResult::journal_disabled(),
        ..ScriptedAdmin::new()
    });
    let anything = request_made_for("anything", Parameters::new(), |_: &LoggedRequest| true);

    // Act
    let outcome = client(&admin).verify_that(exactly(0), anything).await;

    // Assert
    assert!(matches!(outcome, Err(Error::JournalDisabled)));
}

#[async_std::test]
async fn nothing_matched_reports_a_diff_against_the_best_near_miss() {
    // Arrange
    let pattern = get_requested_for(url_equal_to("/health")).build();
    let admin = Arc::new(ScriptedAdmin {
        near_misses: vec![
            near_miss(&pattern, request(Method::GET, "/helth"), 0.04),
            near_miss(&pattern, request(Method::GET, "/metrics"), 0.3),
        ],
        ..ScriptedAdmin::new()
    });

    // Act
    let failure = failure(client(&admin).verify_that(exactly(1), pattern).await);

    // Assert
    let diff = failure.diff().expect("a diff against the closest request");
    let mismatches: Vec<_> = diff.mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].field, "URL");
    assert_eq!(mismatches[0].actual, "/helth");
    assert_eq!(mismatches[0].inline.as_deref(), Some("/he[-a-]lth"));
    assert_eq!(failure.actual(), 0);
    assert_eq!(
        admin.calls(),
        vec!["count_requests_matching", "find_top_near_misses_for_pattern"]
    );
}

#[async_std::test]
async fn nothing_matched_and_nothing_close_lists_all_requests() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        journal: FindRequestsResult::new(vec![request(Method::DELETE, "/carts/7")]),
        ..ScriptedAdmin::new()
    });

    // Act
    let failure = failure(
        client(&admin)
            .verify(post_requested_for(url_path_equal_to("/orders")))
            .await,
    );

    // Assert
    match &failure {
        VerificationFailure::NoMatch { received, .. } => assert_eq!(received.len(), 1),
        other => panic!("Expected a no-match failure, got {:?}", other),
    }
    assert_eq!(failure.expected(), more_than_or_exactly(1));
    assert!(failure
        .to_string()
        .contains("Received requests:\n- Request #1\n\tDELETE http://localhost/carts/7"));
    assert_eq!(
        admin.calls(),
        vec![
            "count_requests_matching",
            "find_top_near_misses_for_pattern",
            "find_requests_matching"
        ]
    );
}

#[async_std::test]
async fn verification_is_idempotent_against_an_unchanged_server() {
    // Arrange
    let pattern = get_requested_for(url_equal_to("/health")).build();
    let admin = Arc::new(ScriptedAdmin {
        near_misses: vec![near_miss(&pattern, request(Method::GET, "/helth"), 0.04)],
        ..ScriptedAdmin::new()
    });
    let wiremock = client(&admin);

    // Act
    let first = failure(wiremock.verify_that(1, pattern.clone()).await);
    let second = failure(wiremock.verify_that(1, pattern).await);

    // Assert
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(first.diff(), second.diff());
}

#[tokio::test]
async fn transport_errors_are_not_verification_failures() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        unreachable: true,
        ..ScriptedAdmin::new()
    });

    // Act
    let outcome = client(&admin)
        .verify_that(exactly(1), get_requested_for(url_equal_to("/health")))
        .await;

    // Assert
    match outcome {
        Err(Error::Transport(error)) => assert_eq!(error.message(), "connection refused"),
        other => panic!("Expected a transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn transport_errors_during_diagnosis_are_propagated() {
    // Arrange - the count is served, then the server goes away.
    struct FlakyAdmin(ScriptedAdmin);

    #[async_trait]
    impl Admin for FlakyAdmin {
        async fn count_requests_matching(
            &self,
            pattern: &RequestPattern,
        ) -> Result<VerificationResult, TransportError> {
            self.0.count_requests_matching(pattern).await
        }
        async fn find_requests_matching(
            &self,
            _: &RequestPattern,
        ) -> Result<FindRequestsResult, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn find_unmatched_requests(&self) -> Result<FindRequestsResult, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn find_near_misses_for_unmatched_requests(
            &self,
        ) -> Result<FindNearMissesResult, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn find_top_near_misses_for_request(
            &self,
            _: &LoggedRequest,
        ) -> Result<FindNearMissesResult, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn find_top_near_misses_for_pattern(
            &self,
            _: &RequestPattern,
        ) -> Result<FindNearMissesResult, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn update_global_settings(&self, _: &GlobalSettings) -> Result<(), TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn reset_requests(&self) -> Result<(), TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn get_serve_events(&self) -> Result<FindServeEventsResult, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn add_stub_mapping(&self, _: &StubMapping) -> Result<(), TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn edit_stub_mapping(&self, _: &StubMapping) -> Result<bool, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn remove_stub_mapping(&self, _: Uuid) -> Result<bool, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn list_stub_mappings(&self) -> Result<Vec<StubMapping>, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn get_stub_mapping(&self, _: Uuid) -> Result<Option<StubMapping>, TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn reset_mappings(&self) -> Result<(), TransportError> {
            Err(TransportError::new("timed out"))
        }
        async fn reset_all(&self) -> Result<(), TransportError> {
            Err(TransportError::new("timed out"))
        }
    }
    let wiremock = WireMock::new(Arc::new(FlakyAdmin(ScriptedAdmin::new())));

    // Act
    let outcome = wiremock
        .verify_that(exactly(1), get_requested_for(url_equal_to("/health")))
        .await;

    // Assert
    assert!(matches!(outcome, Err(Error::Transport(_))));
}

#[async_std::test]
async fn near_miss_lookups_return_the_resolver_order_unchanged() {
    // Arrange
    let pattern = get_requested_for(url_equal_to("/health")).build();
    let admin = Arc::new(ScriptedAdmin {
        near_misses: vec![
            near_miss(&pattern, request(Method::GET, "/b"), 0.9),
            near_miss(&pattern, request(Method::GET, "/a"), 0.1),
        ],
        ..ScriptedAdmin::new()
    });
    let wiremock = client(&admin);

    // Act
    let for_pattern = wiremock.find_near_misses_for(&pattern).await.unwrap();
    let for_request = wiremock
        .find_top_near_misses_for(&request(Method::GET, "/x"))
        .await
        .unwrap();
    let for_unmatched = wiremock
        .find_near_misses_for_all_unmatched_requests()
        .await
        .unwrap();

    // Assert
    for near_misses in [for_pattern, for_request, for_unmatched] {
        let paths: Vec<_> = near_misses
            .iter()
            .map(|near_miss| near_miss.request.url.path().to_owned())
            .collect();
        assert_eq!(paths, vec!["/b", "/a"]);
    }
}

#[async_std::test]
async fn find_checks_the_journal() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        journal: FindRequestsResult::journal_disabled(),
        ..ScriptedAdmin::new()
    });
    let wiremock = client(&admin);

    // Act
    let found = wiremock.find(RequestPattern::everything()).await;
    let unmatched = wiremock.find_unmatched_requests().await;

    // Assert
    assert!(matches!(found, Err(Error::JournalDisabled)));
    assert!(matches!(unmatched, Err(Error::JournalDisabled)));
}

#[async_std::test]
async fn a_failed_settings_push_leaves_the_cache_untouched() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin {
        unreachable: true,
        ..ScriptedAdmin::new()
    });
    let wiremock = client(&admin);

    // Act
    let outcome = wiremock.set_global_fixed_delay(500).await;

    // Assert
    assert!(matches!(outcome, Err(Error::Transport(_))));
    assert_eq!(wiremock.global_settings().fixed_delay, None);
}

#[async_std::test]
async fn unknown_stub_ids_are_reported() {
    // Arrange
    let admin = Arc::new(ScriptedAdmin::new());
    let wiremock = client(&admin);
    let id = Uuid::new_v4();

    // Act
    let removed = wiremock.remove_stub(id).await;
    let fetched = wiremock.get_single_stub_mapping(id).await;

    // Assert
    assert!(matches!(removed, Err(Error::StubNotFound(missing)) if missing == id));
    assert!(matches!(fetched, Err(Error::StubNotFound(missing)) if missing == id));
    assert_eq!(admin.calls(), vec!["remove_stub_mapping", "get_stub_mapping"]);
}
