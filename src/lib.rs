#![allow(clippy::needless_doctest_main)]
//! `wiremock-client` verifies the traffic recorded by a remote HTTP mock server.
//!
//! Describe the requests you expect with a [`RequestPattern`], exercise the system under
//! test, then ask the mock server how many logged requests matched. When the answer does
//! not meet your expectation you get more than a bare count: if nothing matched at all,
//! the failure carries a diff against the closest request the server did receive.
//!
//! # Table of Contents
//! 1. [Getting started](#getting-started)
//! 2. [Expectations](#expectations)
//! 3. [Custom matchers](#custom-matchers)
//! 4. [Near misses](#near-misses)
//! 5. [Global settings](#global-settings)
//! 6. [Stub mappings](#stub-mappings)
//! 7. [Choosing a client](#choosing-a-client)
//!
//! ## Getting started
//! ```rust
//! use wiremock_client::{get_requested_for, InMemoryAdmin, LoggedRequest, WireMock};
//! use wiremock_client::matchers::url_equal_to;
//! use std::sync::Arc;
//!
//! #[async_std::main]
//! async fn main() {
//!     // Any `Admin` implementation will do - here, an in-process one.
//!     let admin = Arc::new(InMemoryAdmin::new());
//!     let wiremock = WireMock::new(admin.clone());
//!
//!     // The system under test calls the mock server...
//!     admin
//!         .record(LoggedRequest::new(http::Method::GET, "/health").unwrap())
//!         .await;
//!
//!     // ...and we verify it did.
//!     wiremock
//!         .verify(get_requested_for(url_equal_to("/health")))
//!         .await
//!         .unwrap();
//! }
//! ```
//!
//! ## Expectations
//!
//! [`WireMock::verify_that`] takes a [`CountMatchingStrategy`]: [`less_than`],
//! [`less_than_or_exactly`], [`exactly`], [`more_than_or_exactly`] or [`more_than`].
//! A plain integer means "exactly", [`WireMock::verify`] means "at least once".
//!
//! ## Custom matchers
//!
//! Patterns built with [`request_made_for`] run your own [`Match`] implementation.
//! The mock server cannot evaluate them, so the client fetches the whole request journal
//! and counts matches locally.
//!
//! ## Near misses
//!
//! A near miss is a logged request that did not match a pattern but came close.
//! Verifications use them to explain why nothing matched; you can look them up yourself
//! with [`WireMock::find_near_misses_for`], [`WireMock::find_top_near_misses_for`] and
//! [`WireMock::find_near_misses_for_all_unmatched_requests`].
//!
//! ## Global settings
//!
//! [`WireMock::set_global_fixed_delay`] and [`WireMock::set_global_random_delay`] push a
//! full [`GlobalSettings`] snapshot to the server and cache it locally once the server
//! accepted it.
//!
//! ## Stub mappings
//!
//! A request that matches no [`StubMapping`] is "unmatched": that is what
//! [`WireMock::find_unmatched_requests`] returns, and the stubs are what
//! [`WireMock::find_top_near_misses_for`] ranks. Manage them with [`WireMock::stub_for`],
//! [`WireMock::edit_stub`], [`WireMock::remove_stub`] and [`WireMock::reset_mappings`].
//!
//! ## Choosing a client
//!
//! [`WireMock`] is asynchronous, [`BlockingWireMock`] blocks the calling thread.
//! [`ClientContext`] keeps a default client around for a test scope, built from an
//! [`AdminConfig`].
mod admin;
mod blocking;
mod client;
mod config;
mod context;
mod count;
mod diff;
mod error;
pub mod matchers;
mod near_miss;
mod pattern;
mod request;
mod settings;
mod stub;
mod verification;

pub use admin::{
    Admin, FindNearMissesResult, FindRequestsResult, FindServeEventsResult, InMemoryAdmin,
    TransportError, VerificationResult,
};
pub use blocking::BlockingWireMock;
pub use client::WireMock;
pub use config::AdminConfig;
pub use context::{ClientContext, Connect};
pub use count::{
    exactly, less_than, less_than_or_exactly, more_than, more_than_or_exactly, CountComparison,
    CountMatchingStrategy,
};
pub use diff::{inline_diff, Diff, DiffLine};
pub use error::Error;
pub use matchers::Match;
pub use near_miss::{MatchDistance, NearMiss, NearMissCalculator, MAX_NEAR_MISSES};
pub use pattern::{
    all_requests, any_requested_for, delete_requested_for, get_requested_for,
    head_requested_for, options_requested_for, patch_requested_for, post_requested_for,
    put_requested_for, request_made_for, trace_requested_for, CustomMatcher,
    DeclarativePattern, Parameters, RequestPattern, RequestPatternBuilder,
};
pub use request::{BodyPrintLimit, LoggedRequest};
pub use settings::{DelayDistribution, GlobalSettings, GlobalSettingsHolder};
pub use stub::{ServeEvent, StubMapping};
pub use verification::VerificationFailure;
