//! Building blocks for declarative request patterns.
//!
//! A declarative pattern is made of a [`UrlPattern`] and any number of [`StringValuePattern`]s
//! applied to headers, query parameters and the body. The remote mock server knows how to
//! evaluate all of them, which is why they can be counted server-side.
//!
//! Anything beyond that can be expressed with the [`Match`] trait and attached to a pattern
//! as a custom matcher (see [`request_made_for`]): `Fn` closures that take an immutable
//! [`LoggedRequest`] reference and return a boolean implement [`Match`] out of the box.
//!
//! [`request_made_for`]: crate::request_made_for
use crate::LoggedRequest;
use assert_json_diff::{assert_json_matches_no_panic, CompareMode, Config};
use regex::Regex;
use serde_json::Value;
use similar::{ChangeTag, TextDiff};
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

// Character diffs are O(N·D): past this budget the diff gives up on minimality and
// reports the remaining text as replaced.
const DIFF_TIMEOUT: Duration = Duration::from_millis(100);

/// Anything that implements `Match` can be used as a custom matcher.
///
/// Custom matchers are caller-defined code: the remote mock server cannot evaluate them,
/// so verifications involving a custom matcher fetch the whole request journal and
/// filter it locally.
/// ```rust
/// use wiremock_client::{LoggedRequest, Match};
///
/// // Match requests whose body has an odd length.
/// pub struct OddBodyMatcher;
///
/// impl Match for OddBodyMatcher {
///     fn matches(&self, request: &LoggedRequest) -> bool {
///         request.body.len() % 2 == 1
///     }
/// }
///
/// let request = LoggedRequest::new(http::Method::POST, "/orders")
///     .unwrap()
///     .with_body("odd");
/// assert!(OddBodyMatcher.matches(&request));
/// ```
pub trait Match: Send + Sync {
    /// Given a reference to a `LoggedRequest`, determine if it should match or not given
    /// a specific criterion.
    fn matches(&self, request: &LoggedRequest) -> bool;
}

/// Implement the `Match` trait for all closures, out of the box,
/// if their signature is compatible.
impl<F> Match for F
where
    F: Fn(&LoggedRequest) -> bool,
    F: Send + Sync,
{
    fn matches(&self, request: &LoggedRequest) -> bool {
        // Just call the closure itself!
        self(request)
    }
}

/// A pattern over a single string value of a request (a header, a query parameter, the body).
///
/// `None` stands for "the value is not there at all".
#[derive(Debug, Clone)]
pub enum StringValuePattern {
    EqualTo(String),
    EqualToIgnoreCase(String),
    Containing(String),
    Matching(Regex),
    NotMatching(Regex),
    EqualToJson(Value),
    Absent,
}

/// Shorthand for [`StringValuePattern::EqualTo`].
pub fn equal_to<T: Into<String>>(value: T) -> StringValuePattern {
    StringValuePattern::EqualTo(value.into())
}

/// Shorthand for [`StringValuePattern::EqualToIgnoreCase`].
pub fn equal_to_ignore_case<T: Into<String>>(value: T) -> StringValuePattern {
    StringValuePattern::EqualToIgnoreCase(value.into())
}

/// Shorthand for [`StringValuePattern::Containing`].
pub fn containing<T: Into<String>>(value: T) -> StringValuePattern {
    StringValuePattern::Containing(value.into())
}

/// Shorthand for [`StringValuePattern::Matching`].
pub fn matching(regex: &str) -> Result<StringValuePattern, regex::Error> {
    Ok(StringValuePattern::Matching(Regex::new(regex)?))
}

/// Shorthand for [`StringValuePattern::NotMatching`].
pub fn not_matching(regex: &str) -> Result<StringValuePattern, regex::Error> {
    Ok(StringValuePattern::NotMatching(Regex::new(regex)?))
}

/// Shorthand for [`StringValuePattern::EqualToJson`].
pub fn equal_to_json(value: Value) -> StringValuePattern {
    StringValuePattern::EqualToJson(value)
}

/// Shorthand for [`StringValuePattern::Absent`].
pub fn absent() -> StringValuePattern {
    StringValuePattern::Absent
}

impl StringValuePattern {
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (StringValuePattern::Absent, value) => value.is_none(),
            (_, None) => false,
            (StringValuePattern::EqualTo(expected), Some(actual)) => expected == actual,
            (StringValuePattern::EqualToIgnoreCase(expected), Some(actual)) => {
                expected.to_lowercase() == actual.to_lowercase()
            }
            (StringValuePattern::Containing(expected), Some(actual)) => {
                actual.contains(expected.as_str())
            }
            (StringValuePattern::Matching(regex), Some(actual)) => regex.is_match(actual),
            (StringValuePattern::NotMatching(regex), Some(actual)) => !regex.is_match(actual),
            (StringValuePattern::EqualToJson(expected), Some(actual)) => {
                match serde_json::from_str::<Value>(actual) {
                    Ok(actual) => assert_json_matches_no_panic(
                        &actual,
                        expected,
                        Config::new(CompareMode::Strict),
                    )
                    .is_ok(),
                    Err(_) => false,
                }
            }
        }
    }

    /// How far `value` is from satisfying this pattern, in `[0, 1]`.
    ///
    /// Equality patterns grade the distance by character similarity, everything else is
    /// either a hit (`0`) or a miss (`1`).
    pub fn distance(&self, value: Option<&str>) -> f64 {
        if self.matches(value) {
            return 0.0;
        }
        match (self, value) {
            (StringValuePattern::EqualTo(expected), Some(actual)) => {
                1.0 - similarity(expected, actual)
            }
            (StringValuePattern::EqualToIgnoreCase(expected), Some(actual)) => {
                1.0 - similarity(&expected.to_lowercase(), &actual.to_lowercase())
            }
            _ => 1.0,
        }
    }

    /// The literal value this pattern expects, when there is one to diff against.
    pub(crate) fn expected_literal(&self) -> Option<String> {
        match self {
            StringValuePattern::EqualTo(value) | StringValuePattern::EqualToIgnoreCase(value) => {
                Some(value.clone())
            }
            StringValuePattern::EqualToJson(value) => serde_json::to_string_pretty(value).ok(),
            _ => None,
        }
    }

    fn operator(&self) -> &'static str {
        match self {
            StringValuePattern::EqualTo(_) => "equalTo",
            StringValuePattern::EqualToIgnoreCase(_) => "equalToIgnoreCase",
            StringValuePattern::Containing(_) => "contains",
            StringValuePattern::Matching(_) => "matches",
            StringValuePattern::NotMatching(_) => "doesNotMatch",
            StringValuePattern::EqualToJson(_) => "equalToJson",
            StringValuePattern::Absent => "absent",
        }
    }
}

impl Display for StringValuePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StringValuePattern::EqualTo(value)
            | StringValuePattern::EqualToIgnoreCase(value)
            | StringValuePattern::Containing(value) => write!(f, "[{}] {}", self.operator(), value),
            StringValuePattern::Matching(regex) | StringValuePattern::NotMatching(regex) => {
                write!(f, "[{}] {}", self.operator(), regex.as_str())
            }
            StringValuePattern::EqualToJson(value) => write!(f, "[{}] {}", self.operator(), value),
            StringValuePattern::Absent => write!(f, "[{}]", self.operator()),
        }
    }
}

/// A pattern over the URL of a request.
///
/// `Url*` variants look at the path together with its query string, `UrlPath*` variants
/// ignore the query string.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    UrlEqualTo(String),
    UrlMatching(Regex),
    UrlPathEqualTo(String),
    UrlPathMatching(Regex),
    AnyUrl,
}

/// Shorthand for [`UrlPattern::UrlEqualTo`].
pub fn url_equal_to<T: Into<String>>(url: T) -> UrlPattern {
    UrlPattern::UrlEqualTo(url.into())
}

/// Shorthand for [`UrlPattern::UrlMatching`].
pub fn url_matching(regex: &str) -> Result<UrlPattern, regex::Error> {
    Ok(UrlPattern::UrlMatching(anchored(regex)?))
}

/// Shorthand for [`UrlPattern::UrlPathEqualTo`].
pub fn url_path_equal_to<T: Into<String>>(path: T) -> UrlPattern {
    UrlPattern::UrlPathEqualTo(path.into())
}

/// Shorthand for [`UrlPattern::UrlPathMatching`].
pub fn url_path_matching(regex: &str) -> Result<UrlPattern, regex::Error> {
    Ok(UrlPattern::UrlPathMatching(anchored(regex)?))
}

/// Shorthand for [`UrlPattern::AnyUrl`].
pub fn any_url() -> UrlPattern {
    UrlPattern::AnyUrl
}

// URL regexes have to match the whole URL, not a portion of it.
fn anchored(regex: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{})$", regex))
}

impl UrlPattern {
    pub fn matches(&self, request: &LoggedRequest) -> bool {
        match self {
            UrlPattern::UrlEqualTo(url) => url == &request.relative_url(),
            UrlPattern::UrlMatching(regex) => regex.is_match(&request.relative_url()),
            UrlPattern::UrlPathEqualTo(path) => path == request.url.path(),
            UrlPattern::UrlPathMatching(regex) => regex.is_match(request.url.path()),
            UrlPattern::AnyUrl => true,
        }
    }

    pub fn distance(&self, request: &LoggedRequest) -> f64 {
        if self.matches(request) {
            return 0.0;
        }
        match self {
            UrlPattern::UrlEqualTo(url) => 1.0 - similarity(url, &request.relative_url()),
            UrlPattern::UrlPathEqualTo(path) => 1.0 - similarity(path, request.url.path()),
            _ => 1.0,
        }
    }

    /// The part of the request URL this pattern is evaluated against.
    pub(crate) fn actual_value(&self, request: &LoggedRequest) -> String {
        match self {
            UrlPattern::UrlPathEqualTo(_) | UrlPattern::UrlPathMatching(_) => {
                request.url.path().to_owned()
            }
            _ => request.relative_url(),
        }
    }

    pub(crate) fn expected_literal(&self) -> Option<String> {
        match self {
            UrlPattern::UrlEqualTo(value) | UrlPattern::UrlPathEqualTo(value) => {
                Some(value.clone())
            }
            _ => None,
        }
    }
}

impl Display for UrlPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UrlPattern::UrlEqualTo(url) => write!(f, "{}", url),
            UrlPattern::UrlMatching(regex) => write!(f, "[regex] {}", regex.as_str()),
            UrlPattern::UrlPathEqualTo(path) => write!(f, "[path] {}", path),
            UrlPattern::UrlPathMatching(regex) => write!(f, "[path regex] {}", regex.as_str()),
            UrlPattern::AnyUrl => write!(f, "[any url]"),
        }
    }
}

/// A character diff between `expected` and `actual`, bounded in time.
pub(crate) fn char_diff<'a>(expected: &'a str, actual: &'a str) -> TextDiff<'a, 'a, 'a, str> {
    TextDiff::configure()
        .timeout(DIFF_TIMEOUT)
        .diff_chars(expected, actual)
}

/// Character-level similarity between two strings, in `[0, 1]`.
///
/// Sørensen–Dice coefficient over the characters the two strings have in common.
pub fn similarity(expected: &str, actual: &str) -> f64 {
    if expected == actual {
        return 1.0;
    }
    if expected.is_empty() || actual.is_empty() {
        return 0.0;
    }

    let diff = char_diff(expected, actual);
    let same_chars: usize = diff
        .iter_all_changes()
        .filter(|change| change.tag() == ChangeTag::Equal)
        .map(|change| change.value().chars().count())
        .sum();

    let total = expected.chars().count() + actual.chars().count();
    (2.0 * same_chars as f64) / total as f64
}
