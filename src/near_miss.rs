use crate::pattern::DeclarativePattern;
use crate::{LoggedRequest, RequestPattern};
use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};

/// How many near misses a lookup returns at most.
pub const MAX_NEAR_MISSES: usize = 3;

/// How far a request is from satisfying a pattern: `0` is a match, `1` is as far as it gets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchDistance(f64);

impl MatchDistance {
    pub fn new(distance: f64) -> Self {
        Self(distance.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_exact_match(&self) -> bool {
        self.0 == 0.0
    }
}

impl Eq for MatchDistance {}

impl PartialOrd for MatchDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MatchDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Display for MatchDistance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// A logged request that did not satisfy a pattern, together with how close it came.
#[derive(Debug, Clone)]
pub struct NearMiss {
    pub request: LoggedRequest,
    pub pattern: RequestPattern,
    pub distance: MatchDistance,
}

/// Ranks requests against patterns to find the closest non-matching pairs.
///
/// Each field a declarative pattern constrains contributes a distance in `[0, 1]`; the
/// overall distance is their average. Custom matchers are opaque, so they either match
/// or sit at the maximum distance.
#[derive(Debug, Clone, Copy)]
pub struct NearMissCalculator {
    limit: usize,
}

impl Default for NearMissCalculator {
    fn default() -> Self {
        Self {
            limit: MAX_NEAR_MISSES,
        }
    }
}

impl NearMissCalculator {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn distance(&self, pattern: &RequestPattern, request: &LoggedRequest) -> MatchDistance {
        match pattern {
            RequestPattern::Declarative(declarative) => declarative_distance(declarative, request),
            RequestPattern::Custom(matcher) => {
                if matcher.matches(request) {
                    MatchDistance::new(0.0)
                } else {
                    MatchDistance::new(1.0)
                }
            }
        }
    }

    /// The logged requests closest to matching `pattern`, best first.
    pub fn near_misses_for_pattern(
        &self,
        pattern: &RequestPattern,
        requests: &[LoggedRequest],
    ) -> Vec<NearMiss> {
        let candidates = requests.iter().map(|request| NearMiss {
            request: request.clone(),
            pattern: pattern.clone(),
            distance: self.distance(pattern, request),
        });
        self.rank(candidates)
    }

    /// The patterns closest to matching `request`, best first.
    pub fn near_misses_for_request(
        &self,
        request: &LoggedRequest,
        patterns: &[RequestPattern],
    ) -> Vec<NearMiss> {
        let candidates = patterns.iter().map(|pattern| NearMiss {
            request: request.clone(),
            pattern: pattern.clone(),
            distance: self.distance(pattern, request),
        });
        self.rank(candidates)
    }

    fn rank(&self, candidates: impl Iterator<Item = NearMiss>) -> Vec<NearMiss> {
        let mut near_misses: Vec<NearMiss> = candidates
            .filter(|near_miss| !near_miss.distance.is_exact_match())
            .collect();
        // Stable: ties keep the order the journal (or the stub list) gave us.
        near_misses.sort_by(|a, b| a.distance.cmp(&b.distance));
        near_misses.truncate(self.limit);
        near_misses
    }
}

fn declarative_distance(pattern: &DeclarativePattern, request: &LoggedRequest) -> MatchDistance {
    let mut distances = vec![pattern.url.distance(request)];
    if let Some(method) = &pattern.method {
        distances.push(if *method == request.method { 0.0 } else { 1.0 });
    }
    distances.extend(
        pattern
            .headers
            .iter()
            .map(|(name, value)| value.distance(request.header_value(name).as_deref())),
    );
    distances.extend(
        pattern
            .query_params
            .iter()
            .map(|(key, value)| value.distance(request.query_param(key).as_deref())),
    );
    distances.extend(
        pattern
            .body_patterns
            .iter()
            .map(|value| value.distance(request.body_as_str())),
    );

    let total: f64 = distances.iter().sum();
    MatchDistance::new(total / distances.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matchers::url_equal_to;
    use crate::{get_requested_for, post_requested_for, request_made_for, Parameters};
    use http::Method;

    fn request(method: Method, path: &str) -> LoggedRequest {
        LoggedRequest::new(method, path).unwrap()
    }

    #[test]
    fn closest_request_comes_first_and_matches_are_excluded() {
        let pattern = get_requested_for(url_equal_to("/health")).build();
        let journal = vec![
            request(Method::GET, "/metrics"),
            request(Method::GET, "/health"),
            request(Method::GET, "/helth"),
            request(Method::POST, "/health"),
        ];

        let near_misses = NearMissCalculator::default().near_misses_for_pattern(&pattern, &journal);

        assert_eq!(near_misses.len(), 3);
        assert_eq!(near_misses[0].request.url.path(), "/helth");
        assert!(near_misses
            .iter()
            .all(|near_miss| !near_miss.distance.is_exact_match()));
    }

    #[test]
    fn results_are_capped() {
        let pattern = get_requested_for(url_equal_to("/health")).build();
        let journal: Vec<_> = (0..10)
            .map(|i| request(Method::GET, &format!("/other/{}", i)))
            .collect();

        let near_misses = NearMissCalculator::with_limit(2).near_misses_for_pattern(&pattern, &journal);
        assert_eq!(near_misses.len(), 2);
        // Equal distances keep journal order.
        assert_eq!(near_misses[0].request.url.path(), "/other/0");
    }

    #[test]
    fn request_lookups_rank_patterns() {
        let patterns = vec![
            post_requested_for(url_equal_to("/users")).build(),
            get_requested_for(url_equal_to("/user")).build(),
        ];
        let near_misses = NearMissCalculator::default()
            .near_misses_for_request(&request(Method::GET, "/users"), &patterns);

        assert_eq!(near_misses.len(), 2);
        assert_eq!(near_misses[0].pattern.to_string(), "GET /user");
    }

    #[test]
    fn custom_matchers_are_all_or_nothing() {
        let pattern = request_made_for("never", Parameters::new(), |_: &LoggedRequest| false).build();
        let distance = NearMissCalculator::default().distance(&pattern, &request(Method::GET, "/"));
        assert_eq!(distance.value(), 1.0);
    }
}
