use std::fmt::{Display, Formatter};

/// How many matching requests we expect the remote mock server to have logged.
///
/// Build one with the named factories ([`exactly`], [`more_than_or_exactly`], ...) or
/// convert an integer, which stands for an exact count:
/// ```rust
/// use wiremock_client::{exactly, CountMatchingStrategy};
///
/// let strategy: CountMatchingStrategy = 3.into();
/// assert_eq!(strategy, exactly(3));
/// ```
///
/// [`exactly`]: crate::exactly
/// [`more_than_or_exactly`]: crate::more_than_or_exactly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountMatchingStrategy {
    kind: CountComparison,
    threshold: u64,
}

/// The ordering used by a [`CountMatchingStrategy`] to compare the actual count
/// against its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountComparison {
    LessThan,
    LessThanOrEqual,
    Equal,
    GreaterThanOrEqual,
    GreaterThan,
}

impl CountMatchingStrategy {
    pub fn new(kind: CountComparison, threshold: u64) -> Self {
        Self { kind, threshold }
    }

    /// Does `actual` satisfy the expectation?
    pub fn matches(&self, actual: u64) -> bool {
        match self.kind {
            CountComparison::LessThan => actual < self.threshold,
            CountComparison::LessThanOrEqual => actual <= self.threshold,
            CountComparison::Equal => actual == self.threshold,
            CountComparison::GreaterThanOrEqual => actual >= self.threshold,
            CountComparison::GreaterThan => actual > self.threshold,
        }
    }

    pub fn kind(&self) -> CountComparison {
        self.kind
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }
}

/// Strictly fewer than `expected` matching requests.
pub fn less_than(expected: u64) -> CountMatchingStrategy {
    CountMatchingStrategy::new(CountComparison::LessThan, expected)
}

/// At most `expected` matching requests.
pub fn less_than_or_exactly(expected: u64) -> CountMatchingStrategy {
    CountMatchingStrategy::new(CountComparison::LessThanOrEqual, expected)
}

/// Exactly `expected` matching requests.
pub fn exactly(expected: u64) -> CountMatchingStrategy {
    CountMatchingStrategy::new(CountComparison::Equal, expected)
}

/// At least `expected` matching requests.
pub fn more_than_or_exactly(expected: u64) -> CountMatchingStrategy {
    CountMatchingStrategy::new(CountComparison::GreaterThanOrEqual, expected)
}

/// Strictly more than `expected` matching requests.
pub fn more_than(expected: u64) -> CountMatchingStrategy {
    CountMatchingStrategy::new(CountComparison::GreaterThan, expected)
}

impl From<u64> for CountMatchingStrategy {
    fn from(expected: u64) -> Self {
        exactly(expected)
    }
}

impl Display for CountMatchingStrategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self.kind {
            CountComparison::LessThan => "less than",
            CountComparison::LessThanOrEqual => "less than or exactly",
            CountComparison::Equal => "exactly",
            CountComparison::GreaterThanOrEqual => "more than or exactly",
            CountComparison::GreaterThan => "more than",
        };
        write!(f, "{} {}", label, self.threshold)
    }
}
