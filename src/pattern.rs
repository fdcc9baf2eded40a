use crate::matchers::{StringValuePattern, UrlPattern};
use crate::{LoggedRequest, Match};
use http::{HeaderName, Method};
use serde_json::{Map, Value};
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::Arc;

/// Named parameters handed to a custom matcher.
pub type Parameters = Map<String, Value>;

/// A predicate over [`LoggedRequest`]s, as accepted by the verification operations.
///
/// The two variants are counted differently: the mock server evaluates `Declarative`
/// patterns itself, while `Custom` patterns run caller-defined code and can only be
/// evaluated locally, over the full request journal.
#[derive(Clone, Debug)]
pub enum RequestPattern {
    Declarative(DeclarativePattern),
    Custom(CustomMatcher),
}

impl RequestPattern {
    /// A pattern matching every logged request.
    pub fn everything() -> Self {
        RequestPattern::Declarative(DeclarativePattern::new(None, UrlPattern::AnyUrl))
    }

    pub fn has_custom_matcher(&self) -> bool {
        matches!(self, RequestPattern::Custom(_))
    }

    pub fn matches(&self, request: &LoggedRequest) -> bool {
        match self {
            RequestPattern::Declarative(pattern) => pattern.matches(request),
            RequestPattern::Custom(matcher) => matcher.matches(request),
        }
    }
}

impl Display for RequestPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RequestPattern::Declarative(pattern) => Display::fmt(pattern, f),
            RequestPattern::Custom(matcher) => Display::fmt(matcher, f),
        }
    }
}

/// A pattern made only of matchers the mock server understands.
#[derive(Clone, Debug)]
pub struct DeclarativePattern {
    /// `None` matches any method.
    pub method: Option<Method>,
    pub url: UrlPattern,
    pub headers: Vec<(HeaderName, StringValuePattern)>,
    pub query_params: Vec<(String, StringValuePattern)>,
    pub body_patterns: Vec<StringValuePattern>,
}

impl DeclarativePattern {
    pub fn new(method: Option<Method>, url: UrlPattern) -> Self {
        Self {
            method,
            url,
            headers: vec![],
            query_params: vec![],
            body_patterns: vec![],
        }
    }

    pub fn matches(&self, request: &LoggedRequest) -> bool {
        self.method.as_ref().map_or(true, |m| *m == request.method)
            && self.url.matches(request)
            && self
                .headers
                .iter()
                .all(|(name, pattern)| pattern.matches(request.header_value(name).as_deref()))
            && self
                .query_params
                .iter()
                .all(|(key, pattern)| pattern.matches(request.query_param(key).as_deref()))
            && self
                .body_patterns
                .iter()
                .all(|pattern| pattern.matches(request.body_as_str()))
    }
}

impl Display for DeclarativePattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{} {}", method, self.url)?,
            None => write!(f, "ANY {}", self.url)?,
        }
        for (name, pattern) in &self.headers {
            write!(f, "\n{}: {}", name, pattern)?;
        }
        for (key, pattern) in &self.query_params {
            write!(f, "\nQuery: {} {}", key, pattern)?;
        }
        for pattern in &self.body_patterns {
            write!(f, "\nBody: {}", pattern)?;
        }
        Ok(())
    }
}

/// A caller-defined matcher, identified by name and parameters.
#[derive(Clone)]
pub struct CustomMatcher {
    pub name: String,
    pub parameters: Parameters,
    matcher: Arc<dyn Match>,
}

impl CustomMatcher {
    pub fn new<M: Match + 'static>(name: impl Into<String>, parameters: Parameters, matcher: M) -> Self {
        Self {
            name: name.into(),
            parameters,
            matcher: Arc::new(matcher),
        }
    }

    pub fn matches(&self, request: &LoggedRequest) -> bool {
        self.matcher.matches(request)
    }
}

impl Debug for CustomMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Closures do not implement `Debug`, so the matcher itself is left out.
        f.debug_struct("CustomMatcher")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl Display for CustomMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[custom matcher] {}", self.name)?;
        if !self.parameters.is_empty() {
            write!(f, " {}", Value::Object(self.parameters.clone()))?;
        }
        Ok(())
    }
}

/// A fluent builder to assemble a [`RequestPattern`].
///
/// Start from one of the verb shorthands ([`get_requested_for`], [`post_requested_for`], ...),
/// [`all_requests`] or [`request_made_for`] for a custom matcher.
///
/// ```rust
/// use wiremock_client::{post_requested_for, RequestPattern};
/// use wiremock_client::matchers::{containing, equal_to, url_path_equal_to};
///
/// let pattern: RequestPattern = post_requested_for(url_path_equal_to("/orders"))
///     .with_header(http::header::CONTENT_TYPE, equal_to("application/json"))
///     .with_request_body(containing("\"sku\""))
///     .build();
/// assert!(!pattern.has_custom_matcher());
/// ```
#[derive(Clone, Debug)]
pub struct RequestPatternBuilder {
    inner: RequestPattern,
}

impl RequestPatternBuilder {
    pub fn new(method: Option<Method>, url: UrlPattern) -> Self {
        Self {
            inner: RequestPattern::Declarative(DeclarativePattern::new(method, url)),
        }
    }

    pub fn for_custom_matcher<M: Match + 'static>(
        name: impl Into<String>,
        parameters: Parameters,
        matcher: M,
    ) -> Self {
        Self {
            inner: RequestPattern::Custom(CustomMatcher::new(name, parameters, matcher)),
        }
    }

    /// Add a header constraint. Custom matcher patterns ignore declarative constraints.
    pub fn with_header(mut self, name: HeaderName, pattern: StringValuePattern) -> Self {
        if let RequestPattern::Declarative(declarative) = &mut self.inner {
            declarative.headers.push((name, pattern));
        }
        self
    }

    /// Add a query parameter constraint. Custom matcher patterns ignore declarative constraints.
    pub fn with_query_param(mut self, key: impl Into<String>, pattern: StringValuePattern) -> Self {
        if let RequestPattern::Declarative(declarative) = &mut self.inner {
            declarative.query_params.push((key.into(), pattern));
        }
        self
    }

    /// Add a body constraint. Custom matcher patterns ignore declarative constraints.
    pub fn with_request_body(mut self, pattern: StringValuePattern) -> Self {
        if let RequestPattern::Declarative(declarative) = &mut self.inner {
            declarative.body_patterns.push(pattern);
        }
        self
    }

    pub fn build(self) -> RequestPattern {
        self.inner
    }
}

impl From<RequestPatternBuilder> for RequestPattern {
    fn from(builder: RequestPatternBuilder) -> Self {
        builder.build()
    }
}

macro_rules! requested_for {
    ($($name:ident => $method:ident),* $(,)?) => {
        $(
            #[doc = concat!("Start a pattern for `", stringify!($method), "` requests.")]
            pub fn $name(url: UrlPattern) -> RequestPatternBuilder {
                RequestPatternBuilder::new(Some(Method::$method), url)
            }
        )*
    };
}

requested_for! {
    get_requested_for => GET,
    post_requested_for => POST,
    put_requested_for => PUT,
    delete_requested_for => DELETE,
    patch_requested_for => PATCH,
    head_requested_for => HEAD,
    options_requested_for => OPTIONS,
    trace_requested_for => TRACE,
}

/// Start a pattern for requests with any method.
pub fn any_requested_for(url: UrlPattern) -> RequestPatternBuilder {
    RequestPatternBuilder::new(None, url)
}

/// A pattern matching every logged request.
pub fn all_requests() -> RequestPatternBuilder {
    RequestPatternBuilder::new(None, UrlPattern::AnyUrl)
}

/// Start a pattern backed by a custom matcher.
pub fn request_made_for<M: Match + 'static>(
    name: impl Into<String>,
    parameters: Parameters,
    matcher: M,
) -> RequestPatternBuilder {
    RequestPatternBuilder::for_custom_matcher(name, parameters, matcher)
}
