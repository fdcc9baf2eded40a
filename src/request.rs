use std::fmt;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::de::DeserializeOwned;
use url::Url;

pub const BODY_PRINT_LIMIT: usize = 10_000;

/// Specifies limitations on printing request bodies in verification failures. The mock
/// server may have logged bodies that are too large to reasonably print.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyPrintLimit {
    /// Maximum length of a body to print in bytes.
    Limited(usize),
    /// There is no limit to the size of a body that may be printed.
    Unlimited,
}

impl Default for BodyPrintLimit {
    fn default() -> Self {
        BodyPrintLimit::Limited(BODY_PRINT_LIMIT)
    }
}

/// A request previously observed by the remote mock server and stored in its request journal.
///
/// Every pattern, custom matcher and near-miss ranking operates on an immutable reference
/// to a `LoggedRequest`.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggedRequest {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl LoggedRequest {
    /// Build a logged request for `path_and_query` (e.g. `/orders?page=2`) on
    /// `http://localhost`.
    ///
    /// The path is taken literally: `//api/v1` stays a path, it is not read as a host.
    pub fn new(method: Method, path_and_query: &str) -> Result<Self, url::ParseError> {
        let (path, query) = match path_and_query.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path_and_query, None),
        };
        let mut url = Url::parse("http://localhost")?;
        url.set_path(path);
        url.set_query(query);
        Ok(Self::from_url(method, url))
    }

    pub fn from_url(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// The body as text, if it is valid utf-8.
    pub fn body_as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Path plus query string, the way the mock server's URL patterns see it.
    pub fn relative_url(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_owned(),
        }
    }

    /// All values of a header, joined with a comma. `None` if the header is absent or
    /// one of its values is not valid utf-8.
    pub fn header_value(&self, name: &HeaderName) -> Option<String> {
        let values = self
            .headers
            .get_all(name)
            .iter()
            .map(|value| value.to_str().ok())
            .collect::<Option<Vec<_>>>()?;
        if values.is_empty() {
            None
        } else {
            Some(values.join(","))
        }
    }

    /// The first value of a query parameter, if present.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub(crate) fn print_with_limit(
        &self,
        mut buffer: impl fmt::Write,
        body_print_limit: BodyPrintLimit,
    ) -> fmt::Result {
        writeln!(buffer, "{} {}", self.method, self.url)?;
        for name in self.headers.keys() {
            let values = self
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()))
                .collect::<Vec<_>>();
            let values = values.join(",");
            writeln!(buffer, "{}: {}", name, values)?;
        }

        match body_print_limit {
            BodyPrintLimit::Limited(limit) if self.body.len() > limit => {
                let mut written = false;
                for end_byte in limit..(limit + 4).min(self.body.len()) {
                    if let Ok(truncated) = std::str::from_utf8(&self.body[..end_byte]) {
                        written = true;
                        writeln!(buffer, "{}", truncated)?;
                        writeln!(
                            buffer,
                            "We truncated the body because it was too large: {} bytes (limit: {} bytes)",
                            self.body.len(),
                            limit
                        )?;
                        writeln!(
                            buffer,
                            "Increase this limit by setting `WIREMOCK_BODY_PRINT_LIMIT`, or calling `AdminConfig::body_print_limit` when configuring your client"
                        )?;
                        break;
                    }
                }
                if !written {
                    writeln!(
                        buffer,
                        "Body is likely binary (invalid utf-8) size is {} bytes",
                        self.body.len()
                    )
                } else {
                    Ok(())
                }
            }
            _ => {
                if self.body.is_empty() {
                    Ok(())
                } else if let Ok(body) = std::str::from_utf8(&self.body) {
                    writeln!(buffer, "{}", body)
                } else {
                    writeln!(
                        buffer,
                        "Body is likely binary (invalid utf-8) size is {} bytes",
                        self.body.len()
                    )
                }
            }
        }
    }
}

impl fmt::Display for LoggedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.print_with_limit(f, BodyPrintLimit::default())
    }
}
