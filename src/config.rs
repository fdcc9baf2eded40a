use crate::request::BodyPrintLimit;
use std::env;
use url::Url;

pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8080;

/// Where the admin API of the mock server lives, and how verification failures are printed.
///
/// Use [`AdminConfig::default`] for `http://localhost:8080`, or [`AdminConfig::from_env`]
/// to honour `WIREMOCK_SCHEME`, `WIREMOCK_HOST`, `WIREMOCK_PORT`,
/// `WIREMOCK_URL_PATH_PREFIX` and `WIREMOCK_BODY_PRINT_LIMIT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminConfig {
    scheme: String,
    host: String,
    port: u16,
    url_path_prefix: String,
    body_print_limit: BodyPrintLimit,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.into(),
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            url_path_prefix: String::new(),
            body_print_limit: BodyPrintLimit::default(),
        }
    }
}

impl AdminConfig {
    /// The default configuration, with overrides taken from the environment.
    /// Values that cannot be parsed are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(scheme) = env::var("WIREMOCK_SCHEME") {
            config.scheme = scheme;
        }
        if let Ok(host) = env::var("WIREMOCK_HOST") {
            config.host = host;
        }
        if let Some(port) = env::var("WIREMOCK_PORT")
            .ok()
            .and_then(|x| x.parse::<u16>().ok())
        {
            config.port = port;
        }
        if let Ok(prefix) = env::var("WIREMOCK_URL_PATH_PREFIX") {
            config.url_path_prefix = prefix;
        }
        if let Some(limit) = env::var("WIREMOCK_BODY_PRINT_LIMIT")
            .ok()
            .and_then(|x| x.parse::<usize>().ok())
        {
            config.body_print_limit = BodyPrintLimit::Limited(limit);
        }
        config
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn url_path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_path_prefix = prefix.into();
        self
    }

    /// Limit how much of each request body verification failures print.
    pub fn body_print_limit(mut self, limit: BodyPrintLimit) -> Self {
        self.body_print_limit = limit;
        self
    }

    pub fn get_host(&self) -> &str {
        &self.host
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_body_print_limit(&self) -> BodyPrintLimit {
        self.body_print_limit
    }

    /// Base URL of the admin API, e.g. `http://localhost:8080/__admin`.
    pub fn admin_url(&self) -> Result<Url, url::ParseError> {
        let prefix = self.url_path_prefix.trim_matches('/');
        let path = if prefix.is_empty() {
            "/__admin".to_owned()
        } else {
            format!("/{}/__admin", prefix)
        };
        Url::parse(&format!("{}://{}:{}{}", self.scheme, self.host, self.port, path))
    }
}
