use crate::admin::Admin;
use crate::config::AdminConfig;
use crate::WireMock;
use log::debug;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, PoisonError, RwLock};

/// Opens a connection to the admin API described by an [`AdminConfig`].
///
/// Closures with a compatible signature implement `Connect` out of the box.
pub trait Connect: Send + Sync {
    fn connect(&self, config: &AdminConfig) -> Arc<dyn Admin>;
}

impl<F> Connect for F
where
    F: Fn(&AdminConfig) -> Arc<dyn Admin>,
    F: Send + Sync,
{
    fn connect(&self, config: &AdminConfig) -> Arc<dyn Admin> {
        self(config)
    }
}

/// Holds "the" client of a test scope, so that helpers can reach it without threading a
/// [`WireMock`] through every call.
///
/// The client is created on first use from the default configuration
/// (`http://localhost:8080` unless overridden) and replaced wholesale by
/// [`configure_for`]/[`configure_with`]: the last write wins.
///
/// ```rust
/// use wiremock_client::{Admin, AdminConfig, ClientContext, InMemoryAdmin};
/// use std::sync::Arc;
///
/// let context = ClientContext::new(|_config: &AdminConfig| {
///     Arc::new(InMemoryAdmin::new()) as Arc<dyn Admin>
/// });
///
/// let default_client = context.client();
/// let other_client = context.configure_for(AdminConfig::default().port(9090));
/// assert!(!Arc::ptr_eq(&default_client, &other_client));
/// assert_eq!(context.config().get_port(), 9090);
/// ```
///
/// [`configure_for`]: ClientContext::configure_for
/// [`configure_with`]: ClientContext::configure_with
pub struct ClientContext {
    connector: Box<dyn Connect>,
    slot: RwLock<Slot>,
}

struct Slot {
    config: AdminConfig,
    client: Option<Arc<WireMock>>,
}

impl Debug for ClientContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("ClientContext")
            .field("config", &slot.config)
            .field("client", &slot.client)
            .finish_non_exhaustive()
    }
}

impl ClientContext {
    pub fn new(connector: impl Connect + 'static) -> Self {
        Self::with_config(connector, AdminConfig::default())
    }

    /// A context whose default client will be built from `config`.
    pub fn with_config(connector: impl Connect + 'static, config: AdminConfig) -> Self {
        Self {
            connector: Box::new(connector),
            slot: RwLock::new(Slot {
                config,
                client: None,
            }),
        }
    }

    /// The current client, connecting with the current configuration on first use.
    pub fn client(&self) -> Arc<WireMock> {
        if let Some(client) = &self.slot.read().unwrap_or_else(PoisonError::into_inner).client {
            return client.clone();
        }

        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        // Someone else may have connected while we waited for the write lock.
        if let Some(client) = &slot.client {
            return client.clone();
        }
        debug!("Connecting the default client to {:?}.", slot.config.admin_url());
        let client = Arc::new(self.build(&slot.config));
        slot.client = Some(client.clone());
        client
    }

    /// Replace the current client with one connected according to `config`.
    pub fn configure_for(&self, config: AdminConfig) -> Arc<WireMock> {
        debug!("Reconfiguring the default client for {:?}.", config.admin_url());
        let client = Arc::new(self.build(&config));
        let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        slot.config = config;
        slot.client = Some(client.clone());
        client
    }

    /// Replace the current client with `client`. The configuration is left untouched.
    pub fn configure_with(&self, client: WireMock) -> Arc<WireMock> {
        let client = Arc::new(client);
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .client = Some(client.clone());
        client
    }

    /// The configuration the current client was (or will be) built from.
    pub fn config(&self) -> AdminConfig {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .config
            .clone()
    }

    fn build(&self, config: &AdminConfig) -> WireMock {
        WireMock::with_config(self.connector.connect(config), config)
    }
}
