use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock};

/// A random delay added by the mock server to every response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DelayDistribution {
    /// Log-normally distributed delay, in milliseconds.
    LogNormal { median: f64, sigma: f64 },
    /// Uniformly distributed delay between `lower` and `upper` milliseconds.
    Uniform { lower: u64, upper: u64 },
}

/// Server-wide settings of the mock server.
///
/// Values are never mutated in place: updates produce a new value with one field changed
/// (see [`GlobalSettings::with_fixed_delay`]) which is then pushed as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Fixed delay added to every response, in milliseconds.
    pub fixed_delay: Option<u64>,
    pub delay_distribution: Option<DelayDistribution>,
}

impl GlobalSettings {
    pub fn with_fixed_delay(&self, milliseconds: u64) -> Self {
        Self {
            fixed_delay: Some(milliseconds),
            ..self.clone()
        }
    }

    pub fn with_delay_distribution(&self, distribution: DelayDistribution) -> Self {
        Self {
            delay_distribution: Some(distribution),
            ..self.clone()
        }
    }
}

/// The locally cached copy of the last settings successfully applied to the mock server.
///
/// Readers get a shared snapshot; writers swap the snapshot as a whole, so nobody ever
/// observes a half-updated value. There is no compare-and-swap: two writers racing on
/// read-modify-write can lose one of the updates.
#[derive(Debug, Default)]
pub struct GlobalSettingsHolder {
    current: RwLock<Arc<GlobalSettings>>,
}

impl GlobalSettingsHolder {
    pub fn new(settings: GlobalSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    pub fn get(&self) -> Arc<GlobalSettings> {
        // Swapping an `Arc` cannot be left half-done, so poisoning is harmless.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace_with(&self, settings: GlobalSettings) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(settings);
    }
}
