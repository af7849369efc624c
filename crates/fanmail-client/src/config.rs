//! Session configuration.

use std::time::Duration;

use fanmail_core::{FanoutConfig, LifecycleConfig};

/// Configuration for a [`crate::Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    /// Key rotation and retention
    pub lifecycle: LifecycleConfig,
    /// Fan-out targets
    pub fanout: FanoutConfig,
}

impl SessionConfig {
    /// Configuration with the given maximum key age and defaults elsewhere.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            lifecycle: LifecycleConfig { max_age, ..LifecycleConfig::default() },
            ..Self::default()
        }
    }

    /// Keep retired keys for `retention`, then prune them.
    #[must_use]
    pub fn retain_for(mut self, retention: Duration) -> Self {
        self.lifecycle.retention = Some(retention);
        self
    }

    /// Also seal outgoing messages to this alias's other devices.
    #[must_use]
    pub fn include_own_devices(mut self, include: bool) -> Self {
        self.fanout.include_own_devices = include;
        self
    }
}
