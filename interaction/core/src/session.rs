//! Playback Session
//!
//! The root object of a playback framework instance. It owns the interaction
//! registry, which is created lazily by the first module that needs it and
//! destroyed exactly once when the session is torn down.
//!
//! # Design Philosophy
//!
//! Modules never hold the registry directly across teardown. They reach it
//! through the session, and once the session is torn down every lookup fails
//! with [`InteractionError::Allocation`] instead of resurrecting a registry.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BrokerConfig;
use crate::error::{InteractionError, Result};
use crate::registry::InteractionRegistry;

/// Where the session's registry is in its life
enum RegistrySlot {
    Empty,
    Live(Arc<InteractionRegistry>),
    TornDown,
}

/// A playback framework instance
pub struct PlaybackSession {
    name: String,
    config: BrokerConfig,
    slot: Mutex<RegistrySlot>,
}

impl PlaybackSession {
    /// Create a session with no registry yet
    #[must_use]
    pub fn new(name: impl Into<String>, config: BrokerConfig) -> Self {
        Self {
            name: name.into(),
            config,
            slot: Mutex::new(RegistrySlot::Empty),
        }
    }

    /// Session name, for logs
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Broker settings used for the registry
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Find the session's registry, creating it on first use
    ///
    /// Concurrent first calls agree on a single registry.
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::Allocation`] once the session is torn down.
    pub fn registry(&self) -> Result<Arc<InteractionRegistry>> {
        let mut slot = self.slot.lock();
        match &*slot {
            RegistrySlot::Live(registry) => Ok(Arc::clone(registry)),
            RegistrySlot::TornDown => Err(InteractionError::Allocation(format!(
                "session '{}' is torn down",
                self.name
            ))),
            RegistrySlot::Empty => {
                tracing::info!(session = %self.name, "Initializing interaction system");
                let registry = Arc::new(InteractionRegistry::new(self.config.clone()));
                *slot = RegistrySlot::Live(Arc::clone(&registry));
                Ok(registry)
            }
        }
    }

    /// The registry, if one has been created and not torn down
    #[must_use]
    pub fn existing_registry(&self) -> Option<Arc<InteractionRegistry>> {
        match &*self.slot.lock() {
            RegistrySlot::Live(registry) => Some(Arc::clone(registry)),
            RegistrySlot::Empty | RegistrySlot::TornDown => None,
        }
    }

    /// Destroy the registry and refuse any later use
    ///
    /// Returns `true` if a registry existed and was destroyed. Calling this
    /// again is a no-op.
    pub fn teardown(&self) -> bool {
        let previous = std::mem::replace(&mut *self.slot.lock(), RegistrySlot::TornDown);
        match previous {
            RegistrySlot::Live(registry) => {
                registry.destroy();
                tracing::info!(session = %self.name, "Session torn down");
                true
            }
            RegistrySlot::Empty => {
                tracing::debug!(session = %self.name, "Session torn down before any dialog");
                false
            }
            RegistrySlot::TornDown => false,
        }
    }

    /// Whether the session has been torn down
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(*self.slot.lock(), RegistrySlot::TornDown)
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.slot.lock() {
            RegistrySlot::Empty => "empty",
            RegistrySlot::Live(_) => "live",
            RegistrySlot::TornDown => "torn down",
        };
        f.debug_struct("PlaybackSession")
            .field("name", &self.name)
            .field("registry", &state)
            .finish()
    }
}
