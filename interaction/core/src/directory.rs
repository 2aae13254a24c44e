//! Interface Directory - Active Interface Modules
//!
//! The directory tracks every interface module currently attached to the
//! playback framework, in attach order. The broker never keeps an interface
//! alive on its own: it enumerates the directory, gets non-owning
//! [`InterfaceHandle`]s back, and upgrades one only for the duration of a
//! manage tick.
//!
//! # Architecture
//!
//! ```text
//!                    InterfaceDirectory
//!              ┌─────────────────────────────────┐
//!              │ Vec<InterfaceEntry> (attach     │
//!              │ order), wrapped in Arc<RwLock>  │
//!              └────────────────┬────────────────┘
//!                               │ enumerate()
//!               ┌───────────────┼───────────────┐
//!        ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!        │ rc (no UI)  │ │   qt (GUI)  │ │  http (web) │
//!        │   intf-1    │ │   intf-2    │ │   intf-3    │
//!        └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Thread Safety
//!
//! Attaching and detaching take the write lock; enumeration takes the read
//! lock just long enough to copy out handles.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::events::{InterfaceCapabilities, InterfaceType};
use crate::interface::InteractionInterface;

/// Identifier of an attached interface
///
/// Assigned by the directory on attach, stable until detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterfaceId(u64);

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intf-{}", self.0)
    }
}

/// An attached interface, owned by the directory
struct InterfaceEntry {
    id: InterfaceId,
    interface: Arc<dyn InteractionInterface>,
}

/// Non-owning reference to an attached interface
///
/// Carries a snapshot of the interface's description taken at enumeration
/// time. [`InterfaceHandle::upgrade`] fails once the interface is detached.
#[derive(Clone)]
pub struct InterfaceHandle {
    /// Directory-assigned id
    pub id: InterfaceId,
    /// Module name
    pub name: String,
    /// Type of interface
    pub interface_type: InterfaceType,
    /// Capabilities at enumeration time
    pub capabilities: InterfaceCapabilities,
    interaction: bool,
    interface: Weak<dyn InteractionInterface>,
}

impl InterfaceHandle {
    /// Whether the interface said it can present dialogs when enumerated
    #[must_use]
    pub fn supports_interaction(&self) -> bool {
        self.interaction
    }

    /// Take a temporary strong reference to the interface
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<dyn InteractionInterface>> {
        self.interface.upgrade()
    }

    /// Whether the interface is still attached and alive
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.upgrade().is_some_and(|i| i.is_connected())
    }
}

impl fmt::Debug for InterfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceHandle")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("interface_type", &self.interface_type)
            .field("capabilities", &self.capabilities)
            .field("interaction", &self.interaction)
            .finish_non_exhaustive()
    }
}

/// Directory of active interface modules
///
/// Cloning is cheap; clones share the same set of interfaces.
#[derive(Clone)]
pub struct InterfaceDirectory {
    inner: Arc<RwLock<Vec<InterfaceEntry>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for InterfaceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceDirectory {
    /// Create an empty directory
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Attach an interface module
    ///
    /// Returns the assigned `InterfaceId`.
    pub fn attach(&self, interface: Arc<dyn InteractionInterface>) -> InterfaceId {
        let id = InterfaceId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let name = interface.name().to_string();
        let interaction = interface.supports_interaction();
        self.inner.write().push(InterfaceEntry { id, interface });
        tracing::info!(
            interface_id = %id,
            name = %name,
            interaction = interaction,
            "Interface attached"
        );
        id
    }

    /// Detach an interface module
    ///
    /// Returns the interface if it was attached. Handles given out earlier
    /// stop upgrading once the last strong reference is gone.
    pub fn detach(&self, id: &InterfaceId) -> Option<Arc<dyn InteractionInterface>> {
        let mut inner = self.inner.write();
        let index = inner.iter().position(|e| e.id == *id)?;
        let entry = inner.remove(index);
        tracing::info!(
            interface_id = %id,
            name = %entry.interface.name(),
            "Interface detached"
        );
        Some(entry.interface)
    }

    /// Number of attached interfaces
    #[must_use]
    pub fn count(&self) -> usize {
        self.inner.read().len()
    }

    /// Check if an interface is attached
    #[must_use]
    pub fn contains(&self, id: &InterfaceId) -> bool {
        self.inner.read().iter().any(|e| e.id == *id)
    }

    /// Ids of all attached interfaces, in attach order
    #[must_use]
    pub fn interface_ids(&self) -> Vec<InterfaceId> {
        self.inner.read().iter().map(|e| e.id).collect()
    }

    /// Non-owning handles to all attached interfaces, in attach order
    #[must_use]
    pub fn enumerate(&self) -> Vec<InterfaceHandle> {
        self.inner
            .read()
            .iter()
            .map(|e| InterfaceHandle {
                id: e.id,
                name: e.interface.name().to_string(),
                interface_type: e.interface.interface_type(),
                capabilities: e.interface.capabilities(),
                interaction: e.interface.supports_interaction(),
                interface: Arc::downgrade(&e.interface),
            })
            .collect()
    }
}

impl fmt::Debug for InterfaceDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("InterfaceDirectory")
            .field("interface_count", &inner.len())
            .field("interfaces", &inner.iter().map(|e| e.id).collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::ChannelInterface;

    fn channel(name: &str, caps: InterfaceCapabilities) -> Arc<dyn InteractionInterface> {
        let (interface, rx) = ChannelInterface::new(name, InterfaceType::Tui, caps, 8);
        // Keep the channel open for the lifetime of the test process.
        std::mem::forget(rx);
        Arc::new(interface)
    }

    #[test]
    fn test_interface_ids_are_sequential() {
        let directory = InterfaceDirectory::new();
        let first = directory.attach(channel("rc", InterfaceCapabilities::headless()));
        let second = directory.attach(channel("qt", InterfaceCapabilities::desktop()));

        assert_eq!(first.to_string(), "intf-1");
        assert_eq!(second.to_string(), "intf-2");
        assert_eq!(directory.interface_ids(), vec![first, second]);
    }

    #[test]
    fn test_attach_detach() {
        let directory = InterfaceDirectory::new();
        let id = directory.attach(channel("tui", InterfaceCapabilities::tui()));

        assert_eq!(directory.count(), 1);
        assert!(directory.contains(&id));

        assert!(directory.detach(&id).is_some());
        assert_eq!(directory.count(), 0);
        assert!(directory.detach(&id).is_none());
    }

    #[test]
    fn test_enumerate_keeps_attach_order() {
        let directory = InterfaceDirectory::new();
        let first = directory.attach(channel("rc", InterfaceCapabilities::headless()));
        let second = directory.attach(channel("qt", InterfaceCapabilities::desktop()));

        let handles = directory.enumerate();
        let ids: Vec<_> = handles.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(handles[1].name, "qt");
    }

    #[test]
    fn test_handle_is_non_owning() {
        let directory = InterfaceDirectory::new();
        let id = directory.attach(channel("tui", InterfaceCapabilities::tui()));
        let handle = directory.enumerate().remove(0);

        assert!(handle.upgrade().is_some());
        drop(directory.detach(&id));
        assert!(handle.upgrade().is_none());
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_handle_carries_interaction_support() {
        let directory = InterfaceDirectory::new();
        directory.attach(channel("rc", InterfaceCapabilities::headless()));
        directory.attach(channel("qt", InterfaceCapabilities::desktop()));

        let support: Vec<_> = directory
            .enumerate()
            .iter()
            .map(InterfaceHandle::supports_interaction)
            .collect();
        assert_eq!(support, vec![false, true]);
    }
}
