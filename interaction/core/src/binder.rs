//! Interface Binder
//!
//! Picks the interface that should present dialogs. Resolution is a pure
//! function of the directory and is repeated on every manage tick, since
//! interfaces attach and detach at any time.

use crate::directory::{InterfaceDirectory, InterfaceHandle};

/// Find the first interaction-capable interface, in attach order
///
/// Interfaces that are detached or report themselves disconnected are
/// skipped. Returns `None` if no interface can present dialogs.
#[must_use]
pub fn resolve(directory: &InterfaceDirectory) -> Option<InterfaceHandle> {
    let handle = directory
        .enumerate()
        .into_iter()
        .find(|h| h.supports_interaction() && h.is_alive());

    match &handle {
        Some(h) => tracing::trace!(interface_id = %h.id, name = %h.name, "Interface resolved"),
        None => tracing::trace!(
            attached = directory.count(),
            "No interaction-capable interface"
        ),
    }
    handle
}
