//! Interface Modules
//!
//! The broker talks to interface modules through [`InteractionInterface`].
//! Rendering is entirely the interface's business; the broker only asks it to
//! create, update or hide a dialog and expects a quick yes/no in return.
//!
//! [`ChannelInterface`] is the stock implementation for interfaces that run
//! their own event loop: every request is pushed onto a bounded tokio channel
//! and the renderer drains it at its own pace.

use tokio::sync::mpsc;

use crate::dialog::{Dialog, DialogAction};
use crate::error::DeliveryError;
use crate::events::{InterfaceCapabilities, InterfaceType};
use crate::messages::InteractionRequest;

/// An interface module able to receive interaction requests
///
/// `deliver` is called from the manage pass while the registry lock is held,
/// so implementations must not block and must not call back into the broker.
pub trait InteractionInterface: Send + Sync {
    /// Module name, for logs
    fn name(&self) -> &str;

    /// Type of interface
    fn interface_type(&self) -> InterfaceType;

    /// Advertised capabilities
    fn capabilities(&self) -> InterfaceCapabilities;

    /// Whether the interface can present dialogs
    fn supports_interaction(&self) -> bool {
        self.capabilities().interaction
    }

    /// Whether the interface is still alive
    fn is_connected(&self) -> bool {
        true
    }

    /// Hand a request to the interface
    ///
    /// # Errors
    ///
    /// Returns a [`DeliveryError`] if the interface cannot take the request;
    /// the broker retries on the next tick.
    fn deliver(&self, action: DialogAction, dialog: &Dialog) -> Result<(), DeliveryError>;
}

/// Interface backed by a bounded channel of [`InteractionRequest`]s
#[derive(Debug)]
pub struct ChannelInterface {
    name: String,
    interface_type: InterfaceType,
    capabilities: InterfaceCapabilities,
    tx: mpsc::Sender<InteractionRequest>,
}

impl ChannelInterface {
    /// Create an interface and the receiver its renderer should drain
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        interface_type: InterfaceType,
        capabilities: InterfaceCapabilities,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<InteractionRequest>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let interface = Self {
            name: name.into(),
            interface_type,
            capabilities,
            tx,
        };
        (interface, rx)
    }
}

impl InteractionInterface for ChannelInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn interface_type(&self) -> InterfaceType {
        self.interface_type.clone()
    }

    fn capabilities(&self) -> InterfaceCapabilities {
        self.capabilities.clone()
    }

    fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    fn deliver(&self, action: DialogAction, dialog: &Dialog) -> Result<(), DeliveryError> {
        self.tx
            .try_send(InteractionRequest::new(action, dialog))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => DeliveryError::Busy,
                mpsc::error::TrySendError::Closed(_) => DeliveryError::Disconnected,
            })
    }
}
