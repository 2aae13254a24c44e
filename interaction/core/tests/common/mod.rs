//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use interaction_core::{
    BrokerConfig, Broker, DeliveryError, Dialog, DialogAction, InteractionInterface,
    InterfaceCapabilities, InterfaceDirectory, InterfaceType, PlaybackSession,
};

/// Interface that records every delivery
pub struct RecordingInterface {
    name: String,
    capabilities: InterfaceCapabilities,
    deliveries: Mutex<Vec<(DialogAction, Dialog)>>,
}

impl RecordingInterface {
    pub fn new(name: &str, capabilities: InterfaceCapabilities) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            capabilities,
            deliveries: Mutex::new(Vec::new()),
        })
    }

    pub fn deliveries(&self) -> Vec<(DialogAction, Dialog)> {
        self.deliveries.lock().clone()
    }

    pub fn actions(&self) -> Vec<DialogAction> {
        self.deliveries.lock().iter().map(|(a, _)| *a).collect()
    }
}

impl InteractionInterface for RecordingInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn interface_type(&self) -> InterfaceType {
        InterfaceType::Desktop
    }

    fn capabilities(&self) -> InterfaceCapabilities {
        self.capabilities.clone()
    }

    fn deliver(&self, action: DialogAction, dialog: &Dialog) -> Result<(), DeliveryError> {
        self.deliveries.lock().push((action, dialog.clone()));
        Ok(())
    }
}

/// Broker over a fresh session and an empty directory
pub fn broker_with(config: BrokerConfig) -> Broker {
    let session = Arc::new(PlaybackSession::new("test", config));
    Broker::new(session, InterfaceDirectory::new())
}

/// Broker with one desktop recording interface attached
pub fn broker_with_interface() -> (Broker, Arc<RecordingInterface>) {
    let broker = broker_with(BrokerConfig::default());
    let interface = RecordingInterface::new("qt", InterfaceCapabilities::desktop());
    broker.directory().attach(interface.clone());
    (broker, interface)
}
