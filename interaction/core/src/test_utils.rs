//! Shared helpers for unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::dialog::{Dialog, DialogAction};
use crate::directory::InterfaceDirectory;
use crate::error::DeliveryError;
use crate::events::{InterfaceCapabilities, InterfaceType};
use crate::interface::InteractionInterface;

/// Interface that records every delivery
pub struct RecordingInterface {
    capabilities: InterfaceCapabilities,
    deliveries: Mutex<Vec<(DialogAction, Dialog)>>,
    failing: AtomicBool,
}

impl RecordingInterface {
    pub fn new(capabilities: InterfaceCapabilities) -> Self {
        Self {
            capabilities,
            deliveries: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn actions(&self) -> Vec<DialogAction> {
        self.deliveries.lock().iter().map(|(a, _)| *a).collect()
    }

    pub fn deliveries(&self) -> Vec<(DialogAction, Dialog)> {
        self.deliveries.lock().clone()
    }
}

impl InteractionInterface for RecordingInterface {
    fn name(&self) -> &str {
        "recording"
    }

    fn interface_type(&self) -> InterfaceType {
        InterfaceType::Custom("recording".to_string())
    }

    fn capabilities(&self) -> InterfaceCapabilities {
        self.capabilities.clone()
    }

    fn deliver(&self, action: DialogAction, dialog: &Dialog) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Busy);
        }
        self.deliveries.lock().push((action, dialog.clone()));
        Ok(())
    }
}

/// Directory with one interaction-capable recording interface attached
pub fn recording_directory() -> (InterfaceDirectory, Arc<RecordingInterface>) {
    let directory = InterfaceDirectory::new();
    let interface = Arc::new(RecordingInterface::new(InterfaceCapabilities::desktop()));
    directory.attach(interface.clone());
    (directory, interface)
}
