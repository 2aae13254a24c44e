//! Interface Events
//!
//! Events sent from an interface module back to the broker, plus the
//! descriptive types interfaces advertise about themselves.
//!
//! Interfaces report what the user did; the broker decides what it means for
//! the dialog lifecycle during the next manage tick.

use serde::{Deserialize, Serialize};

use crate::dialog::{Answer, DialogId};

/// Events from an interface to the broker
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceEvent {
    /// The user answered a dialog
    Answered {
        /// Which dialog
        dialog_id: DialogId,
        /// The recorded response
        answer: Answer,
    },

    /// The interface finished hiding a dialog
    Hidden {
        /// Which dialog
        dialog_id: DialogId,
    },
}

impl InterfaceEvent {
    /// Id of the dialog this event refers to
    #[must_use]
    pub fn dialog_id(&self) -> DialogId {
        match self {
            Self::Answered { dialog_id, .. } | Self::Hidden { dialog_id } => *dialog_id,
        }
    }
}

/// Type of interface module
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterfaceType {
    /// Native desktop GUI
    Desktop,
    /// Terminal UI
    Tui,
    /// Web remote control
    Web,
    /// Scripting / remote-control interface without a screen
    Headless,
    /// Custom interface type
    Custom(String),
}

impl InterfaceType {
    /// Human-readable name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Desktop => "Desktop",
            Self::Tui => "Terminal",
            Self::Web => "Web",
            Self::Headless => "Headless",
            Self::Custom(name) => name,
        }
    }
}

/// Capabilities an interface advertises
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct InterfaceCapabilities {
    /// Can present dialogs at all
    pub interaction: bool,
    /// Can draw progress bars
    pub progress: bool,
    /// Can collect text input
    pub input_fields: bool,
    /// Can acknowledge hide requests
    pub hide_ack: bool,
}

impl InterfaceCapabilities {
    /// Full-featured desktop interface
    #[must_use]
    pub fn desktop() -> Self {
        Self {
            interaction: true,
            progress: true,
            input_fields: true,
            hide_ack: true,
        }
    }

    /// Terminal interface
    #[must_use]
    pub fn tui() -> Self {
        Self {
            interaction: true,
            progress: true,
            input_fields: true,
            hide_ack: false,
        }
    }

    /// Interface that cannot show dialogs
    #[must_use]
    pub fn headless() -> Self {
        Self::default()
    }
}
