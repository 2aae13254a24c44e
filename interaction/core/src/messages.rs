//! Interaction Requests
//!
//! Requests sent from the broker to an interface module. Each request carries
//! the action to perform and a snapshot of the dialog at delivery time.
//!
//! # Design Philosophy
//!
//! Interfaces are renderers. They receive a full snapshot on every request
//! instead of a diff, so an interface that attaches mid-session can render an
//! `Update` without having seen the matching `New`.

use serde::{Deserialize, Serialize};

use crate::dialog::{Dialog, DialogAction, DialogId};

/// A request for an interface to create, refresh or hide a dialog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRequest {
    /// What the interface should do
    pub action: DialogAction,
    /// Dialog snapshot
    pub dialog: Dialog,
}

impl InteractionRequest {
    /// Build a request from a dialog snapshot
    #[must_use]
    pub fn new(action: DialogAction, dialog: &Dialog) -> Self {
        Self {
            action,
            dialog: dialog.clone(),
        }
    }

    /// Id of the dialog this request is about
    #[must_use]
    pub fn dialog_id(&self) -> DialogId {
        self.dialog.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_json_shape() {
        let dialog = Dialog::fatal("Error", "disk full").with_id(DialogId::new(5));
        let request = InteractionRequest::new(DialogAction::New, &dialog);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["action"], "New");
        assert_eq!(json["dialog"]["id"], 5);
        assert_eq!(json["dialog"]["kind"], "Fatal");
        assert_eq!(json["dialog"]["widgets"][0]["text"], "disk full");
    }
}
