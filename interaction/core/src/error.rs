//! Error Types
//!
//! Producer-facing errors are returned from the broker API, never raised as
//! framework-fatal. The manage pass never returns errors; it logs them and
//! keeps the queue for the next tick.

use thiserror::Error;

use crate::dialog::DialogId;

/// Errors returned by broker operations
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InteractionError {
    /// The registry could not be created or located (or was destroyed)
    #[error("interaction registry unavailable: {0}")]
    Allocation(String),

    /// A dialog with the same id is already queued
    #[error("{id} is already queued")]
    DuplicateDialog {
        /// The colliding id
        id: DialogId,
    },

    /// No interface can display dialogs right now
    #[error("no interaction-capable interface is bound")]
    NoInterfaceBound,

    /// The caller stopped waiting before an answer arrived
    #[error("{id} was cancelled before an answer arrived")]
    Cancelled {
        /// The dialog that was waiting
        id: DialogId,
    },

    /// The queue reached its configured depth
    #[error("interaction queue is full ({limit} dialogs)")]
    QueueFull {
        /// The configured limit
        limit: usize,
    },

    /// The dialog breaks a configured limit
    #[error("invalid dialog: {0}")]
    InvalidDialog(String),

    /// No dialog with this id is queued
    #[error("{id} is not queued")]
    UnknownDialog {
        /// The missing id
        id: DialogId,
    },
}

/// Result alias for broker operations
pub type Result<T> = std::result::Result<T, InteractionError>;

/// Errors an interface reports when it cannot take a request
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The interface went away
    #[error("interface disconnected")]
    Disconnected,

    /// The interface cannot take more requests right now
    #[error("interface is busy")]
    Busy,

    /// The interface refused the request
    #[error("interface rejected request: {0}")]
    Rejected(String),
}
