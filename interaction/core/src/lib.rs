//! Interaction Core - Dialog Broker for the Playback Framework
//!
//! Playback modules (demuxers, decoders, access modules, outputs) run on
//! their own threads and sometimes need to tell the user something or ask
//! for something: a fatal error, a codec warning, a progress bar, network
//! credentials. This crate queues those requests and hands them to whichever
//! interface module is currently able to present them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     Producers (any thread)                       │
//! │   demux     decoder     access     output     playlist           │
//! │     └──────────┴──────────┼──────────┴──────────┘                │
//! │                  submit / fatal / ask / progress                 │
//! └───────────────────────────┼──────────────────────────────────────┘
//!                             │
//! ┌───────────────────────────┼──────────────────────────────────────┐
//! │                    INTERACTION CORE                              │
//! │  ┌────────────┐   ┌───────┴────────┐   ┌──────────────────────┐  │
//! │  │  Playback  │──►│  Interaction   │   │ Interface Directory  │  │
//! │  │  Session   │   │   Registry     │◄──│  + Binder (resolve)  │  │
//! │  └────────────┘   └───────┬────────┘   └──────────────────────┘  │
//! │                    manage │ (control loop tick)                  │
//! └───────────────────────────┼──────────────────────────────────────┘
//!                             │ deliver(New | Update | Hide)
//! ┌───────────────────────────┼──────────────────────────────────────┐
//! │                    Interface Modules                             │
//! │     desktop GUI       terminal UI        web          headless   │
//! └──────────────────────────────────────────────────────────────────┘
//!                             │ InterfaceEvent (Answered, Hidden)
//!                             ▼
//!                       Broker::handle_event
//! ```
//!
//! # Key Types
//!
//! - [`Broker`]: Producer entry points and the manage tick
//! - [`InteractionRegistry`]: Per-session queue and dialog lifecycle
//! - [`PlaybackSession`]: Owns the registry, creates it lazily
//! - [`InterfaceDirectory`]: Attached interface modules, in attach order
//! - [`Dialog`] / [`Widget`]: What gets presented
//!
//! # Module Overview
//!
//! - [`binder`]: Picks the interface for a tick
//! - [`broker`]: Submission, asks, fatal helper
//! - [`config`]: TOML, environment and CLI configuration
//! - [`dialog`]: Dialog model and lifecycle states
//! - [`directory`]: Interface directory and non-owning handles
//! - [`error`]: Error types
//! - [`events`]: Events interfaces report back, capabilities
//! - [`interface`]: The interface trait and a channel-backed implementation
//! - [`messages`]: Serializable requests sent to interfaces
//! - [`registry`]: The queue and the manage pass
//! - [`session`]: Playback session
//! - [`widget`]: Widget model

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod binder;
pub mod broker;
pub mod config;
pub mod dialog;
pub mod directory;
pub mod error;
pub mod events;
pub mod interface;
pub mod messages;
pub mod registry;
pub mod session;
pub mod widget;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenience
pub use broker::{Broker, Submitted};
pub use dialog::{
    Answer, Dialog, DialogAction, DialogId, DialogKind, DialogStatus, PredefinedDialog,
    DIALOG_LAST_PREDEFINED,
};
pub use directory::{InterfaceDirectory, InterfaceHandle, InterfaceId};
pub use error::{DeliveryError, InteractionError, Result};
pub use events::{InterfaceCapabilities, InterfaceEvent, InterfaceType};
pub use interface::{ChannelInterface, InteractionInterface};
pub use messages::InteractionRequest;
pub use registry::{InteractionRegistry, ManageOutcome, ManageReport, RegistryStats};
pub use session::PlaybackSession;
pub use widget::{Widget, WidgetKind};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, BrokerConfig, ConfigError,
    ConfigOverrides, ConfigSource, InteractionConfigFile, InteractionToml,
};
