//! Interaction Broker - Producer Entry Points
//!
//! Modules anywhere in the framework submit dialogs through the [`Broker`].
//! Non-blocking kinds return as soon as the dialog is queued. Ask dialogs
//! wait until the user answers through an interface, the optional ask
//! timeout elapses, or the session is torn down.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use interaction_core::{Broker, BrokerConfig, DialogId, InterfaceDirectory, PlaybackSession};
//!
//! let session = Arc::new(PlaybackSession::new("player", BrokerConfig::default()));
//! let broker = Broker::new(session, InterfaceDirectory::new());
//!
//! broker.fatal(DialogId::UNASSIGNED, "Error", "disk full");
//! broker.manage();
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;

use crate::dialog::{Answer, Dialog, DialogId, DialogKind};
use crate::directory::InterfaceDirectory;
use crate::error::{InteractionError, Result};
use crate::events::InterfaceEvent;
use crate::registry::{InteractionRegistry, ManageReport};
use crate::session::PlaybackSession;
use crate::widget::Widget;

/// Outcome of a submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitted {
    /// Id the dialog is queued under
    pub id: DialogId,
    /// The user's answer, for ask dialogs
    pub answer: Option<Answer>,
}

impl Submitted {
    fn queued(id: DialogId) -> Self {
        Self { id, answer: None }
    }

    fn answered(id: DialogId, answer: Answer) -> Self {
        Self {
            id,
            answer: Some(answer),
        }
    }
}

/// Abandons an ask dialog when dropped while still armed
struct AbandonOnDrop<'a> {
    registry: &'a InteractionRegistry,
    id: DialogId,
    armed: bool,
}

impl AbandonOnDrop<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.registry.abandon(self.id);
        }
    }
}

async fn wait_for_answer(
    rx: oneshot::Receiver<Answer>,
    id: DialogId,
    timeout: Option<Duration>,
) -> Result<Answer> {
    let received = match timeout {
        Some(limit) => {
            if let Ok(received) = tokio::time::timeout(limit, rx).await {
                received
            } else {
                tracing::warn!(
                    dialog_id = %id,
                    timeout_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    "Ask timed out"
                );
                return Err(InteractionError::Cancelled { id });
            }
        }
        None => rx.await,
    };

    received.map_err(|_| {
        tracing::debug!(dialog_id = %id, "Ask cancelled");
        InteractionError::Cancelled { id }
    })
}

/// Entry point for dialog producers
///
/// Cloning is cheap; every clone talks to the same session and directory.
#[derive(Clone)]
pub struct Broker {
    session: Arc<PlaybackSession>,
    directory: InterfaceDirectory,
}

impl Broker {
    /// Create a broker for a session and its interface directory
    #[must_use]
    pub fn new(session: Arc<PlaybackSession>, directory: InterfaceDirectory) -> Self {
        Self { session, directory }
    }

    /// The session this broker submits to
    #[must_use]
    pub fn session(&self) -> &Arc<PlaybackSession> {
        &self.session
    }

    /// The directory interfaces attach to
    #[must_use]
    pub fn directory(&self) -> &InterfaceDirectory {
        &self.directory
    }

    /// Submit a dialog
    ///
    /// Ask dialogs block the calling thread until answered (see
    /// [`Broker::ask_blocking`]). Every other kind is queued and the call
    /// returns at once.
    ///
    /// # Errors
    ///
    /// - [`InteractionError::Allocation`] if the session is torn down
    /// - [`InteractionError::InvalidDialog`] if the dialog breaks a limit
    /// - [`InteractionError::DuplicateDialog`] if the id is already queued
    /// - [`InteractionError::QueueFull`] if the queue is at its depth limit
    /// - [`InteractionError::Cancelled`] if an ask is cancelled
    /// - [`InteractionError::InvalidDialog`] for an ask on a current-thread
    ///   runtime
    pub fn submit(&self, dialog: Dialog) -> Result<Submitted> {
        if dialog.kind.is_synchronous() {
            return self.ask_blocking(dialog);
        }
        let registry = self.session.registry()?;
        registry.enqueue(dialog, None).map(Submitted::queued)
    }

    /// Submit a dialog and block the calling thread until it is answered
    ///
    /// Works from plain threads and from multi-thread tokio runtimes, where
    /// the worker is handed off through [`tokio::task::block_in_place`].
    /// Current-thread runtimes cannot block; use [`Broker::ask`] there.
    ///
    /// # Errors
    ///
    /// Same as [`Broker::submit`]. [`InteractionError::Cancelled`] is
    /// returned on teardown or when the configured ask timeout elapses.
    /// [`InteractionError::InvalidDialog`] is returned, with nothing queued,
    /// when called on a current-thread runtime.
    pub fn ask_blocking(&self, mut dialog: Dialog) -> Result<Submitted> {
        dialog.kind = DialogKind::Ask;

        // Checked before enqueueing so a refusal leaves nothing behind
        let in_runtime = match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => true,
            Ok(_) => {
                return Err(InteractionError::InvalidDialog(
                    "blocking ask on a current-thread runtime; use Broker::ask".to_string(),
                ));
            }
            Err(_) => false,
        };

        let registry = self.session.registry()?;
        let timeout = registry.config().ask_timeout();
        let timer = match timeout {
            Some(_) => Some(registry.ask_timer()?),
            None => None,
        };

        let (tx, rx) = oneshot::channel();
        let id = registry.enqueue(dialog, Some(tx))?;
        tracing::debug!(dialog_id = %id, in_runtime = in_runtime, "Waiting for answer");

        let wait = move || match timer {
            Some(timer) => timer.block_on(wait_for_answer(rx, id, timeout)),
            None => rx.blocking_recv().map_err(|_| {
                tracing::debug!(dialog_id = %id, "Ask cancelled");
                InteractionError::Cancelled { id }
            }),
        };
        let received = if in_runtime {
            tokio::task::block_in_place(wait)
        } else {
            wait()
        };

        match received {
            Ok(answer) => Ok(Submitted::answered(id, answer)),
            Err(e) => {
                registry.abandon(id);
                Err(e)
            }
        }
    }

    /// Submit a dialog as a question and await the answer
    ///
    /// Dropping the returned future abandons the dialog.
    ///
    /// # Errors
    ///
    /// Same as [`Broker::ask_blocking`].
    pub async fn ask(&self, mut dialog: Dialog) -> Result<Submitted> {
        dialog.kind = DialogKind::Ask;
        let registry = self.session.registry()?;
        let (tx, rx) = oneshot::channel();
        let id = registry.enqueue(dialog, Some(tx))?;

        let guard = AbandonOnDrop {
            registry: &registry,
            id,
            armed: true,
        };
        let answer = wait_for_answer(rx, id, registry.config().ask_timeout()).await?;
        guard.disarm();

        Ok(Submitted::answered(id, answer))
    }

    /// Report a fatal error; never fails
    ///
    /// With an assigned `id` that is already queued, the message is appended
    /// to that dialog and it is presented again as an update. With an id
    /// that is not queued, a new dialog is created under it. Errors are
    /// logged and swallowed.
    ///
    /// Returns the id of the dialog, if it could be queued.
    pub fn fatal(
        &self,
        id: DialogId,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Option<DialogId> {
        let title = title.into();
        let message = message.into();

        let result = if id.is_assigned() {
            self.append_fatal(id, &title, &message)
        } else {
            self.submit(Dialog::fatal(title, message)).map(|s| s.id)
        };

        match result {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(dialog_id = %id, error = %e, "Dropping fatal dialog");
                None
            }
        }
    }

    fn append_fatal(&self, id: DialogId, title: &str, message: &str) -> Result<DialogId> {
        let registry = self.session.registry()?;
        let appended = registry.update(id, |dialog| {
            dialog.kind = DialogKind::Fatal;
            dialog.title = Some(title.to_string());
            dialog.widgets.push(Widget::text(message));
        });

        match appended {
            Ok(()) => Ok(id),
            Err(InteractionError::UnknownDialog { .. }) => {
                registry.enqueue(Dialog::fatal(title, message).with_id(id), None)
            }
            Err(e) => Err(e),
        }
    }

    fn simple(&self, kind: DialogKind, title: String, message: String) -> Result<DialogId> {
        let dialog = Dialog::new(kind)
            .with_title(title)
            .with_widget(Widget::text(message));
        self.submit(dialog).map(|s| s.id)
    }

    /// Queue a recoverable error
    ///
    /// # Errors
    ///
    /// Same as [`Broker::submit`].
    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> Result<DialogId> {
        self.simple(DialogKind::Error, title.into(), message.into())
    }

    /// Queue a warning
    ///
    /// # Errors
    ///
    /// Same as [`Broker::submit`].
    pub fn warning(
        &self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<DialogId> {
        self.simple(DialogKind::Warning, title.into(), message.into())
    }

    /// Queue an informational notice
    ///
    /// # Errors
    ///
    /// Same as [`Broker::submit`].
    pub fn notify(&self, title: impl Into<String>, message: impl Into<String>) -> Result<DialogId> {
        self.simple(DialogKind::Notify, title.into(), message.into())
    }

    /// Queue a reusable progress dialog
    ///
    /// Move it along with [`Broker::update`].
    ///
    /// # Errors
    ///
    /// Same as [`Broker::submit`].
    pub fn progress(
        &self,
        title: impl Into<String>,
        text: impl Into<String>,
        percent: u8,
    ) -> Result<DialogId> {
        self.submit(Dialog::progress(title, text, percent))
            .map(|s| s.id)
    }

    fn queued_registry(&self, id: DialogId) -> Result<Arc<InteractionRegistry>> {
        self.session
            .existing_registry()
            .ok_or(InteractionError::UnknownDialog { id })
    }

    /// Edit a queued dialog; it is presented again on the next tick
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued,
    /// [`InteractionError::InvalidDialog`] if the edit breaks a limit.
    pub fn update<F>(&self, id: DialogId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Dialog),
    {
        self.queued_registry(id)?.update(id, edit)
    }

    /// Ask for a dialog to be taken off screen
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn request_hide(&self, id: DialogId) -> Result<()> {
        self.queued_registry(id)?.request_hide(id)
    }

    /// Apply an event reported by an interface
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn handle_event(&self, event: InterfaceEvent) -> Result<()> {
        self.queued_registry(event.dialog_id())?.handle_event(event)
    }

    /// Record an answer, as an interface would
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn answer(&self, id: DialogId, answer: Answer) -> Result<()> {
        self.handle_event(InterfaceEvent::Answered {
            dialog_id: id,
            answer,
        })
    }

    /// Snapshot of a queued dialog
    #[must_use]
    pub fn dialog(&self, id: DialogId) -> Option<Dialog> {
        self.session.existing_registry()?.dialog(id)
    }

    /// Number of queued dialogs
    #[must_use]
    pub fn pending(&self) -> usize {
        self.session
            .existing_registry()
            .map_or(0, |registry| registry.len())
    }

    /// Run one reconciliation pass against the directory
    ///
    /// Called periodically by the control loop. Never fails; see
    /// [`ManageReport::status`].
    pub fn manage(&self) -> ManageReport {
        match self.session.existing_registry() {
            Some(registry) => registry.manage(&self.directory),
            None => ManageReport::idle(),
        }
    }
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("session", &self.session)
            .field("directory", &self.directory)
            .finish()
    }
}
