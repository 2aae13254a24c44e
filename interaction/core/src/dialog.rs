//! Dialog Model
//!
//! A dialog is a user-facing interaction request: an error box, a progress
//! bar, a login prompt. Producers build a [`Dialog`], hand it to the broker,
//! and from then on the registry owns it. The interface module only ever sees
//! snapshots delivered during a manage tick.
//!
//! # Lifecycle
//!
//! ```text
//!   New ──► Sent ──► Updated ───────┐
//!            │  ▲       │           │
//!            │  └───────┘           │
//!            ├──► Answered ──┐      │
//!            └──► HideRequested ──► Hiding ──► Hidden ──► (destroyed | retained)
//! ```
//!
//! Only the manage pass moves a dialog along this graph, one step per tick.
//! `Answered` is set by the interface, `Updated` and `HideRequested` by
//! producers.

use serde::{Deserialize, Serialize};

use crate::widget::Widget;

/// Highest id reserved for framework-predefined dialogs
///
/// Auto-assigned ids start right after it.
pub const DIALOG_LAST_PREDEFINED: u32 = PredefinedDialog::NetworkLogin as u32;

/// Dialog identifier
///
/// Zero means "unassigned"; the registry assigns a fresh id on submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DialogId(pub u32);

impl DialogId {
    /// The unassigned id
    pub const UNASSIGNED: Self = Self(0);

    /// Create an id from a raw value
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Whether an id has been assigned
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.0 != 0
    }

    /// Whether this id belongs to the predefined range
    #[must_use]
    pub fn is_predefined(&self) -> bool {
        self.is_assigned() && self.0 <= DIALOG_LAST_PREDEFINED
    }

    /// Get the raw numeric value
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DialogId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dialog-{}", self.0)
    }
}

impl From<PredefinedDialog> for DialogId {
    fn from(dialog: PredefinedDialog) -> Self {
        Self(dialog as u32)
    }
}

/// Dialogs with a framework-wide well-known id
///
/// Modules reuse these ids so repeated failures of the same kind update one
/// dialog instead of stacking new ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum PredefinedDialog {
    /// An input could not be opened
    NoAccess = 1,
    /// No decoder found for a stream
    NoCodec = 2,
    /// Audio output could not be started
    NoAudio = 3,
    /// A network resource asked for credentials
    NetworkLogin = 4,
}

/// Kind of dialog, decides routing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogKind {
    /// Informational notice
    Notify,
    /// Unrecoverable error
    Fatal,
    /// Recoverable error
    Error,
    /// Warning
    Warning,
    /// Question that blocks the producer until answered
    Ask,
    /// Progress report
    Progress,
}

impl DialogKind {
    /// Whether dialogs of this kind block their producer for an answer
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        matches!(self, Self::Ask)
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Notify => "Notify",
            Self::Fatal => "Fatal",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Ask => "Ask",
            Self::Progress => "Progress",
        }
    }
}

impl std::fmt::Display for DialogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Request sent to the interface for a dialog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogAction {
    /// Create and show the dialog
    New,
    /// Refresh an already shown dialog
    Update,
    /// Take the dialog off screen
    Hide,
}

impl std::fmt::Display for DialogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::New => "New",
            Self::Update => "Update",
            Self::Hide => "Hide",
        };
        write!(f, "{label}")
    }
}

/// Lifecycle status of a dialog
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogStatus {
    /// Submitted, never presented
    New,
    /// Presented by the interface
    Sent,
    /// Content changed since it was presented
    Updated,
    /// The user answered through the interface
    Answered,
    /// A producer asked for the dialog to go away
    HideRequested,
    /// Hide request delivered, waiting for acknowledgement
    Hiding,
    /// Off screen
    Hidden,
}

impl DialogStatus {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Sent => "Sent",
            Self::Updated => "Updated",
            Self::Answered => "Answered",
            Self::HideRequested => "HideRequested",
            Self::Hiding => "Hiding",
            Self::Hidden => "Hidden",
        }
    }

    /// Whether the interface currently shows (or is about to refresh) the dialog
    #[must_use]
    pub fn is_presented(&self) -> bool {
        matches!(self, Self::Sent | Self::Updated)
    }

    /// Whether the dialog is on its way off screen or already gone
    #[must_use]
    pub fn is_closing(&self) -> bool {
        matches!(
            self,
            Self::Answered | Self::HideRequested | Self::Hiding | Self::Hidden
        )
    }
}

impl std::fmt::Display for DialogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A user response recorded by the interface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    /// A button was pressed
    Button(String),
    /// Input fields were filled in, in widget order
    Input(Vec<String>),
    /// The dialog was closed without a choice
    Dismissed,
}

/// A user-facing interaction request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Identity (0 until submitted)
    pub id: DialogId,
    /// Kind of dialog
    pub kind: DialogKind,
    /// Last request delivered to the interface
    pub action: Option<DialogAction>,
    /// Lifecycle status
    pub status: DialogStatus,
    /// Title (optional)
    pub title: Option<String>,
    /// Longer description (optional)
    pub description: Option<String>,
    /// Widgets in render order
    pub widgets: Vec<Widget>,
    /// Keep the dialog around once hidden so it can be shown again by id
    pub reusable: bool,
    /// Response recorded by the interface
    pub answer: Option<Answer>,
}

impl Dialog {
    /// Create an empty dialog of the given kind
    #[must_use]
    pub fn new(kind: DialogKind) -> Self {
        Self {
            id: DialogId::UNASSIGNED,
            kind,
            action: None,
            status: DialogStatus::New,
            title: None,
            description: None,
            widgets: Vec::new(),
            reusable: false,
            answer: None,
        }
    }

    /// Fatal error dialog with a single text widget
    pub fn fatal(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DialogKind::Fatal)
            .with_title(title)
            .with_widget(Widget::text(message))
    }

    /// Question with a row of buttons
    pub fn question<I, S>(title: impl Into<String>, question: impl Into<String>, buttons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(DialogKind::Ask)
            .with_title(title)
            .with_widget(Widget::text(question))
            .with_widget(Widget::buttons(buttons))
    }

    /// Login prompt for a predefined or custom id
    pub fn login(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(DialogKind::Ask)
            .with_id(PredefinedDialog::NetworkLogin)
            .with_title(title)
            .with_description(description)
            .with_widget(Widget::input("Login", ""))
            .with_widget(Widget::password("Password"))
            .with_widget(Widget::buttons(["Ok", "Cancel"]))
    }

    /// Reusable progress dialog
    pub fn progress(title: impl Into<String>, text: impl Into<String>, percent: u8) -> Self {
        Self::new(DialogKind::Progress)
            .with_title(title)
            .with_widget(Widget::progress(Some(text.into()), percent))
            .reusable()
    }

    /// Set an explicit id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<DialogId>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Append a widget
    #[must_use]
    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    /// Mark the dialog reusable
    #[must_use]
    pub fn reusable(mut self) -> Self {
        self.reusable = true;
        self
    }

    /// Mark this submission as an update of an already queued dialog
    #[must_use]
    pub fn as_update(mut self) -> Self {
        self.status = DialogStatus::Updated;
        self
    }

    /// Whether this submission is an explicit update
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.status == DialogStatus::Updated
    }

    /// Number of widgets
    #[must_use]
    pub fn widget_count(&self) -> usize {
        self.widgets.len()
    }

    /// First progress bar percentage, if the dialog has one
    #[must_use]
    pub fn progress_percent(&self) -> Option<u8> {
        self.widgets.iter().find_map(|w| match w {
            Widget::ProgressBar { percent, .. } => Some(*percent),
            _ => None,
        })
    }

    /// Set the percentage of every progress bar in the dialog
    pub fn set_progress(&mut self, percent: u8) {
        for widget in &mut self.widgets {
            widget.set_progress(percent);
        }
    }

    /// Replace the content of this dialog with the content of an update
    ///
    /// Identity, status, action and answer are kept.
    pub(crate) fn merge_content(&mut self, update: Dialog) {
        self.kind = update.kind;
        self.title = update.title;
        self.description = update.description;
        self.widgets = update.widgets;
        self.reusable = update.reusable;
    }
}
