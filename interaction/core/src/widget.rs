//! Dialog Widgets
//!
//! A widget is one display element inside a dialog. Widgets are plain data:
//! the broker never renders them, it only carries them to whichever interface
//! is bound. Render order is the order in which widgets were added.

use serde::{Deserialize, Serialize};

/// Kind of a widget, without its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WidgetKind {
    /// Static text
    Text,
    /// Progress bar (0-100)
    ProgressBar,
    /// Text input (login prompts, free-form answers)
    InputField,
    /// A row of buttons
    ButtonSet,
}

impl WidgetKind {
    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Text => "Text",
            Self::ProgressBar => "Progress",
            Self::InputField => "Input",
            Self::ButtonSet => "Buttons",
        }
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A display unit inside a dialog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    /// Static text
    Text {
        /// Text to display
        text: String,
    },
    /// Progress bar with an optional caption
    ProgressBar {
        /// Caption shown next to the bar
        text: Option<String>,
        /// Completion percentage (0-100)
        percent: u8,
    },
    /// Text input field
    InputField {
        /// Field label
        label: String,
        /// Current value (pre-filled or typed by the user)
        value: String,
        /// Whether the value should be hidden while typing (passwords)
        masked: bool,
    },
    /// Set of buttons, rendered left to right
    ButtonSet {
        /// Button labels
        buttons: Vec<String>,
    },
}

impl Widget {
    /// Create a text widget
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create a progress bar; `percent` is clamped to 100
    pub fn progress(text: Option<String>, percent: u8) -> Self {
        Self::ProgressBar {
            text,
            percent: percent.min(100),
        }
    }

    /// Create a plain input field
    pub fn input(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InputField {
            label: label.into(),
            value: value.into(),
            masked: false,
        }
    }

    /// Create a masked input field
    pub fn password(label: impl Into<String>) -> Self {
        Self::InputField {
            label: label.into(),
            value: String::new(),
            masked: true,
        }
    }

    /// Create a button set
    pub fn buttons<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ButtonSet {
            buttons: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// The kind of this widget
    #[must_use]
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::Text { .. } => WidgetKind::Text,
            Self::ProgressBar { .. } => WidgetKind::ProgressBar,
            Self::InputField { .. } => WidgetKind::InputField,
            Self::ButtonSet { .. } => WidgetKind::ButtonSet,
        }
    }

    /// Update the percentage of a progress bar
    ///
    /// Returns false if this widget is not a progress bar.
    pub fn set_progress(&mut self, value: u8) -> bool {
        if let Self::ProgressBar { percent, .. } = self {
            *percent = value.min(100);
            true
        } else {
            false
        }
    }

    /// Display string carried by this widget, if any
    #[must_use]
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ProgressBar { text, .. } => text.as_deref(),
            Self::InputField { label, .. } => Some(label),
            Self::ButtonSet { .. } => None,
        }
    }

    /// Render a progress bar as a fixed-width string
    #[must_use]
    pub fn progress_bar(&self, width: usize) -> Option<String> {
        let Self::ProgressBar { percent, .. } = self else {
            return None;
        };
        let filled = (*percent as usize * width) / 100;
        let empty = width.saturating_sub(filled);
        Some(format!("{}{}", "#".repeat(filled), "-".repeat(empty)))
    }
}
