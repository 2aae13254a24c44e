//! Console Interface
//!
//! Renders interaction requests to stdout and answers questions on the
//! user's behalf, so the driver can run unattended.

use std::fmt::Write as _;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use interaction_core::{
    Answer, Broker, Dialog, DialogAction, DialogKind, InteractionRequest, Widget,
};

const BAR_WIDTH: usize = 20;

/// Drain requests until the interface is detached or the driver stops
pub async fn run(mut rx: mpsc::Receiver<InteractionRequest>, broker: Broker, json: bool) {
    while let Some(request) = rx.recv().await {
        if json {
            match serde_json::to_string(&request) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "Failed to serialize request"),
            }
        } else {
            println!("{}", render(&request));
        }

        if request.action == DialogAction::New && request.dialog.kind == DialogKind::Ask {
            let answer = auto_answer(&request.dialog);
            debug!(dialog_id = %request.dialog_id(), answer = ?answer, "Answering");
            if let Err(e) = broker.answer(request.dialog_id(), answer) {
                warn!(dialog_id = %request.dialog_id(), error = %e, "Failed to answer");
            }
        }
    }
    debug!("Console interface stopped");
}

/// Pick the answer a hurried user would give
///
/// Input fields are submitted with their pre-filled values; otherwise the
/// first button is pressed.
fn auto_answer(dialog: &Dialog) -> Answer {
    let inputs: Vec<String> = dialog
        .widgets
        .iter()
        .filter_map(|w| match w {
            Widget::InputField { value, .. } => Some(value.clone()),
            _ => None,
        })
        .collect();
    if !inputs.is_empty() {
        return Answer::Input(inputs);
    }

    dialog
        .widgets
        .iter()
        .find_map(|w| match w {
            Widget::ButtonSet { buttons } => buttons.first().cloned(),
            _ => None,
        })
        .map_or(Answer::Dismissed, Answer::Button)
}

/// Render a request as a short text block
fn render(request: &InteractionRequest) -> String {
    let dialog = &request.dialog;
    let mut out = format!("[{}] {} {}", request.action, dialog.id, dialog.kind);
    if let Some(title) = &dialog.title {
        let _ = write!(out, ": {title}");
    }
    if request.action == DialogAction::Hide {
        return out;
    }
    if let Some(description) = &dialog.description {
        let _ = write!(out, "\n  {description}");
    }

    for widget in &dialog.widgets {
        match widget {
            Widget::ProgressBar { percent, .. } => {
                let bar = widget.progress_bar(BAR_WIDTH).unwrap_or_default();
                let caption = widget.display_text().unwrap_or("");
                let _ = write!(out, "\n  {caption} [{bar}] {percent}%");
            }
            Widget::InputField { label, masked, .. } => {
                let hint = if *masked { " (hidden)" } else { "" };
                let _ = write!(out, "\n  {label}{hint}: ____");
            }
            Widget::ButtonSet { buttons } => {
                let row: Vec<_> = buttons.iter().map(|b| format!("<{b}>")).collect();
                let _ = write!(out, "\n  {}", row.join(" "));
            }
            Widget::Text { text } => {
                let _ = write!(out, "\n  {text}");
            }
        }
    }
    out
}
