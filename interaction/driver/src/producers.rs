//! Simulated Producer Modules
//!
//! Each producer is a plain OS thread standing in for a playback module:
//! it reports buffering progress, emits the occasional warning or fatal
//! error, and now and then blocks on a question.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use interaction_core::{Broker, Dialog, DialogId, InteractionError};

/// What a producer did before it stopped
#[derive(Debug, Default)]
pub struct ProducerSummary {
    /// Producer number
    pub index: usize,
    /// Dialogs accepted by the broker
    pub submitted: usize,
    /// Questions that got an answer
    pub answered: usize,
    /// Submissions the broker refused
    pub failed: usize,
}

/// Start `count` producers
pub fn spawn(
    broker: &Broker,
    count: usize,
    pace: Duration,
    shutdown: Arc<AtomicBool>,
) -> Vec<JoinHandle<ProducerSummary>> {
    (0..count)
        .filter_map(|index| {
            let broker = broker.clone();
            let shutdown = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name(format!("producer-{index}"))
                .spawn(move || run(index, &broker, pace, &shutdown));
            match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!(producer = index, error = %e, "Failed to start producer");
                    None
                }
            }
        })
        .collect()
}

/// Wait for every producer; panicked producers are logged and skipped
pub fn join(handles: Vec<JoinHandle<ProducerSummary>>) -> Vec<ProducerSummary> {
    handles
        .into_iter()
        .filter_map(|handle| match handle.join() {
            Ok(summary) => Some(summary),
            Err(_) => {
                warn!("Producer thread panicked");
                None
            }
        })
        .collect()
}

fn run(index: usize, broker: &Broker, pace: Duration, shutdown: &AtomicBool) -> ProducerSummary {
    let mut summary = ProducerSummary {
        index,
        ..ProducerSummary::default()
    };
    let module = format!("module-{index}");
    let mut progress: Option<DialogId> = None;
    let mut fatal = DialogId::UNASSIGNED;
    let mut round = 0u32;

    while !shutdown.load(Ordering::SeqCst) {
        round += 1;

        let step = match progress {
            None => broker.progress(module.as_str(), "Buffering", 0).map(|id| {
                progress = Some(id);
            }),
            Some(id) => {
                let percent = u8::try_from((round * 10) % 110).unwrap_or(100);
                if percent >= 100 {
                    broker.request_hide(id)
                } else {
                    broker.update(id, |d| d.set_progress(percent))
                }
            }
        };
        if !record(&mut summary, step) {
            break;
        }

        if round % 5 == 0 {
            let step = broker
                .warning(module.as_str(), format!("late frame at round {round}"))
                .map(|_| ());
            if !record(&mut summary, step) {
                break;
            }
        }

        if round % 11 == 0 {
            // Repeated failures land in the same dialog
            let message = format!("decoder stalled at round {round}");
            match broker.fatal(fatal, module.as_str(), message) {
                Some(id) => {
                    fatal = id;
                    summary.submitted += 1;
                }
                None => summary.failed += 1,
            }
        }

        if round % 7 == 0 {
            let question =
                Dialog::question(module.as_str(), "Skip damaged segment?", ["Skip", "Retry"]);
            match broker.submit(question) {
                Ok(submitted) => {
                    debug!(
                        producer = index,
                        dialog_id = %submitted.id,
                        answer = ?submitted.answer,
                        "Question answered"
                    );
                    summary.submitted += 1;
                    summary.answered += 1;
                }
                Err(e) => {
                    if !record(&mut summary, Err(e)) {
                        break;
                    }
                }
            }
        }

        thread::sleep(pace);
    }

    summary
}

/// Count the outcome of a step; returns false once the session is gone
fn record(summary: &mut ProducerSummary, step: Result<(), InteractionError>) -> bool {
    match step {
        Ok(()) => {
            summary.submitted += 1;
            true
        }
        Err(InteractionError::Allocation(reason)) => {
            debug!(producer = summary.index, reason = %reason, "Session closed, producer stopping");
            false
        }
        Err(e) => {
            warn!(producer = summary.index, error = %e, "Submission refused");
            summary.failed += 1;
            true
        }
    }
}
