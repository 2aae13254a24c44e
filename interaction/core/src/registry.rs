//! Interaction Registry - Pending Dialog Queue
//!
//! One registry exists per playback session. It owns every submitted dialog
//! from enqueue until destruction, hands out dialog ids, and runs the manage
//! pass that moves dialogs through their lifecycle.
//!
//! # Architecture
//!
//! ```text
//!   producers (any thread)                 control loop (one thread)
//!   ──────────────────────                 ─────────────────────────
//!   enqueue / update / hide                manage(directory)
//!            │                                    │
//!            ▼                                    ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │ Mutex<RegistryState>                                     │
//!   │   queue: Vec<QueueEntry>   (submission order)            │
//!   │   next_id                                                │
//!   └──────────────────────────────────────────────────────────┘
//!            pending: AtomicUsize (mirror of queue.len())
//!            bound:   RwLock<Option<InterfaceHandle>> (non-owning)
//! ```
//!
//! # Thread Safety
//!
//! Every queue mutation happens under the state mutex. `pending` lets the
//! manage pass skip the lock entirely when nothing is queued. The bound
//! interface is re-resolved on each tick and held through a weak handle,
//! upgraded only while the tick runs.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;

use crate::binder;
use crate::config::BrokerConfig;
use crate::dialog::{
    Answer, Dialog, DialogAction, DialogId, DialogStatus, DIALOG_LAST_PREDEFINED,
};
use crate::directory::{InterfaceDirectory, InterfaceHandle, InterfaceId};
use crate::error::{InteractionError, Result};
use crate::events::InterfaceEvent;
use crate::interface::InteractionInterface;

/// A queued dialog and, for asks, the caller waiting on it
struct QueueEntry {
    dialog: Dialog,
    waiter: Option<oneshot::Sender<Answer>>,
}

/// Background runtime driving ask timeouts
///
/// Shut down without waiting, so the registry may be dropped from async code.
struct AskTimer {
    handle: Handle,
    runtime: Option<Runtime>,
}

impl Drop for AskTimer {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// State guarded by the registry lock
struct RegistryState {
    queue: Vec<QueueEntry>,
    next_id: u32,
    destroyed: bool,
}

impl RegistryState {
    fn new() -> Self {
        Self {
            queue: Vec::new(),
            next_id: DIALOG_LAST_PREDEFINED + 1,
            destroyed: false,
        }
    }

    fn find(&self, id: DialogId) -> Option<&QueueEntry> {
        self.queue.iter().find(|e| e.dialog.id == id)
    }

    fn find_mut(&mut self, id: DialogId) -> Option<&mut QueueEntry> {
        self.queue.iter_mut().find(|e| e.dialog.id == id)
    }

    /// Next free id; ids already taken by explicit submissions are skipped
    fn allocate_id(&mut self) -> Result<DialogId> {
        loop {
            let candidate = DialogId::new(self.next_id);
            self.next_id = self.next_id.checked_add(1).ok_or_else(|| {
                InteractionError::Allocation("dialog id space exhausted".to_string())
            })?;
            if self.find(candidate).is_none() {
                return Ok(candidate);
            }
        }
    }
}

/// Status a dialog takes after its content changed
///
/// Requests carry full snapshots, so an update may reach the interface
/// before any `New` for the same dialog.
fn status_after_update(status: DialogStatus) -> DialogStatus {
    match status {
        DialogStatus::New | DialogStatus::Sent | DialogStatus::Updated => DialogStatus::Updated,
        // Reusable dialog coming back on screen
        DialogStatus::Hidden => DialogStatus::New,
        other => other,
    }
}

#[derive(Debug, Default)]
struct RegistryCounters {
    ticks: AtomicU64,
    manage_locks: AtomicU64,
    deliveries: AtomicU64,
    delivery_failures: AtomicU64,
    dialogs_destroyed: AtomicU64,
}

/// Point-in-time copy of the registry counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryStats {
    /// Manage calls, including idle ones
    pub ticks: u64,
    /// Manage calls that took the registry lock
    pub manage_locks: u64,
    /// Requests accepted by an interface
    pub deliveries: u64,
    /// Requests an interface refused
    pub delivery_failures: u64,
    /// Dialogs removed after reaching `Hidden`
    pub dialogs_destroyed: u64,
}

/// What a manage tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManageOutcome {
    /// Nothing was queued; the lock was not taken
    Idle,
    /// No interface could present dialogs; nothing changed
    Unbound,
    /// The queue was walked against a bound interface
    Processed,
}

/// Result of one manage tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManageReport {
    /// What happened
    pub outcome: ManageOutcome,
    /// Interface used for this tick
    pub interface: Option<InterfaceId>,
    /// Requests accepted by the interface
    pub delivered: usize,
    /// Requests the interface refused (retried next tick)
    pub failed: usize,
    /// Dialogs destroyed during this tick
    pub removed: usize,
    /// Dialogs still queued after the tick
    pub pending: usize,
}

impl ManageReport {
    pub(crate) fn idle() -> Self {
        Self {
            outcome: ManageOutcome::Idle,
            interface: None,
            delivered: 0,
            failed: 0,
            removed: 0,
            pending: 0,
        }
    }

    fn unbound(pending: usize) -> Self {
        Self {
            outcome: ManageOutcome::Unbound,
            pending,
            ..Self::idle()
        }
    }

    fn processed(interface: InterfaceId) -> Self {
        Self {
            outcome: ManageOutcome::Processed,
            interface: Some(interface),
            ..Self::idle()
        }
    }

    /// Express the tick as a result, for callers that want to log failures
    ///
    /// # Errors
    ///
    /// Returns [`InteractionError::NoInterfaceBound`] when dialogs are waiting
    /// for an interface.
    pub fn status(&self) -> Result<()> {
        match self.outcome {
            ManageOutcome::Unbound => Err(InteractionError::NoInterfaceBound),
            ManageOutcome::Idle | ManageOutcome::Processed => Ok(()),
        }
    }
}

/// Per-session dialog queue and lifecycle engine
pub struct InteractionRegistry {
    state: Mutex<RegistryState>,
    pending: AtomicUsize,
    bound: RwLock<Option<InterfaceHandle>>,
    config: BrokerConfig,
    counters: RegistryCounters,
    timer: Mutex<Option<AskTimer>>,
}

impl InteractionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            state: Mutex::new(RegistryState::new()),
            pending: AtomicUsize::new(0),
            bound: RwLock::new(None),
            config,
            counters: RegistryCounters::default(),
            timer: Mutex::new(None),
        }
    }

    /// Settings this registry was created with
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Runtime that times out blocking asks, started on first use
    ///
    /// Shared by every blocking asker of this registry.
    pub(crate) fn ask_timer(&self) -> Result<Handle> {
        let mut timer = self.timer.lock();
        if let Some(timer) = timer.as_ref() {
            return Ok(timer.handle.clone());
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("ask-timer")
            .enable_time()
            .build()
            .map_err(|e| InteractionError::Allocation(format!("cannot start ask timer: {e}")))?;
        let handle = runtime.handle().clone();
        tracing::debug!("Ask timer started");
        *timer = Some(AskTimer {
            handle: handle.clone(),
            runtime: Some(runtime),
        });
        Ok(handle)
    }

    /// Number of queued dialogs
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`InteractionRegistry::destroy`] has run
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.state.lock().destroyed
    }

    /// Snapshot of a queued dialog
    #[must_use]
    pub fn dialog(&self, id: DialogId) -> Option<Dialog> {
        self.state.lock().find(id).map(|e| e.dialog.clone())
    }

    /// Status of a queued dialog
    #[must_use]
    pub fn status(&self, id: DialogId) -> Option<DialogStatus> {
        self.state.lock().find(id).map(|e| e.dialog.status)
    }

    /// Check if a dialog is queued
    #[must_use]
    pub fn contains(&self, id: DialogId) -> bool {
        self.state.lock().find(id).is_some()
    }

    /// Ids of queued dialogs, in submission order
    #[must_use]
    pub fn dialog_ids(&self) -> Vec<DialogId> {
        self.state.lock().queue.iter().map(|e| e.dialog.id).collect()
    }

    /// Interface used by the last tick that found one
    #[must_use]
    pub fn bound_interface(&self) -> Option<InterfaceId> {
        self.bound.read().as_ref().map(|h| h.id)
    }

    /// Current counters
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            manage_locks: self.counters.manage_locks.load(Ordering::Relaxed),
            deliveries: self.counters.deliveries.load(Ordering::Relaxed),
            delivery_failures: self.counters.delivery_failures.load(Ordering::Relaxed),
            dialogs_destroyed: self.counters.dialogs_destroyed.load(Ordering::Relaxed),
        }
    }

    fn validate(&self, dialog: &Dialog) -> Result<()> {
        let limit = self.config.max_widgets;
        if limit > 0 && dialog.widget_count() > limit {
            return Err(InteractionError::InvalidDialog(format!(
                "{} widgets (limit: {limit})",
                dialog.widget_count()
            )));
        }
        Ok(())
    }

    /// Insert a dialog, or merge it into the queued dialog with the same id
    ///
    /// Ids are assigned here, under the lock, so concurrent submissions get
    /// strictly increasing ids in the order they enter the queue.
    pub(crate) fn enqueue(
        &self,
        mut dialog: Dialog,
        waiter: Option<oneshot::Sender<Answer>>,
    ) -> Result<DialogId> {
        self.validate(&dialog)?;

        let mut state = self.state.lock();
        if state.destroyed {
            return Err(InteractionError::Allocation(
                "registry has been destroyed".to_string(),
            ));
        }

        if dialog.id.is_assigned() {
            if let Some(entry) = state.find_mut(dialog.id) {
                return Self::resubmit(entry, dialog, waiter);
            }
        }

        let limit = self.config.max_queue_depth;
        if limit > 0 && state.queue.len() >= limit {
            return Err(InteractionError::QueueFull { limit });
        }

        if !dialog.id.is_assigned() {
            dialog.id = state.allocate_id()?;
        }
        // An update for a dialog that is not queued has never been shown
        dialog.status = DialogStatus::New;
        dialog.action = None;
        dialog.answer = None;

        let id = dialog.id;
        tracing::debug!(
            dialog_id = %id,
            kind = %dialog.kind,
            widgets = dialog.widget_count(),
            "Dialog queued"
        );
        state.queue.push(QueueEntry { dialog, waiter });
        self.pending.store(state.queue.len(), Ordering::Release);
        Ok(id)
    }

    fn resubmit(
        entry: &mut QueueEntry,
        mut dialog: Dialog,
        waiter: Option<oneshot::Sender<Answer>>,
    ) -> Result<DialogId> {
        let id = dialog.id;
        if dialog.is_update() {
            entry.dialog.merge_content(dialog);
            entry.dialog.status = status_after_update(entry.dialog.status);
            if waiter.is_some() {
                entry.waiter = waiter;
            }
            tracing::debug!(dialog_id = %id, status = %entry.dialog.status, "Dialog updated");
            Ok(id)
        } else if entry.dialog.status == DialogStatus::Hidden && entry.dialog.reusable {
            dialog.status = DialogStatus::New;
            dialog.action = None;
            dialog.answer = None;
            entry.dialog = dialog;
            entry.waiter = waiter;
            tracing::debug!(dialog_id = %id, "Reusable dialog resubmitted");
            Ok(id)
        } else {
            Err(InteractionError::DuplicateDialog { id })
        }
    }

    /// Change the content of a queued dialog
    ///
    /// The closure edits a copy; identity and lifecycle fields are restored
    /// afterwards and the dialog is marked for an update on the next tick.
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued,
    /// [`InteractionError::InvalidDialog`] if the edit breaks a limit (the
    /// dialog is left unchanged).
    pub fn update<F>(&self, id: DialogId, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Dialog),
    {
        let mut state = self.state.lock();
        let entry = state
            .find_mut(id)
            .ok_or(InteractionError::UnknownDialog { id })?;

        let mut edited = entry.dialog.clone();
        edit(&mut edited);
        self.validate(&edited)?;

        edited.id = entry.dialog.id;
        edited.action = entry.dialog.action;
        edited.answer = entry.dialog.answer.take();
        edited.status = status_after_update(entry.dialog.status);
        entry.dialog = edited;

        tracing::trace!(dialog_id = %id, status = %entry.dialog.status, "Dialog edited");
        Ok(())
    }

    /// Ask for a dialog to be taken off screen
    ///
    /// A dialog that was never presented goes straight to `Hidden`.
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn request_hide(&self, id: DialogId) -> Result<()> {
        let mut state = self.state.lock();
        let entry = state
            .find_mut(id)
            .ok_or(InteractionError::UnknownDialog { id })?;

        match entry.dialog.status {
            DialogStatus::New => entry.dialog.status = DialogStatus::Hidden,
            DialogStatus::Sent | DialogStatus::Updated => {
                entry.dialog.status = DialogStatus::HideRequested;
            }
            DialogStatus::Answered
            | DialogStatus::HideRequested
            | DialogStatus::Hiding
            | DialogStatus::Hidden => {}
        }
        Ok(())
    }

    /// Record the user's answer for a presented dialog
    ///
    /// Answers for dialogs that are not on screen are ignored.
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn record_answer(&self, id: DialogId, answer: Answer) -> Result<()> {
        let mut state = self.state.lock();
        let entry = state
            .find_mut(id)
            .ok_or(InteractionError::UnknownDialog { id })?;

        if entry.dialog.status.is_presented() {
            entry.dialog.answer = Some(answer);
            entry.dialog.status = DialogStatus::Answered;
            tracing::debug!(dialog_id = %id, "Answer recorded");
        } else {
            tracing::debug!(
                dialog_id = %id,
                status = %entry.dialog.status,
                "Ignoring answer for dialog not on screen"
            );
        }
        Ok(())
    }

    /// Record that the interface finished hiding a dialog
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn acknowledge_hidden(&self, id: DialogId) -> Result<()> {
        let mut state = self.state.lock();
        let entry = state
            .find_mut(id)
            .ok_or(InteractionError::UnknownDialog { id })?;

        if entry.dialog.status == DialogStatus::Hiding {
            entry.dialog.status = DialogStatus::Hidden;
        }
        Ok(())
    }

    /// Apply an event reported by an interface
    ///
    /// # Errors
    ///
    /// [`InteractionError::UnknownDialog`] if the dialog is not queued.
    pub fn handle_event(&self, event: InterfaceEvent) -> Result<()> {
        match event {
            InterfaceEvent::Answered { dialog_id, answer } => {
                self.record_answer(dialog_id, answer)
            }
            InterfaceEvent::Hidden { dialog_id } => self.acknowledge_hidden(dialog_id),
        }
    }

    /// Stop waiting on an ask dialog
    ///
    /// The waiter is dropped so no stale answer is handed out, and the dialog
    /// is steered off screen.
    pub(crate) fn abandon(&self, id: DialogId) {
        let mut state = self.state.lock();
        let Some(entry) = state.find_mut(id) else {
            return;
        };
        entry.waiter = None;
        match entry.dialog.status {
            DialogStatus::New => entry.dialog.status = DialogStatus::Hidden,
            DialogStatus::Sent | DialogStatus::Updated => {
                entry.dialog.status = DialogStatus::HideRequested;
            }
            _ => {}
        }
        tracing::debug!(dialog_id = %id, status = %entry.dialog.status, "Ask abandoned");
    }

    /// Run one reconciliation pass
    ///
    /// Returns immediately, without taking the lock, when nothing is queued.
    /// Otherwise resolves the interface and, if one is found, applies one
    /// lifecycle transition per dialog in submission order. Never fails:
    /// refused deliveries are logged and retried on the next tick.
    pub fn manage(&self, directory: &InterfaceDirectory) -> ManageReport {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);
        if self.pending.load(Ordering::Acquire) == 0 {
            return ManageReport::idle();
        }

        let mut state = self.state.lock();
        self.counters.manage_locks.fetch_add(1, Ordering::Relaxed);

        let resolved = binder::resolve(directory)
            .and_then(|handle| handle.upgrade().map(|interface| (handle, interface)));
        let Some((handle, interface)) = resolved else {
            *self.bound.write() = None;
            tracing::debug!(
                pending = state.queue.len(),
                reason = %InteractionError::NoInterfaceBound,
                "Dialogs kept for a later tick"
            );
            return ManageReport::unbound(state.queue.len());
        };

        let optimistic_hide = self.config.optimistic_hide || !handle.capabilities.hide_ack;
        let mut report = ManageReport::processed(handle.id);
        *self.bound.write() = Some(handle);

        state
            .queue
            .retain_mut(|entry| self.step(entry, interface.as_ref(), optimistic_hide, &mut report));

        report.pending = state.queue.len();
        self.pending.store(report.pending, Ordering::Release);
        report
    }

    /// Apply one transition; returns false when the entry must be dropped
    fn step(
        &self,
        entry: &mut QueueEntry,
        interface: &dyn InteractionInterface,
        optimistic_hide: bool,
        report: &mut ManageReport,
    ) -> bool {
        let dialog = &mut entry.dialog;
        match dialog.status {
            DialogStatus::New => {
                self.send(interface, DialogAction::New, dialog, DialogStatus::Sent, report);
            }
            DialogStatus::Updated => {
                self.send(interface, DialogAction::Update, dialog, DialogStatus::Sent, report);
            }
            DialogStatus::Answered => {
                if let Some(waiter) = entry.waiter.take() {
                    let answer = dialog.answer.clone().unwrap_or(Answer::Dismissed);
                    if waiter.send(answer).is_err() {
                        tracing::debug!(dialog_id = %dialog.id, "Ask caller stopped waiting");
                    }
                }
                self.send(interface, DialogAction::Hide, dialog, DialogStatus::Hiding, report);
            }
            DialogStatus::HideRequested => {
                self.send(interface, DialogAction::Hide, dialog, DialogStatus::Hiding, report);
            }
            DialogStatus::Hiding => {
                if optimistic_hide {
                    dialog.status = DialogStatus::Hidden;
                }
            }
            DialogStatus::Hidden => {
                if !dialog.reusable {
                    tracing::debug!(dialog_id = %dialog.id, "Destroying dialog");
                    self.counters.dialogs_destroyed.fetch_add(1, Ordering::Relaxed);
                    report.removed += 1;
                    return false;
                }
            }
            DialogStatus::Sent => {}
        }
        true
    }

    fn send(
        &self,
        interface: &dyn InteractionInterface,
        action: DialogAction,
        dialog: &mut Dialog,
        next: DialogStatus,
        report: &mut ManageReport,
    ) {
        let previous_action = dialog.action.replace(action);
        match interface.deliver(action, dialog) {
            Ok(()) => {
                tracing::debug!(
                    dialog_id = %dialog.id,
                    action = %action,
                    interface = interface.name(),
                    widgets = dialog.widget_count(),
                    "Dialog delivered"
                );
                dialog.status = next;
                report.delivered += 1;
                self.counters.deliveries.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::warn!(
                    dialog_id = %dialog.id,
                    action = %action,
                    interface = interface.name(),
                    error = %e,
                    "Delivery failed, retrying next tick"
                );
                dialog.action = previous_action;
                report.failed += 1;
                self.counters.delivery_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Release every queued dialog
    ///
    /// Callers blocked on an ask are woken with a cancellation. Later
    /// submissions are rejected. Must run once, with no other registry
    /// operation in flight.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        debug_assert!(!state.destroyed, "interaction registry destroyed twice");
        if state.destroyed {
            return;
        }
        state.destroyed = true;

        let dropped = state.queue.len();
        let waiting = state.queue.iter().filter(|e| e.waiter.is_some()).count();
        state.queue.clear();
        self.pending.store(0, Ordering::Release);
        *self.bound.write() = None;

        tracing::info!(
            dropped = dropped,
            waiting = waiting,
            "Interaction system destroyed"
        );
    }
}

impl std::fmt::Debug for InteractionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionRegistry")
            .field("pending", &self.len())
            .field("bound_interface", &self.bound_interface())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dialog::{DialogKind, PredefinedDialog};
    use crate::test_utils::{recording_directory, RecordingInterface};
    use crate::widget::Widget;

    fn registry() -> InteractionRegistry {
        InteractionRegistry::new(BrokerConfig::default())
    }

    #[test]
    fn test_first_id_follows_predefined_range() {
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "disk full"), None).unwrap();
        assert_eq!(id, DialogId::new(DIALOG_LAST_PREDEFINED + 1));

        let next = registry.enqueue(Dialog::fatal("Error", "again"), None).unwrap();
        assert_eq!(next, DialogId::new(DIALOG_LAST_PREDEFINED + 2));
    }

    #[test]
    fn test_allocation_skips_explicit_ids() {
        let registry = registry();
        let explicit = DialogId::new(DIALOG_LAST_PREDEFINED + 1);
        registry
            .enqueue(Dialog::fatal("Error", "x").with_id(explicit), None)
            .unwrap();

        let id = registry.enqueue(Dialog::fatal("Error", "y"), None).unwrap();
        assert_eq!(id, DialogId::new(DIALOG_LAST_PREDEFINED + 2));
    }

    #[test]
    fn test_duplicate_rejected_queue_unchanged() {
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "first"), None).unwrap();

        let result = registry.enqueue(Dialog::fatal("Other", "second").with_id(id), None);
        assert_eq!(result, Err(InteractionError::DuplicateDialog { id }));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.dialog(id).unwrap().widgets,
            vec![Widget::text("first")]
        );
    }

    #[test]
    fn test_explicit_update_merges() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry
            .enqueue(Dialog::progress("Download", "start", 0), None)
            .unwrap();
        registry.manage(&directory);
        assert_eq!(registry.status(id), Some(DialogStatus::Sent));

        registry
            .enqueue(Dialog::progress("Download", "half", 50).with_id(id).as_update(), None)
            .unwrap();
        assert_eq!(registry.status(id), Some(DialogStatus::Updated));
        assert_eq!(registry.len(), 1);

        registry.manage(&directory);
        assert_eq!(registry.status(id), Some(DialogStatus::Sent));
        assert_eq!(interface.actions(), vec![DialogAction::New, DialogAction::Update]);
    }

    #[test]
    fn test_update_before_presentation_is_sent_as_update() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry.enqueue(Dialog::progress("Scan", "a", 0), None).unwrap();
        registry.update(id, |d| d.set_progress(30)).unwrap();

        let dialog = registry.dialog(id).unwrap();
        assert_eq!(dialog.status, DialogStatus::Updated);
        assert_eq!(dialog.progress_percent(), Some(30));

        registry.manage(&directory);
        assert_eq!(interface.actions(), vec![DialogAction::Update]);
        assert_eq!(registry.status(id), Some(DialogStatus::Sent));
    }

    #[test]
    fn test_update_keeps_closing_status() {
        let (directory, _interface) = recording_directory();
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "a"), None).unwrap();
        registry.manage(&directory);
        registry.request_hide(id).unwrap();

        registry.update(id, |d| d.title = Some("Late".to_string())).unwrap();
        let dialog = registry.dialog(id).unwrap();
        assert_eq!(dialog.status, DialogStatus::HideRequested);
        assert_eq!(dialog.title.as_deref(), Some("Late"));
    }

    #[test]
    fn test_update_cannot_change_identity() {
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();
        registry
            .update(id, |d| {
                d.id = DialogId::new(999);
                d.status = DialogStatus::Hidden;
            })
            .unwrap();

        assert_eq!(registry.dialog_ids(), vec![id]);
        assert_eq!(registry.status(id), Some(DialogStatus::Updated));
    }

    #[test]
    fn test_update_over_widget_limit_is_rejected() {
        let registry = InteractionRegistry::new(BrokerConfig {
            max_widgets: 2,
            ..BrokerConfig::default()
        });
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();

        let result = registry.update(id, |d| {
            d.widgets.push(Widget::text("y"));
            d.widgets.push(Widget::text("z"));
        });
        assert!(matches!(result, Err(InteractionError::InvalidDialog(_))));
        assert_eq!(registry.dialog(id).unwrap().widget_count(), 1);
    }

    #[test]
    fn test_update_unknown_dialog() {
        let registry = registry();
        let id = DialogId::new(77);
        assert_eq!(
            registry.update(id, |_| {}),
            Err(InteractionError::UnknownDialog { id })
        );
    }

    #[test]
    fn test_queue_depth_limit() {
        let registry = InteractionRegistry::new(BrokerConfig {
            max_queue_depth: 1,
            ..BrokerConfig::default()
        });
        registry.enqueue(Dialog::fatal("a", "a"), None).unwrap();
        assert_eq!(
            registry.enqueue(Dialog::fatal("b", "b"), None),
            Err(InteractionError::QueueFull { limit: 1 })
        );
    }

    #[test]
    fn test_new_dialog_delivered_once() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "disk full"), None).unwrap();

        let report = registry.manage(&directory);
        assert_eq!(report.outcome, ManageOutcome::Processed);
        assert_eq!(report.delivered, 1);
        assert_eq!(registry.status(id), Some(DialogStatus::Sent));

        registry.manage(&directory);
        let deliveries = interface.deliveries();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].0, DialogAction::New);
        assert_eq!(deliveries[0].1.id, id);
        assert_eq!(deliveries[0].1.widgets, vec![Widget::text("disk full")]);
    }

    #[test]
    fn test_answered_dialog_hidden_then_removed() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();
        registry.manage(&directory);

        registry
            .record_answer(id, Answer::Button("Ok".to_string()))
            .unwrap();
        registry.manage(&directory);
        assert_eq!(registry.status(id), Some(DialogStatus::Hiding));
        assert_eq!(interface.actions(), vec![DialogAction::New, DialogAction::Hide]);

        registry.manage(&directory);
        assert_eq!(registry.status(id), Some(DialogStatus::Hidden));

        let report = registry.manage(&directory);
        assert_eq!(report.removed, 1);
        assert!(registry.is_empty());
        assert_eq!(registry.stats().dialogs_destroyed, 1);
        assert_eq!(interface.actions().len(), 2);
    }

    #[test]
    fn test_reusable_hidden_dialog_is_retained_and_resubmittable() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry
            .enqueue(Dialog::progress("Download", "x", 10), None)
            .unwrap();
        registry.manage(&directory);
        registry.request_hide(id).unwrap();
        for _ in 0..4 {
            registry.manage(&directory);
        }
        assert_eq!(registry.status(id), Some(DialogStatus::Hidden));

        registry
            .enqueue(Dialog::progress("Download", "again", 0).with_id(id), None)
            .unwrap();
        assert_eq!(registry.status(id), Some(DialogStatus::New));
        registry.manage(&directory);
        assert_eq!(
            interface.actions(),
            vec![DialogAction::New, DialogAction::Hide, DialogAction::New]
        );
    }

    #[test]
    fn test_hide_request_before_presentation_skips_interface() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();
        registry.request_hide(id).unwrap();

        registry.manage(&directory);
        assert!(registry.is_empty());
        assert!(interface.actions().is_empty());
    }

    #[test]
    fn test_idle_manage_takes_no_lock() {
        let (directory, interface) = recording_directory();
        let registry = registry();

        let report = registry.manage(&directory);
        assert_eq!(report, ManageReport::idle());
        assert_eq!(registry.stats().manage_locks, 0);
        assert_eq!(registry.stats().ticks, 1);
        assert!(interface.actions().is_empty());
    }

    #[test]
    fn test_unbound_manage_changes_nothing() {
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();

        let report = registry.manage(&InterfaceDirectory::new());
        assert_eq!(report.outcome, ManageOutcome::Unbound);
        assert_eq!(report.status(), Err(InteractionError::NoInterfaceBound));
        assert_eq!(registry.status(id), Some(DialogStatus::New));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.bound_interface(), None);
    }

    #[test]
    fn test_failed_delivery_is_retried() {
        let (directory, interface) = recording_directory();
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();

        interface.set_failing(true);
        let report = registry.manage(&directory);
        assert_eq!(report.failed, 1);
        assert_eq!(registry.status(id), Some(DialogStatus::New));
        assert_eq!(registry.dialog(id).unwrap().action, None);

        interface.set_failing(false);
        registry.manage(&directory);
        assert_eq!(registry.status(id), Some(DialogStatus::Sent));
        assert_eq!(registry.dialog(id).unwrap().action, Some(DialogAction::New));
        assert_eq!(registry.stats().delivery_failures, 1);
    }

    #[test]
    fn test_hide_waits_for_ack_when_not_optimistic() {
        let (directory, interface) = recording_directory();
        let registry = InteractionRegistry::new(BrokerConfig {
            optimistic_hide: false,
            ..BrokerConfig::default()
        });
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();
        registry.manage(&directory);
        registry.request_hide(id).unwrap();
        registry.manage(&directory);

        for _ in 0..3 {
            registry.manage(&directory);
        }
        assert_eq!(registry.status(id), Some(DialogStatus::Hiding));

        registry
            .handle_event(InterfaceEvent::Hidden { dialog_id: id })
            .unwrap();
        registry.manage(&directory);
        assert!(registry.is_empty());
        assert_eq!(interface.actions(), vec![DialogAction::New, DialogAction::Hide]);
    }

    #[test]
    fn test_answer_ignored_when_not_presented() {
        let registry = registry();
        let id = registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();
        registry.record_answer(id, Answer::Dismissed).unwrap();
        assert_eq!(registry.status(id), Some(DialogStatus::New));
    }

    #[test]
    fn test_answer_reaches_waiter_once() {
        let (directory, _interface) = recording_directory();
        let registry = registry();
        let (tx, mut rx) = oneshot::channel();
        let dialog = Dialog::question("Confirm", "Overwrite?", ["Yes", "No"]);
        let id = registry.enqueue(dialog, Some(tx)).unwrap();
        registry.manage(&directory);

        registry
            .record_answer(id, Answer::Button("Yes".to_string()))
            .unwrap();
        registry.manage(&directory);

        assert_eq!(rx.try_recv(), Ok(Answer::Button("Yes".to_string())));
        assert_eq!(registry.status(id), Some(DialogStatus::Hiding));
    }

    #[test]
    fn test_destroy_cancels_waiters_and_rejects_submissions() {
        let registry = registry();
        let (tx, mut rx) = oneshot::channel();
        registry
            .enqueue(Dialog::question("Q", "?", ["Yes"]), Some(tx))
            .unwrap();
        registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();

        registry.destroy();
        assert!(registry.is_destroyed());
        assert!(registry.is_empty());
        assert!(matches!(
            rx.try_recv(),
            Err(oneshot::error::TryRecvError::Closed)
        ));
        assert!(matches!(
            registry.enqueue(Dialog::fatal("Error", "late"), None),
            Err(InteractionError::Allocation(_))
        ));
    }

    #[test]
    fn test_predefined_dialog_can_be_submitted_by_id() {
        let registry = registry();
        let id = registry
            .enqueue(
                Dialog::new(DialogKind::Error).with_id(PredefinedDialog::NoCodec),
                None,
            )
            .unwrap();
        assert_eq!(id, DialogId::from(PredefinedDialog::NoCodec));
    }

    #[test]
    fn test_bound_interface_is_recorded() {
        let (directory, _interface) = recording_directory();
        let registry = registry();
        registry.enqueue(Dialog::fatal("Error", "x"), None).unwrap();
        let report = registry.manage(&directory);
        assert_eq!(registry.bound_interface(), report.interface);
        assert!(registry.bound_interface().is_some());

        let ids = directory.interface_ids();
        directory.detach(&ids[0]);
        registry.manage(&directory);
        assert_eq!(registry.bound_interface(), None);
    }
}
