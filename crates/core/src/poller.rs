//! Per-form unread-count polling.
//!
//! Each attached form gets its own task: one immediate fetch, then one fetch
//! per interval until detached. A detach cancels the task's token while
//! holding the count table's lock, and a tick only writes under that same
//! lock after checking its token, so no result can land after detachment.

use crate::collaborators::MessagingDirectory;
use crate::form::FormId;
use crate::view::UnreadBadge;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Prevents a misconfigured interval from turning into a busy loop.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Last fetched unread count per attached form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadCounts(HashMap<FormId, u32>);

impl UnreadCounts {
    /// Last known count, `0` if nothing was fetched yet.
    pub fn get(&self, form_id: FormId) -> u32 {
        self.0.get(&form_id).copied().unwrap_or(0)
    }

    pub fn badge(&self, form_id: FormId) -> UnreadBadge {
        UnreadBadge::from_count(self.get(form_id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Handle returned by [`UnreadCountPoller::start`]; pass it back to `stop`.
#[derive(Debug)]
pub struct PollToken {
    form_id: FormId,
    attachment: u64,
    cancel: CancellationToken,
}

impl PollToken {
    pub fn form_id(&self) -> FormId {
        self.form_id
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

struct PollTask {
    attachment: u64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Running tasks plus the shut-down latch, guarded by one lock.
#[derive(Default)]
struct TaskTable {
    active: HashMap<FormId, PollTask>,
    shut_down: bool,
}

pub struct UnreadCountPoller {
    messaging: Arc<dyn MessagingDirectory>,
    interval: Duration,
    counts: Arc<watch::Sender<UnreadCounts>>,
    tasks: Mutex<TaskTable>,
    next_attachment: AtomicU64,
}

impl UnreadCountPoller {
    pub fn new(messaging: Arc<dyn MessagingDirectory>, interval: Duration) -> Self {
        let (counts, _) = watch::channel(UnreadCounts::default());
        Self {
            messaging,
            interval: interval.max(MIN_POLL_INTERVAL),
            counts: Arc::new(counts),
            tasks: Mutex::new(TaskTable::default()),
            next_attachment: AtomicU64::new(1),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<UnreadCounts> {
        self.counts.subscribe()
    }

    pub fn counts(&self) -> UnreadCounts {
        self.counts.borrow().clone()
    }

    pub fn is_attached(&self, form_id: FormId) -> bool {
        self.lock_tasks().active.contains_key(&form_id)
    }

    /// Whether [`shut_down`](Self::shut_down) was called.
    pub fn is_shut_down(&self) -> bool {
        self.lock_tasks().shut_down
    }

    /// Currently polled forms, in ascending id order.
    pub fn attached(&self) -> Vec<FormId> {
        let mut ids: Vec<FormId> = self.lock_tasks().active.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Starts polling `form_id`, replacing any existing attachment for it.
    ///
    /// After shut-down the returned token is already cancelled and nothing is polled.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, form_id: FormId) -> PollToken {
        let mut tasks = self.lock_tasks();
        if tasks.shut_down {
            let cancel = CancellationToken::new();
            cancel.cancel();
            return PollToken {
                form_id,
                attachment: 0,
                cancel,
            };
        }
        if let Some(previous) = tasks.active.remove(&form_id) {
            self.cancel_task(form_id, previous);
        }
        let token = self.spawn_task(form_id, &mut tasks.active);
        tracing::debug!(%form_id, attachment = token.attachment, "unread polling started");
        token
    }

    /// Stops the attachment `token` belongs to. Tokens of replaced attachments are no-ops.
    pub fn stop(&self, token: PollToken) {
        let mut tasks = self.lock_tasks();
        let current = tasks
            .active
            .get(&token.form_id)
            .is_some_and(|task| task.attachment == token.attachment);
        if current {
            if let Some(task) = tasks.active.remove(&token.form_id) {
                self.cancel_task(token.form_id, task);
            }
        } else {
            token.cancel.cancel();
        }
    }

    /// Starts polling `form_id` unless it is already polled or the poller is shut down.
    /// Returns whether a task was started.
    pub fn attach(&self, form_id: FormId) -> bool {
        let mut tasks = self.lock_tasks();
        if tasks.shut_down || tasks.active.contains_key(&form_id) {
            return false;
        }
        let token = self.spawn_task(form_id, &mut tasks.active);
        tracing::debug!(%form_id, attachment = token.attachment, "unread polling attached");
        true
    }

    /// Stops polling `form_id`. Returns whether it was attached.
    pub fn detach(&self, form_id: FormId) -> bool {
        let task = self.lock_tasks().active.remove(&form_id);
        match task {
            Some(task) => {
                self.cancel_task(form_id, task);
                true
            }
            None => false,
        }
    }

    /// Makes the attached set equal to `visible`: detaches the rest, attaches what is missing.
    /// Does nothing after shut-down.
    pub fn sync_visible(&self, visible: &[FormId]) {
        let visible: HashSet<FormId> = visible.iter().copied().collect();
        let mut tasks = self.lock_tasks();
        if tasks.shut_down {
            return;
        }

        let gone: Vec<FormId> = tasks
            .active
            .keys()
            .filter(|form_id| !visible.contains(form_id))
            .copied()
            .collect();
        for form_id in gone {
            if let Some(task) = tasks.active.remove(&form_id) {
                self.cancel_task(form_id, task);
            }
        }

        for form_id in visible {
            if !tasks.active.contains_key(&form_id) {
                self.spawn_task(form_id, &mut tasks.active);
            }
        }
        tracing::debug!(attached = tasks.active.len(), "unread polling synced to visible forms");
    }

    pub fn stop_all(&self) {
        let mut tasks = self.lock_tasks();
        self.cancel_all(&mut tasks);
    }

    /// Stops every task and refuses new ones from now on.
    pub fn shut_down(&self) {
        let mut tasks = self.lock_tasks();
        tasks.shut_down = true;
        self.cancel_all(&mut tasks);
    }

    fn cancel_all(&self, tasks: &mut TaskTable) {
        if tasks.active.is_empty() {
            return;
        }
        let stopped = tasks.active.len();
        for (form_id, task) in tasks.active.drain() {
            self.cancel_task(form_id, task);
        }
        tracing::debug!(stopped, "unread polling stopped for all forms");
    }

    fn spawn_task(&self, form_id: FormId, active: &mut HashMap<FormId, PollTask>) -> PollToken {
        let attachment = self.next_attachment.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_unread(
            Arc::clone(&self.messaging),
            Arc::clone(&self.counts),
            form_id,
            self.interval,
            cancel.clone(),
        ));
        active.insert(
            form_id,
            PollTask {
                attachment,
                cancel: cancel.clone(),
                handle,
            },
        );
        PollToken {
            form_id,
            attachment,
            cancel,
        }
    }

    fn cancel_task(&self, form_id: FormId, task: PollTask) {
        self.counts.send_if_modified(|counts| {
            task.cancel.cancel();
            counts.0.remove(&form_id).is_some()
        });
        task.handle.abort();
        tracing::debug!(%form_id, attachment = task.attachment, "unread polling detached");
    }

    fn lock_tasks(&self) -> MutexGuard<'_, TaskTable> {
        self.tasks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for UnreadCountPoller {
    fn drop(&mut self) {
        self.shut_down();
    }
}

async fn poll_unread(
    messaging: Arc<dyn MessagingDirectory>,
    counts: Arc<watch::Sender<UnreadCounts>>,
    form_id: FormId,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = messaging.count_unread(form_id) => result,
        };

        match result {
            Ok(count) => {
                counts.send_if_modified(|counts| {
                    if cancel.is_cancelled() {
                        return false;
                    }
                    counts.0.insert(form_id, count);
                    true
                });
            }
            Err(err) => {
                tracing::warn!(%form_id, error = %err, "error checking unread messages");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::test_support::ScriptedMessaging;

    const INTERVAL: Duration = Duration::from_secs(30);

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_every_interval() {
        let messaging = Arc::new(ScriptedMessaging::new());
        messaging.script(7, vec![Ok(2)]);
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);

        let _token = poller.start(FormId(7));
        settle().await;
        assert_eq!(messaging.calls(7), 1);
        assert_eq!(poller.counts().get(FormId(7)), 2);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(messaging.calls(7), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(messaging.calls(7), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_count_above_nine_renders_overflow_badge() {
        let messaging = Arc::new(ScriptedMessaging::new());
        messaging.script(7, vec![Ok(12)]);
        let poller = UnreadCountPoller::new(messaging, INTERVAL);

        poller.attach(FormId(7));
        settle().await;

        assert_eq!(poller.counts().get(FormId(7)), 12);
        assert_eq!(poller.counts().badge(FormId(7)).label().as_deref(), Some("9+"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_keeps_last_count_and_schedule() {
        let messaging = Arc::new(ScriptedMessaging::new());
        messaging.script(
            3,
            vec![
                Ok(4),
                Err(FetchError::Transient("timeout".into())),
                Ok(5),
            ],
        );
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);

        poller.attach(FormId(3));
        settle().await;
        assert_eq!(poller.counts().get(FormId(3)), 4);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(messaging.calls(3), 2);
        assert_eq!(poller.counts().get(FormId(3)), 4);
        assert!(poller.is_attached(FormId(3)));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(messaging.calls(3), 3);
        assert_eq!(poller.counts().get(FormId(3)), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_ends_fetches_for_that_form() {
        let messaging = Arc::new(ScriptedMessaging::new());
        messaging.script(1, vec![Ok(1)]);
        messaging.script(2, vec![Ok(2)]);
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);

        let first = poller.start(FormId(1));
        let _second = poller.start(FormId(2));
        settle().await;

        poller.stop(first);
        assert!(!poller.is_attached(FormId(1)));
        assert_eq!(poller.counts().get(FormId(1)), 0);

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(messaging.calls(1), 1);
        assert_eq!(messaging.calls(2), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_is_dropped_after_detach() {
        let messaging = Arc::new(ScriptedMessaging::with_delay(Duration::from_secs(10)));
        messaging.script(5, vec![Ok(8)]);
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);
        let mut changes = poller.subscribe();

        poller.attach(FormId(5));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(messaging.calls(5), 1);

        assert!(poller.detach(FormId(5)));
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(messaging.calls(5), 1);
        assert!(!changes.has_changed().unwrap());
        assert!(changes.borrow_and_update().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_token_does_not_stop_replacement() {
        let messaging = Arc::new(ScriptedMessaging::new());
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);

        let old = poller.start(FormId(4));
        let _new = poller.start(FormId(4));
        assert!(old.is_cancelled());

        poller.stop(old);
        assert!(poller.is_attached(FormId(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sync_visible_detaches_removed_forms() {
        let messaging = Arc::new(ScriptedMessaging::new());
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);

        poller.sync_visible(&[FormId(1), FormId(2), FormId(3)]);
        settle().await;
        poller.sync_visible(&[FormId(3), FormId(4)]);
        settle().await;

        assert_eq!(poller.attached(), vec![FormId(3), FormId(4)]);
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(messaging.calls(1), 1);
        assert_eq!(messaging.calls(3), 2);
        assert_eq!(messaging.calls(4), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_is_idempotent() {
        let messaging = Arc::new(ScriptedMessaging::new());
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);

        assert!(poller.attach(FormId(9)));
        assert!(!poller.attach(FormId(9)));
        settle().await;

        assert_eq!(messaging.calls(9), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_every_task() {
        let messaging = Arc::new(ScriptedMessaging::new());
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);
        poller.sync_visible(&[FormId(1), FormId(2)]);
        settle().await;

        drop(poller);
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(messaging.calls(1), 1);
        assert_eq!(messaging.calls(2), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shut_down_refuses_new_tasks() {
        let messaging = Arc::new(ScriptedMessaging::new());
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);
        poller.sync_visible(&[FormId(1)]);
        settle().await;

        poller.shut_down();
        assert!(poller.is_shut_down());
        poller.sync_visible(&[FormId(1), FormId(2)]);
        assert!(!poller.attach(FormId(3)));
        let token = poller.start(FormId(4));
        assert!(token.is_cancelled());

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert!(poller.attached().is_empty());
        assert_eq!(messaging.calls(1), 1);
        assert_eq!(messaging.calls(2), 0);
        assert_eq!(messaging.calls(3), 0);
        assert_eq!(messaging.calls(4), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_still_allows_new_tasks() {
        let messaging = Arc::new(ScriptedMessaging::new());
        let poller = UnreadCountPoller::new(messaging.clone(), INTERVAL);
        poller.sync_visible(&[FormId(1)]);

        poller.stop_all();
        assert!(poller.attach(FormId(1)));
        assert!(!poller.is_shut_down());
    }
}
