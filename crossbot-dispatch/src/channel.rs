//! One outbound queue per destination.
//!
//! Tasks run strictly FIFO on a single worker that is spawned lazily on
//! enqueue and exits when the queue drains. Between tasks the worker sleeps
//! an adaptive delay computed from a sliding window of recent call times.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::time::Instant;
use tracing::{debug, warn};

use crossbot_core::{DestinationId, MessageRef, PlatformClient, RateLimit, SendOptions, SentMessage};

/// Invoked with the sent message once a queued send/edit actually completes.
pub type SentCallback = Box<dyn FnOnce(SentMessage) + Send + 'static>;

type QueuedTask = BoxFuture<'static, ()>;

/// The delay to sleep after a call, given how many calls landed inside the
/// current rate window. With an empty history this is zero; at the ceiling it
/// is twice the steady-state interval, trading throughput for safety margin.
pub fn adaptive_delay(recent_calls: u32, limit: RateLimit) -> Duration {
    let avg_ms = limit.window.as_millis() as u64 / u64::from(limit.max_calls.max(1));
    let sleep_ms = avg_ms * 2 * u64::from(recent_calls) / u64::from(limit.max_calls.max(1));
    Duration::from_millis(sleep_ms)
}

struct Inner {
    destination: DestinationId,
    client: Arc<dyn PlatformClient>,
    limit: RateLimit,
    queue: Mutex<VecDeque<QueuedTask>>,
    sent_at: Mutex<VecDeque<Instant>>,
    worker_active: AtomicBool,
    stopping: AtomicBool,
}

/// FIFO outbound queue for one destination. Cheap to clone; all clones share
/// the queue. Safe for many enqueuing producers; exactly one worker consumes
/// at a time. Never shared across destinations.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<Inner>,
}

impl Channel {
    pub fn new(client: Arc<dyn PlatformClient>, destination: DestinationId) -> Self {
        let limit = client.rate_limit();
        Self {
            inner: Arc::new(Inner {
                destination,
                client,
                limit,
                queue: Mutex::new(VecDeque::new()),
                sent_at: Mutex::new(VecDeque::new()),
                worker_active: AtomicBool::new(false),
                stopping: AtomicBool::new(false),
            }),
        }
    }

    pub fn destination(&self) -> &DestinationId {
        &self.inner.destination
    }

    /// Marks the destination stopping: the worker drains no further tasks and
    /// exits without rescheduling. Used when the destination's identity
    /// becomes invalid.
    pub fn stop(&self) {
        self.inner.stopping.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.inner.stopping.load(Ordering::SeqCst)
    }

    /// Sends a text message through the queue. A rejected send that carried a
    /// reply reference is re-queued once without it (the referenced message
    /// may have been deleted, or predates a restart).
    pub fn send(
        &self,
        text: String,
        reply_to: Option<String>,
        buttons: Option<Vec<String>>,
        disable_notification: bool,
        callback: Option<SentCallback>,
    ) {
        let channel = self.clone();
        self.enqueue(
            async move {
                let options = SendOptions {
                    reply_to: reply_to.clone(),
                    buttons: buttons.clone(),
                    disable_notification,
                };
                let inner = &channel.inner;
                match inner
                    .client
                    .send_message(&inner.destination, &text, options)
                    .await
                {
                    Ok(sent) => {
                        if let Some(callback) = callback {
                            callback(sent);
                        }
                    }
                    Err(err) if reply_to.is_some() => {
                        warn!(
                            destination = %inner.destination,
                            error = %err,
                            "send with reply reference rejected, retrying without it"
                        );
                        channel.send(text, None, buttons, disable_notification, callback);
                    }
                    Err(err) => {
                        warn!(destination = %inner.destination, error = %err, "send failed");
                    }
                }
            }
            .boxed(),
        );
    }

    /// Edits an already-sent message. When the edit target is gone the text is
    /// re-queued as a fresh message instead.
    pub fn edit(&self, message_id: String, text: String, callback: Option<SentCallback>) {
        let channel = self.clone();
        self.enqueue(
            async move {
                let message = channel.message_ref(&message_id);
                match channel.inner.client.edit_message(&message, &text).await {
                    Ok(sent) => {
                        if let Some(callback) = callback {
                            callback(sent);
                        }
                    }
                    Err(err) => {
                        warn!(
                            destination = %channel.inner.destination,
                            error = %err,
                            "edit target gone, sending a new message instead"
                        );
                        channel.send(text, None, None, false, callback);
                    }
                }
            }
            .boxed(),
        );
    }

    /// Deletes a message. Failures are logged and dropped.
    pub fn delete(&self, message_id: String) {
        let channel = self.clone();
        self.enqueue(
            async move {
                let message = channel.message_ref(&message_id);
                if let Err(err) = channel.inner.client.delete_message(&message).await {
                    debug!(destination = %channel.inner.destination, error = %err, "delete failed");
                }
            }
            .boxed(),
        );
    }

    /// Shows a typing indicator.
    pub fn typing(&self) {
        let channel = self.clone();
        self.enqueue(
            async move {
                let inner = &channel.inner;
                if let Err(err) = inner.client.show_typing(&inner.destination).await {
                    debug!(destination = %inner.destination, error = %err, "typing failed");
                }
            }
            .boxed(),
        );
    }

    /// Pins a message.
    pub fn pin(&self, message_id: String, notify: bool) {
        let channel = self.clone();
        self.enqueue(
            async move {
                let message = channel.message_ref(&message_id);
                if let Err(err) = channel.inner.client.pin_message(&message, notify).await {
                    debug!(destination = %channel.inner.destination, error = %err, "pin failed");
                }
            }
            .boxed(),
        );
    }

    /// Unpins a message.
    pub fn unpin(&self, message_id: String) {
        let channel = self.clone();
        self.enqueue(
            async move {
                let message = channel.message_ref(&message_id);
                if let Err(err) = channel.inner.client.unpin_message(&message).await {
                    debug!(destination = %channel.inner.destination, error = %err, "unpin failed");
                }
            }
            .boxed(),
        );
    }

    fn message_ref(&self, message_id: &str) -> MessageRef {
        MessageRef {
            destination: self.inner.destination.clone(),
            id: message_id.to_string(),
        }
    }

    /// Appends a task and starts a worker if none is active.
    fn enqueue(&self, task: QueuedTask) {
        self.inner.queue.lock().unwrap().push_back(task);
        self.spawn_worker_if_idle();
    }

    fn spawn_worker_if_idle(&self) {
        if self
            .inner
            .worker_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let channel = self.clone();
            tokio::spawn(async move {
                channel.run_worker().await;
            });
        }
    }

    /// Empties the queue, one task at a time, sleeping the adaptive delay
    /// after each call. Exits when the queue drains or the destination is
    /// stopping; a fresh worker is created lazily on the next enqueue.
    async fn run_worker(&self) {
        loop {
            if self.is_stopping() {
                break;
            }
            let task = self.inner.queue.lock().unwrap().pop_front();
            let Some(task) = task else {
                break;
            };
            task.await;
            let delay = self.record_call();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        self.inner.worker_active.store(false, Ordering::SeqCst);
        // An enqueue may have raced the exit; make sure its task is not stranded.
        if !self.is_stopping() && !self.inner.queue.lock().unwrap().is_empty() {
            self.spawn_worker_if_idle();
        }
    }

    /// Records a completed call and computes the next delay from the pruned
    /// sliding window.
    fn record_call(&self) -> Duration {
        let mut sent_at = self.inner.sent_at.lock().unwrap();
        sent_at.push_back(Instant::now());
        while sent_at
            .front()
            .is_some_and(|t| t.elapsed() > self.inner.limit.window)
        {
            sent_at.pop_front();
        }
        // the window record is bounded by the ceiling itself
        while sent_at.len() > self.inner.limit.max_calls as usize {
            sent_at.pop_front();
        }
        adaptive_delay(sent_at.len() as u32, self.inner.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(window_secs: u64, max_calls: u32) -> RateLimit {
        RateLimit {
            window: Duration::from_secs(window_secs),
            max_calls,
        }
    }

    #[test]
    fn test_adaptive_delay_idle_is_zero() {
        assert_eq!(adaptive_delay(0, limit(60, 20)), Duration::ZERO);
    }

    #[test]
    fn test_adaptive_delay_saturated_is_twice_steady_state() {
        // steady state: 60s / 20 calls = 3s per call; saturated: 6s
        assert_eq!(adaptive_delay(20, limit(60, 20)), Duration::from_secs(6));
    }

    #[test]
    fn test_adaptive_delay_halfway() {
        // 10 of 20 in the window: exactly the steady-state interval
        assert_eq!(adaptive_delay(10, limit(60, 20)), Duration::from_secs(3));
    }

    #[test]
    fn test_adaptive_delay_zero_ceiling_does_not_divide_by_zero() {
        assert_eq!(adaptive_delay(0, limit(60, 0)), Duration::ZERO);
    }
}
