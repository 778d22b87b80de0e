//! Integration tests for [`crossbot_dispatch::Channel`].
//!
//! Covers: FIFO exactly-once execution, the stopping flag, lazy worker
//! re-creation, sent-callbacks, retry-without-reference, and the
//! edit-falls-back-to-send path. Time is paused so pacing sleeps cost nothing.

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbot_dispatch::Channel;
use crossbot_core::DestinationId;

use common::MockClient;

fn destination() -> DestinationId {
    DestinationId("chat-1".to_string())
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..2000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

/// **Test: N enqueued sends execute exactly once each, in enqueue order.**
///
/// **Setup:** One channel, 10 sends "msg-0".."msg-9".
/// **Action:** Enqueue all, wait for the queue to drain.
/// **Expected:** Client saw exactly 10 sends, in order.
#[tokio::test(start_paused = true)]
async fn test_fifo_exactly_once_in_order() {
    let client = Arc::new(MockClient::new());
    let channel = Channel::new(client.clone(), destination());

    for i in 0..10 {
        channel.send(format!("msg-{i}"), None, None, false, None);
    }

    wait_until(|| client.sends.lock().unwrap().len() == 10).await;
    // settle: no task may run twice
    tokio::time::sleep(Duration::from_secs(5)).await;

    let texts = client.sent_texts();
    let expected: Vec<String> = (0..10).map(|i| format!("msg-{i}")).collect();
    assert_eq!(texts, expected);
}

/// **Test: a stopping channel drains no further tasks.**
///
/// **Setup:** Channel marked stopping before anything is enqueued.
/// **Action:** Enqueue 3 sends, let time pass.
/// **Expected:** The client never sees a send.
#[tokio::test(start_paused = true)]
async fn test_stopping_channel_executes_nothing() {
    let client = Arc::new(MockClient::new());
    let channel = Channel::new(client.clone(), destination());

    channel.stop();
    for i in 0..3 {
        channel.send(format!("late-{i}"), None, None, false, None);
    }

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(client.sends.lock().unwrap().is_empty());
    assert!(channel.is_stopping());
}

/// **Test: the worker exits on drain and a fresh one picks up later enqueues.**
///
/// **Setup:** One send, drained; then another send.
/// **Action:** Enqueue, wait, enqueue again, wait.
/// **Expected:** Both sends executed.
#[tokio::test(start_paused = true)]
async fn test_worker_recreated_after_drain() {
    let client = Arc::new(MockClient::new());
    let channel = Channel::new(client.clone(), destination());

    channel.send("first".to_string(), None, None, false, None);
    wait_until(|| client.sends.lock().unwrap().len() == 1).await;

    // give the worker time to notice the empty queue and exit
    tokio::time::sleep(Duration::from_secs(5)).await;

    channel.send("second".to_string(), None, None, false, None);
    wait_until(|| client.sends.lock().unwrap().len() == 2).await;

    assert_eq!(client.sent_texts(), vec!["first", "second"]);
}

/// **Test: the sent-callback runs with the message the platform returned.**
#[tokio::test(start_paused = true)]
async fn test_callback_receives_sent_message() {
    let client = Arc::new(MockClient::new());
    let channel = Channel::new(client.clone(), destination());

    let seen = Arc::new(Mutex::new(None));
    let seen_clone = seen.clone();
    channel.send(
        "hello".to_string(),
        None,
        None,
        false,
        Some(Box::new(move |sent| {
            *seen_clone.lock().unwrap() = Some(sent.message.id);
        })),
    );

    wait_until(|| seen.lock().unwrap().is_some()).await;
    assert_eq!(seen.lock().unwrap().as_deref(), Some("m0"));
}

/// **Test: a send whose reply reference is rejected retries without it.**
///
/// **Setup:** Client fails any send that carries a reply reference.
/// **Action:** Send with `reply_to = Some("77")`.
/// **Expected:** Exactly one recorded send, without a reference; the callback
/// still fires.
#[tokio::test(start_paused = true)]
async fn test_send_retries_without_reference() {
    let client = Arc::new(MockClient::failing_reference_sends());
    let channel = Channel::new(client.clone(), destination());

    let delivered = Arc::new(Mutex::new(false));
    let delivered_clone = delivered.clone();
    channel.send(
        "are you there?".to_string(),
        Some("77".to_string()),
        None,
        false,
        Some(Box::new(move |_| {
            *delivered_clone.lock().unwrap() = true;
        })),
    );

    wait_until(|| *delivered.lock().unwrap()).await;
    let sends = client.sends.lock().unwrap();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].reply_to, None);
    assert_eq!(sends[0].text, "are you there?");
}

/// **Test: an edit whose target is gone falls back to sending a new message.**
#[tokio::test(start_paused = true)]
async fn test_edit_falls_back_to_send() {
    let client = Arc::new(MockClient::failing_edits());
    let channel = Channel::new(client.clone(), destination());

    channel.edit("gone".to_string(), "updated text".to_string(), None);

    wait_until(|| client.sends.lock().unwrap().len() == 1).await;
    assert!(client.edits.lock().unwrap().is_empty());
    assert_eq!(client.sent_texts(), vec!["updated text"]);
}

/// **Test: delete, typing, pin and unpin all pass through the queue.**
#[tokio::test(start_paused = true)]
async fn test_auxiliary_operations_pass_through() {
    let client = Arc::new(MockClient::new());
    let channel = Channel::new(client.clone(), destination());

    channel.typing();
    channel.pin("9".to_string(), true);
    channel.unpin("9".to_string());
    channel.delete("9".to_string());

    wait_until(|| client.deletes.lock().unwrap().len() == 1).await;
    assert_eq!(client.typing_count.load(Ordering::SeqCst), 1);
    assert_eq!(*client.pins.lock().unwrap(), vec![("9".to_string(), true)]);
    assert_eq!(*client.unpins.lock().unwrap(), vec!["9".to_string()]);
}
