//! Outbound retry queue with exponential backoff (spec §4.8).
//!
//! Grounded on `original_source/uplink/sparkplugb/queue.go`'s
//! `OutboundQueue`: a mutex-guarded in-memory queue that re-publishes on
//! failure up to `max_retry` times, backing off exponentially between
//! attempts. The original also threads a pluggable `Storage` interface
//! for crash-persistence; this port keeps the in-memory queue (the part
//! the core pipeline depends on) and omits the unused disk-persistence
//! hook, matching spec §1's explicit non-goal that persistence here is
//! append-only JSON logs, not a queue-backing store.

use std::time::Duration;

use parking_lot::Mutex;

#[derive(Debug, Clone)]
pub struct QueuedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub retry: u32,
}

pub struct OutboundQueue {
    messages: Mutex<Vec<QueuedMessage>>,
    max_retry: u32,
}

impl OutboundQueue {
    pub fn new(max_retry: u32) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            max_retry,
        }
    }

    pub fn enqueue(&self, topic: impl Into<String>, payload: Vec<u8>) {
        self.messages.lock().push(QueuedMessage {
            topic: topic.into(),
            payload,
            retry: 0,
        });
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Drains the queue, invoking `publish` for each message; failures
    /// are re-enqueued with an incremented retry count (dropped once
    /// `max_retry` is exceeded) after sleeping `backoff(retry)`.
    pub async fn drain<F, Fut>(&self, mut publish: F)
    where
        F: FnMut(QueuedMessage) -> Fut,
        Fut: std::future::Future<Output = Result<(), String>>,
    {
        let pending = std::mem::take(&mut *self.messages.lock());
        let mut remaining = Vec::new();

        for mut msg in pending {
            match publish(msg.clone()).await {
                Ok(()) => {}
                Err(e) => {
                    msg.retry += 1;
                    if msg.retry <= self.max_retry {
                        tracing::warn!("sparkplug publish to `{}` failed (retry {}): {e}", msg.topic, msg.retry);
                        tokio::time::sleep(backoff(msg.retry)).await;
                        remaining.push(msg);
                    } else {
                        tracing::warn!("sparkplug publish to `{}` dropped after {} retries: {e}", msg.topic, msg.retry);
                    }
                }
            }
        }

        self.messages.lock().extend(remaining);
    }
}

/// Exponential backoff: `2^retry` seconds, capped at 60.
pub fn backoff(retry: u32) -> Duration {
    let secs = 2u64.saturating_pow(retry).min(60);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_and_caps() {
        assert_eq!(backoff(1), Duration::from_secs(2));
        assert_eq!(backoff(2), Duration::from_secs(4));
        assert_eq!(backoff(10), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_message_is_retried_then_dropped() {
        let queue = OutboundQueue::new(1);
        queue.enqueue("spBv1.0/g/NDATA/n", b"x".to_vec());

        queue.drain(|_msg| async { Err::<(), String>("boom".to_string()) }).await;
        assert_eq!(queue.len(), 1);

        queue.drain(|_msg| async { Err::<(), String>("boom".to_string()) }).await;
        assert_eq!(queue.len(), 0);
    }

    #[tokio::test]
    async fn successful_publish_drains_the_message() {
        let queue = OutboundQueue::new(3);
        queue.enqueue("spBv1.0/g/NDATA/n", b"x".to_vec());
        queue.drain(|_msg| async { Ok(()) }).await;
        assert!(queue.is_empty());
    }
}
