//! Rate-limited outbound dispatch queue.
//!
//! The broker enforces a message-rate ceiling, so every post-handshake frame
//! goes through a sliding-window limiter: `calls_per_slot` sends per
//! `slot_interval`. When the current window has elapsed a fresh one opens
//! with full allowance; when the allowance runs out a timer is armed for the
//! window remainder and draining stops until it fires.
//!
//! Two submission modes:
//! - **durable** — sent exactly once whenever capacity allows, however long
//!   the wait;
//! - **expirable** — carries an absolute deadline; if its turn comes up
//!   later than that it is dropped without being sent and without settling
//!   its completion (any caller-visible timeout comes from the correlation
//!   bus, not from here).
//!
//! Ordering is FIFO except that an expired item is skipped without blocking
//! the items behind it. A single logical drain runs at a time: draining is
//! triggered only by an empty-to-non-empty transition or by the timer.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Duration, Instant};

use crate::error::{Result, TwsError};

struct Submission {
    payload: Vec<u8>,
    deadline: Option<Instant>,
    done: oneshot::Sender<Result<()>>,
}

struct QueueInner {
    sink: mpsc::UnboundedSender<Vec<u8>>,
    calls_per_slot: u32,
    slot_interval: Duration,
    max_len: Option<usize>,
    queue: VecDeque<Submission>,
    slot_end: Option<Instant>,
    slot_remaining: u32,
    timer_armed: bool,
}

/// Sliding-window rate limiter in front of the writer.
#[derive(Clone)]
pub struct DispatchQueue {
    inner: Arc<Mutex<QueueInner>>,
}

impl DispatchQueue {
    /// Create a queue draining into `sink` at `calls_per_slot` frames per
    /// `slot_interval`. `max_len` bounds the number of queued items; `None`
    /// leaves the queue unbounded.
    pub fn new(
        sink: mpsc::UnboundedSender<Vec<u8>>,
        calls_per_slot: u32,
        slot_interval: Duration,
        max_len: Option<usize>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(QueueInner {
                sink,
                calls_per_slot,
                slot_interval,
                max_len,
                queue: VecDeque::new(),
                slot_end: None,
                slot_remaining: calls_per_slot,
                timer_armed: false,
            })),
        }
    }

    /// Queue a durable frame. The returned receiver settles when the frame
    /// has been handed to the writer; dropping it is fine for fire-and-forget
    /// callers.
    pub fn submit(&self, payload: Vec<u8>) -> Result<oneshot::Receiver<Result<()>>> {
        self.push(payload, None)
    }

    /// Queue an expirable frame with an absolute deadline. If the deadline
    /// passes before its turn, the frame is silently dropped and the
    /// receiver never settles from this layer.
    pub fn submit_expirable(
        &self,
        payload: Vec<u8>,
        deadline: Instant,
    ) -> Result<oneshot::Receiver<Result<()>>> {
        self.push(payload, Some(deadline))
    }

    /// Drop every unsent item without settling its completion.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.clear();
    }

    /// Number of unsent items.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// Whether the queue has no unsent items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(
        &self,
        payload: Vec<u8>,
        deadline: Option<Instant>,
    ) -> Result<oneshot::Receiver<Result<()>>> {
        let (done, done_rx) = oneshot::channel();
        let trigger = {
            let mut inner = self.inner.lock().unwrap();
            if let Some(max) = inner.max_len {
                if inner.queue.len() >= max {
                    return Err(TwsError::QueueFull);
                }
            }
            inner.queue.push_back(Submission {
                payload,
                deadline,
                done,
            });
            // A drain is only kicked off on the empty -> non-empty
            // transition; while a timer is pending the fire will drain.
            inner.queue.len() == 1 && !inner.timer_armed
        };

        if trigger {
            Self::drain(&self.inner);
        }
        Ok(done_rx)
    }

    fn drain(inner: &Arc<Mutex<QueueInner>>) {
        let mut g = inner.lock().unwrap();
        loop {
            if g.queue.is_empty() {
                return;
            }

            let now = Instant::now();
            if g.slot_end.map_or(true, |end| now >= end) {
                g.slot_end = Some(now + g.slot_interval);
                g.slot_remaining = g.calls_per_slot;
            }

            if g.slot_remaining == 0 {
                if !g.timer_armed {
                    g.timer_armed = true;
                    let end = g.slot_end.expect("slot_end set when allowance exhausted");
                    let inner = Arc::clone(inner);
                    tokio::spawn(async move {
                        tokio::time::sleep_until(end).await;
                        inner.lock().unwrap().timer_armed = false;
                        Self::drain(&inner);
                    });
                }
                return;
            }

            let item = g.queue.pop_front().expect("queue checked non-empty");
            if item.deadline.map_or(false, |d| now >= d) {
                // Expired before its turn: skipped, allowance untouched,
                // completion deliberately left unsettled.
                tracing::debug!("dropping expired queued frame");
                continue;
            }

            g.slot_remaining -= 1;
            let result = g
                .sink
                .send(item.payload)
                .map_err(|_| TwsError::ConnectionClosed);
            let _ = item.done.send(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with_sink(
        calls_per_slot: u32,
        slot_interval: Duration,
        max_len: Option<usize>,
    ) -> (DispatchQueue, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DispatchQueue::new(tx, calls_per_slot, slot_interval, max_len), rx)
    }

    fn drain_now(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Ok(item) = rx.try_recv() {
            out.push(item);
        }
        out
    }

    #[tokio::test(start_paused = true)]
    async fn test_durable_sends_grouped_by_window() {
        let (queue, mut rx) = queue_with_sink(2, Duration::from_millis(1000), None);

        for i in 0..5u8 {
            queue.submit(vec![i]).unwrap();
        }
        tokio::task::yield_now().await;

        // First window: two sends, in order.
        assert_eq!(drain_now(&mut rx), vec![vec![0], vec![1]]);

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(drain_now(&mut rx), vec![vec![2], vec![3]]);

        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(drain_now(&mut rx), vec![vec![4]]);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_item_skipped_later_items_sent() {
        let (queue, mut rx) = queue_with_sink(1, Duration::from_millis(1000), None);

        queue.submit(vec![1]).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(drain_now(&mut rx), vec![vec![1]]);

        // Second item expires before the next window opens; third is durable.
        queue
            .submit_expirable(vec![2], Instant::now() + Duration::from_millis(100))
            .unwrap();
        queue.submit(vec![3]).unwrap();

        tokio::time::sleep(Duration::from_millis(1001)).await;

        assert_eq!(drain_now(&mut rx), vec![vec![3]]);
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expirable_within_deadline_sends() {
        let (queue, mut rx) = queue_with_sink(2, Duration::from_millis(1000), None);

        queue
            .submit_expirable(vec![7], Instant::now() + Duration::from_secs(30))
            .unwrap();
        tokio::task::yield_now().await;

        assert_eq!(drain_now(&mut rx), vec![vec![7]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_unsent_items() {
        let (queue, mut rx) = queue_with_sink(1, Duration::from_millis(1000), None);

        queue.submit(vec![1]).unwrap();
        let pending = queue.submit(vec![2]).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(drain_now(&mut rx), vec![vec![1]]);

        queue.cancel();
        tokio::time::sleep(Duration::from_millis(1001)).await;

        assert_eq!(drain_now(&mut rx), Vec::<Vec<u8>>::new());
        // The dropped item's completion is never settled by the queue.
        assert!(pending.await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_queue_rejects_overflow() {
        let (queue, _rx) = queue_with_sink(1, Duration::from_millis(1000), Some(2));

        queue.submit(vec![1]).unwrap();
        tokio::task::yield_now().await;

        queue.submit(vec![2]).unwrap();
        queue.submit(vec![3]).unwrap();
        assert!(matches!(queue.submit(vec![4]), Err(TwsError::QueueFull)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_settles_on_send() {
        let (queue, mut rx) = queue_with_sink(1, Duration::from_millis(1000), None);

        let done = queue.submit(vec![9]).unwrap();
        tokio::task::yield_now().await;

        assert!(done.await.unwrap().is_ok());
        assert_eq!(drain_now(&mut rx), vec![vec![9]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_sink_reports_connection_closed() {
        let (queue, rx) = queue_with_sink(1, Duration::from_millis(1000), None);
        drop(rx);

        let done = queue.submit(vec![1]).unwrap();
        tokio::task::yield_now().await;

        assert!(matches!(
            done.await.unwrap(),
            Err(TwsError::ConnectionClosed)
        ));
    }
}
