use crate::batching::candidate_filter::{CandidateVerdict, classify_candidate};
use crate::transport::SignalSink;
use jamroom_core::{ClientMessage, IceCandidate, PeerId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Default)]
struct BatchQueue {
    items: Vec<IceCandidate>,
    timer: Option<JoinHandle<()>>,
    closed: bool,
}

struct BatcherInner {
    remote: PeerId,
    sink: Arc<dyn SignalSink>,
    queue: Mutex<BatchQueue>,
}

impl BatcherInner {
    /// Sends while the queue lock is held, so a timer flush and a flush from
    /// the pair task can never reach the sink out of order.
    fn flush(&self, cancel_timer: bool) {
        let mut queue = self.queue.lock();
        self.flush_locked(&mut queue, cancel_timer);
    }

    fn flush_locked(&self, queue: &mut BatchQueue, cancel_timer: bool) {
        if let Some(timer) = queue.timer.take() {
            if cancel_timer {
                timer.abort();
            }
        }
        if queue.closed {
            return;
        }
        let items = std::mem::take(&mut queue.items);

        let to = self.remote.clone();
        let msg = match items.len() {
            0 => return,
            1 => ClientMessage::IceCandidate {
                to,
                candidate: items.into_iter().next(),
            },
            n => {
                debug!("Sending {} candidates to {} in one batch", n, self.remote);
                ClientMessage::IceCandidatesBatch {
                    to,
                    candidates: items,
                }
            }
        };
        self.sink.send(msg);
    }
}

/// Coalesces locally discovered candidates for one remote peer.
///
/// Every accepted candidate re-arms the debounce timer; when it fires, or when
/// local gathering completes, everything queued goes out as one relay message.
pub struct CandidateBatcher {
    inner: Arc<BatcherInner>,
    debounce: Duration,
}

impl CandidateBatcher {
    pub fn new(remote: PeerId, sink: Arc<dyn SignalSink>, debounce: Duration) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                remote,
                sink,
                queue: Mutex::new(BatchQueue::default()),
            }),
            debounce,
        }
    }

    /// Queues `candidate` unless the filter rejects it. Returns whether it was kept.
    pub fn push(&self, candidate: IceCandidate) -> bool {
        let verdict = classify_candidate(&candidate);
        if verdict != CandidateVerdict::Accept {
            debug!("Filtered candidate for {} ({:?}): {}", self.inner.remote, verdict, candidate.candidate);
            return false;
        }

        let mut queue = self.inner.queue.lock();
        if queue.closed {
            return false;
        }
        queue.items.push(candidate);

        if let Some(timer) = queue.timer.take() {
            timer.abort();
        }
        let inner = self.inner.clone();
        let debounce = self.debounce;
        queue.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            inner.flush(false);
        }));
        true
    }

    pub fn flush(&self) {
        self.inner.flush(true);
    }

    /// Flushes what is queued, then tells the remote that no more candidates follow.
    pub fn gathering_complete(&self) {
        let mut queue = self.inner.queue.lock();
        if queue.closed {
            return;
        }
        self.inner.flush_locked(&mut queue, true);
        self.inner.sink.send(ClientMessage::IceCandidate {
            to: self.inner.remote.clone(),
            candidate: None,
        });
    }

    pub fn pending(&self) -> usize {
        self.inner.queue.lock().items.len()
    }

    /// Cancels the timer and forgets anything unsent.
    pub fn close(&self) {
        let mut queue = self.inner.queue.lock();
        queue.closed = true;
        queue.items.clear();
        if let Some(timer) = queue.timer.take() {
            timer.abort();
        }
    }
}

impl Drop for CandidateBatcher {
    fn drop(&mut self) {
        self.close();
    }
}
