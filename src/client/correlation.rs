//! Correlation state for requests multiplexed over one connection.
//!
//! Each in-flight request owns a slot keyed by its id. A slot is removed
//! exactly once: by [`PendingRequests::complete`] when the matching response
//! arrives, or by dropping the [`PendingResponse`] when the caller gives up.
//! Responses for abandoned ids are late arrivals and are discarded.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::protocol::Envelope;

/// Abandoned ids remembered so their late responses can be told apart from
/// misaddressed ones.
const ABANDONED_CAPACITY: usize = 256;

#[derive(Default)]
struct Slots {
    waiting: HashMap<String, oneshot::Sender<Envelope>>,
    abandoned: VecDeque<String>,
}

/// Map from in-flight request id to its response slot.
#[derive(Default)]
pub struct PendingRequests {
    slots: Mutex<Slots>,
}

impl PendingRequests {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Open a slot for `id`. Returns `None` if the id is already in flight.
    pub fn register(self: &Arc<Self>, id: &str) -> Option<PendingResponse> {
        let mut slots = self.slots.lock();
        if slots.waiting.contains_key(id) {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        slots.waiting.insert(id.to_string(), tx);
        Some(PendingResponse {
            id: id.to_string(),
            rx,
            pending: Arc::clone(self),
        })
    }

    /// Deliver a response to its waiter. Returns `false` if nobody was
    /// waiting for it.
    ///
    /// A response whose id matches no slot and no abandoned request goes to
    /// the only waiter when exactly one request is in flight, so that caller
    /// sees the mismatched id instead of waiting out its deadline. With
    /// several requests in flight it cannot be attributed and is discarded.
    pub fn complete(&self, response: Envelope) -> bool {
        let tx = {
            let mut slots = self.slots.lock();
            if let Some(tx) = slots.waiting.remove(&response.id) {
                tx
            } else if let Some(position) = slots.abandoned.iter().position(|id| *id == response.id) {
                slots.abandoned.remove(position);
                debug!("Discarding late response for abandoned id {}", response.id);
                return false;
            } else if slots.waiting.len() == 1 {
                let Some(expected) = slots.waiting.keys().next().cloned() else {
                    return false;
                };
                warn!(
                    "Response id {} matches no request; handing it to {}",
                    response.id, expected
                );
                match slots.waiting.remove(&expected) {
                    Some(tx) => tx,
                    None => return false,
                }
            } else {
                debug!("Discarding response for unknown id {}", response.id);
                return false;
            }
        };
        tx.send(response).is_ok()
    }

    /// Drop every slot; their waiters observe a closed channel.
    pub fn fail_all(&self) {
        let failed = std::mem::take(&mut self.slots.lock().waiting);
        if !failed.is_empty() {
            debug!("Failing {} pending requests", failed.len());
        }
    }

    /// Number of requests currently in flight.
    pub fn len(&self) -> usize {
        self.slots.lock().waiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().waiting.is_empty()
    }
}

/// Waiter for one in-flight response.
pub struct PendingResponse {
    id: String,
    rx: oneshot::Receiver<Envelope>,
    pending: Arc<PendingRequests>,
}

impl PendingResponse {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the response. Fails if the slot was dropped without one.
    pub async fn wait(mut self) -> Result<Envelope, oneshot::error::RecvError> {
        (&mut self.rx).await
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        let mut slots = self.pending.slots.lock();
        if slots.waiting.remove(&self.id).is_some() {
            if slots.abandoned.len() == ABANDONED_CAPACITY {
                slots.abandoned.pop_front();
            }
            slots.abandoned.push_back(std::mem::take(&mut self.id));
        }
    }
}
