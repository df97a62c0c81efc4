use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::trace;

use super::transport::Transport;
use crate::models::{EventBatch, TrackedEvent};
use crate::protocol::{self, WireFormat};

/// Coalesces bursts of events into one delivery per quiet period.
///
/// Every enqueue re-arms the debounce timer; only a full quiet period with
/// no further events lets the pending flush run. Unload and visibility
/// triggers call [`flush`](Batcher::flush) directly.
pub struct Batcher {
    project_id: String,
    session_id: String,
    endpoint: String,
    format: WireFormat,
    quiet_period: Duration,
    transport: Arc<dyn Transport>,
    queue: Mutex<Vec<TrackedEvent>>,
    generation: AtomicU64,
}

impl Batcher {
    pub fn new(
        project_id: String,
        session_id: String,
        endpoint: String,
        format: WireFormat,
        quiet_period: Duration,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        Arc::new(Self {
            project_id,
            session_id,
            endpoint,
            format,
            quiet_period,
            transport,
            queue: Mutex::new(Vec::new()),
            generation: AtomicU64::new(0),
        })
    }

    /// Appends the event and re-arms the debounce timer. The generation
    /// counter makes the most recent timer the only one that can fire, the
    /// setTimeout/clearTimeout pattern without a handle to clear.
    pub fn enqueue(self: &Arc<Self>, event: TrackedEvent) {
        self.queue.lock().unwrap().push(event);

        let armed = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let batcher = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(batcher.quiet_period).await;
            if batcher.generation.load(Ordering::SeqCst) == armed {
                batcher.flush();
            }
        });
    }

    /// Detaches the queued events in one synchronous step before any send
    /// begins. The timer, unload, and visibility triggers can all call this
    /// concurrently without double-sending: whichever runs first takes the
    /// batch, the rest see an empty queue and do nothing.
    pub fn flush(&self) {
        let events = std::mem::take(&mut *self.queue.lock().unwrap());
        if events.is_empty() {
            return;
        }

        let batch = EventBatch {
            project_id: self.project_id.clone(),
            session_id: self.session_id.clone(),
            events,
            sent_at: Some(Utc::now()),
        };

        match protocol::encode_batch(self.format, &batch) {
            Ok(payloads) => {
                for payload in payloads {
                    self.transport.deliver(&self.endpoint, payload);
                }
            }
            Err(e) => trace!("batch dropped, encoding failed: {e}"),
        }
    }
}
