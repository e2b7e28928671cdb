use crate::notify::{deliver_status, Notifier, StatusRetry};
use crate::progress::types::{ProgressEvent, StatusUpdate};
use crate::registry::JobHandle;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use parking_lot::Mutex;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Depth-one mailbox: a newer update overwrites an undelivered one.
struct StatusSlot {
    pending: Mutex<Option<StatusUpdate>>,
    wake: Notify,
}

impl StatusSlot {
    fn new() -> Self {
        Self {
            pending: Mutex::new(None),
            wake: Notify::new(),
        }
    }

    fn put(&self, update: StatusUpdate) {
        *self.pending.lock() = Some(update);
        self.wake.notify_one();
    }

    fn take(&self) -> Option<StatusUpdate> {
        self.pending.lock().take()
    }
}

/// Producer side of the bridge, handed to the fetcher.
///
/// `observe` never blocks on I/O and may be called from any thread.
#[derive(Clone)]
pub struct ProgressSink {
    slot: Arc<StatusSlot>,
}

impl ProgressSink {
    /// A sink with no bridge behind it; events are kept but never delivered.
    pub fn detached() -> Self {
        Self {
            slot: Arc::new(StatusSlot::new()),
        }
    }

    pub fn observe(&self, event: ProgressEvent) {
        self.slot.put(StatusUpdate::Progress(event));
    }

    /// Undelivered update, if any
    pub fn pending(&self) -> Option<StatusUpdate> {
        self.slot.pending.lock().clone()
    }
}

impl fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressSink")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Rate-limited delivery of status updates for one job.
///
/// The owning task runs [`drain`](Self::drain) alongside its work, calls
/// [`close`](Self::close) when the work ends, and finally sends the terminal
/// text through [`flush_terminal`](Self::flush_terminal).
pub struct ProgressBridge {
    slot: Arc<StatusSlot>,
    shutdown: Notify,
    closed: AtomicBool,
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    notifier: Arc<dyn Notifier>,
    handle: JobHandle,
    retry: StatusRetry,
    delivered: AtomicU64,
    terminal_sent: AtomicBool,
}

impl ProgressBridge {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        handle: JobHandle,
        interval: Duration,
        retry: StatusRetry,
    ) -> Self {
        // A zero interval means unthrottled
        let quota = Quota::with_period(interval)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MAX));

        Self {
            slot: Arc::new(StatusSlot::new()),
            shutdown: Notify::new(),
            closed: AtomicBool::new(false),
            limiter: RateLimiter::direct(quota),
            notifier,
            handle,
            retry,
            delivered: AtomicU64::new(0),
            terminal_sent: AtomicBool::new(false),
        }
    }

    pub fn sink(&self) -> ProgressSink {
        ProgressSink {
            slot: self.slot.clone(),
        }
    }

    pub fn observe(&self, event: ProgressEvent) {
        self.slot.put(StatusUpdate::Progress(event));
    }

    /// Queue a phase message; it shares the slot and pacing with progress.
    pub fn announce(&self, text: impl Into<String>) {
        self.slot.put(StatusUpdate::Phase(text.into()));
    }

    /// Stop the drain loop. Anything still pending is discarded.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shutdown.notify_one();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Deliver pending updates at most once per interval until closed.
    pub async fn drain(&self) {
        while !self.is_closed() {
            tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                _ = self.slot.wake.notified() => {}
            }

            tokio::select! {
                biased;
                _ = self.shutdown.notified() => break,
                _ = self.limiter.until_ready() => {}
            }

            // Woken by an update that an earlier tick already delivered
            let Some(update) = self.slot.take() else {
                continue;
            };

            let text = update.render();
            if deliver_status(&*self.notifier, &self.handle, &text, &self.retry).await {
                self.delivered.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Send the terminal status immediately, bypassing the interval gate.
    ///
    /// Only the first call sends anything. Returns whether it was delivered.
    pub async fn flush_terminal(&self, text: &str) -> bool {
        self.close();
        if self.terminal_sent.swap(true, Ordering::AcqRel) {
            return false;
        }

        self.slot.take();
        let sent = deliver_status(&*self.notifier, &self.handle, text, &self.retry).await;
        if sent {
            self.delivered.fetch_add(1, Ordering::Relaxed);
        }
        sent
    }

    /// Status calls that reached the notifier
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }
}
