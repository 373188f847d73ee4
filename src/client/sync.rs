//! The stock sync service: a coalesced, single-executor polling loop.
//!
//! Four event sources can ask for a sync (mount, a fixed interval, window
//! focus regained, page visibility) plus manual requests. Rather than four
//! call sites racing each other, every trigger lands in one queue consumed
//! by one executor task. While a sync is in flight, any number of further
//! triggers coalesce into exactly one follow-up sync.
//!
//! Results are tagged with a monotonically increasing sequence number and a
//! result is only applied if its sequence is newer than the last applied
//! one. With a single executor this cannot trip, but it keeps the ordering
//! guarantee independent of that structure.
//!
//! A failed fetch leaves prior cart state untouched; the next scheduled
//! trigger is the retry. Dropping the [`SyncHandle`] closes the queue and
//! the executor stops scheduling; an in-flight response is discarded.

use super::cart::Cart;
use super::fetcher::{HttpStockFetcher, StockFetcher};
use crate::config::SyncConfig;
use crate::types::{StockIssue, StockLevel};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// What asked for a sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyncTrigger {
    /// First sync when the consumer mounts.
    Mount,
    /// The fixed interval fired.
    Interval,
    /// The window regained focus.
    FocusRegained,
    /// The page became visible.
    VisibilityVisible,
    /// Explicit request from the consumer.
    Manual,
    /// One or more triggers arrived while a sync was in flight and were
    /// folded into this single follow-up.
    Coalesced,
}

/// Which trigger sources are active. Each is independently enableable.
#[derive(Clone, Copy, Debug)]
pub struct SyncTriggers {
    /// Sync once immediately on start.
    pub on_mount: bool,
    /// Fixed cadence; `None` disables the interval source.
    pub interval: Option<Duration>,
    /// Accept [`SyncTrigger::FocusRegained`] events.
    pub on_focus: bool,
    /// Accept [`SyncTrigger::VisibilityVisible`] events.
    pub on_visibility: bool,
}

impl Default for SyncTriggers {
    fn default() -> Self {
        Self {
            on_mount: true,
            interval: Some(Duration::from_secs(30)),
            on_focus: true,
            on_visibility: true,
        }
    }
}

impl From<&SyncConfig> for SyncTriggers {
    fn from(config: &SyncConfig) -> Self {
        Self {
            // Zero disables the interval source rather than busy-looping.
            interval: (config.interval_secs > 0)
                .then(|| Duration::from_secs(config.interval_secs)),
            ..Self::default()
        }
    }
}

/// The outcome of one applied sync.
#[derive(Clone, Debug)]
pub struct SyncUpdate {
    /// Sequence number of the applied sync.
    pub seq: u64,
    /// Levels returned by the batch read.
    pub levels: Vec<StockLevel>,
    /// Stock issues derived against the cart at application time.
    pub issues: Vec<StockIssue>,
    /// When the result was applied.
    pub synced_at: DateTime<Utc>,
}

/// The stock sync service. Constructed via [`StockSyncService::spawn`].
pub struct StockSyncService;

impl StockSyncService {
    /// Spawn the executor task and hand back the consumer-facing handle.
    #[must_use]
    pub fn spawn(
        fetcher: Arc<dyn StockFetcher>,
        cart: Arc<Mutex<Cart>>,
        triggers: SyncTriggers,
    ) -> SyncHandle {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = watch::channel(None);

        let worker = Worker {
            fetcher,
            cart: cart.clone(),
            update_tx,
            seq: 0,
            last_applied: 0,
        };
        let task = tokio::spawn(worker.run(trigger_rx, triggers));

        SyncHandle {
            trigger_tx,
            update_rx,
            cart,
            triggers,
            _task: task,
        }
    }

    /// Spawn the service against a live stock service, taking the base URL
    /// and the interval cadence from [`SyncConfig`].
    #[must_use]
    pub fn spawn_http(config: &SyncConfig, cart: Arc<Mutex<Cart>>) -> SyncHandle {
        let fetcher = Arc::new(HttpStockFetcher::new(config.base_url.clone()));
        Self::spawn(fetcher, cart, SyncTriggers::from(config))
    }
}

/// Consumer-facing handle to the sync service.
///
/// Dropping the handle closes the trigger queue; the executor task then
/// stops scheduling and exits.
pub struct SyncHandle {
    trigger_tx: mpsc::UnboundedSender<SyncTrigger>,
    update_rx: watch::Receiver<Option<SyncUpdate>>,
    cart: Arc<Mutex<Cart>>,
    triggers: SyncTriggers,
    _task: JoinHandle<()>,
}

impl SyncHandle {
    /// Enqueue a trigger. Disabled sources are ignored; returns whether the
    /// trigger was accepted.
    pub fn trigger(&self, trigger: SyncTrigger) -> bool {
        let enabled = match trigger {
            SyncTrigger::FocusRegained => self.triggers.on_focus,
            SyncTrigger::VisibilityVisible => self.triggers.on_visibility,
            SyncTrigger::Manual => true,
            // Internal sources; external callers cannot inject them.
            SyncTrigger::Mount | SyncTrigger::Interval | SyncTrigger::Coalesced => false,
        };
        enabled && self.trigger_tx.send(trigger).is_ok()
    }

    /// Subscribe to applied sync results. `None` until the first applied
    /// sync.
    #[must_use]
    pub fn updates(&self) -> watch::Receiver<Option<SyncUpdate>> {
        self.update_rx.clone()
    }

    /// The shared cart this service keeps honest.
    #[must_use]
    pub fn cart(&self) -> Arc<Mutex<Cart>> {
        self.cart.clone()
    }
}

struct Worker {
    fetcher: Arc<dyn StockFetcher>,
    cart: Arc<Mutex<Cart>>,
    update_tx: watch::Sender<Option<SyncUpdate>>,
    seq: u64,
    last_applied: u64,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<SyncTrigger>, triggers: SyncTriggers) {
        if triggers.on_mount {
            self.sync(SyncTrigger::Mount).await;
        }

        let mut ticker = triggers.interval.map(|period| {
            // First tick is one period out; the mount sync covers "now".
            let mut t = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            t.set_missed_tick_behavior(MissedTickBehavior::Delay);
            t
        });

        loop {
            tokio::select! {
                maybe = rx.recv() => match maybe {
                    Some(trigger) => self.sync(trigger).await,
                    // Handle dropped: stop scheduling.
                    None => break,
                },
                () = tick(ticker.as_mut()) => self.sync(SyncTrigger::Interval).await,
            }

            // Triggers that queued while the sync above was awaiting the
            // network coalesce into exactly one follow-up sync.
            let mut coalesced = false;
            let mut closed = false;
            loop {
                match rx.try_recv() {
                    Ok(_) => coalesced = true,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed = true;
                        break;
                    }
                }
            }
            if coalesced {
                self.sync(SyncTrigger::Coalesced).await;
            }
            if closed {
                break;
            }
        }
        tracing::debug!("Stock sync executor stopped");
    }

    async fn sync(&mut self, trigger: SyncTrigger) {
        let ids = self.cart.lock().await.product_ids();
        if ids.is_empty() {
            tracing::debug!(?trigger, "Sync skipped, cart is empty");
            return;
        }

        self.seq += 1;
        let seq = self.seq;

        match self.fetcher.fetch_levels(&ids).await {
            Err(e) => {
                // Prior state stays untouched; the next scheduled trigger
                // retries. No immediate retry storm.
                tracing::warn!(?trigger, seq, error = %e, "Stock sync failed");
            }
            Ok(levels) => {
                if seq <= self.last_applied {
                    tracing::debug!(seq, last_applied = self.last_applied, "Stale sync dropped");
                    return;
                }
                self.last_applied = seq;

                let mut cart = self.cart.lock().await;
                cart.apply_levels(&levels);
                let issues = cart.stock_issues(&levels);
                drop(cart);

                tracing::debug!(
                    ?trigger,
                    seq,
                    products = levels.len(),
                    issues = issues.len(),
                    "Stock sync applied"
                );
                let _ = self.update_tx.send(Some(SyncUpdate {
                    seq,
                    levels,
                    issues,
                    synced_at: Utc::now(),
                }));
            }
        }
    }
}

/// Await the next interval tick, or never if the interval source is off.
async fn tick(ticker: Option<&mut tokio::time::Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_follow_the_sync_config() {
        let config = SyncConfig {
            base_url: "http://localhost:8080".to_string(),
            interval_secs: 45,
        };
        let triggers = SyncTriggers::from(&config);
        assert!(triggers.on_mount);
        assert_eq!(triggers.interval, Some(Duration::from_secs(45)));
    }

    #[test]
    fn zero_interval_disables_the_interval_source() {
        let config = SyncConfig {
            base_url: "http://localhost:8080".to_string(),
            interval_secs: 0,
        };
        assert_eq!(SyncTriggers::from(&config).interval, None);
    }
}
