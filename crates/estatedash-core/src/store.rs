//! Report store with request fencing
//!
//! Every fetch batch is tagged with a monotonically increasing sequence
//! number. Only the most recently issued batch may commit; a slow response
//! from an older batch is discarded instead of clobbering newer data.
//! State sits behind parking_lot::RwLock, the counter is an `AtomicU64`.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analytics::{Period, ReportData, ReportKind};
use crate::error::{DegradedState, LoadReport};
use crate::event::{EventBus, ReportEvent};
use crate::fetcher::{DataFetcher, FetchOutcome, FetchScope};
use crate::models::Dataset;

/// Load status of the current view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Loading,
    Ready,
}

/// Committed data of one batch
#[derive(Debug)]
pub struct ReportSnapshot {
    pub seq: u64,
    pub kind: ReportKind,
    pub period: Period,
    pub dataset: Dataset,
    pub fetched_at: DateTime<Utc>,
    /// Collections that failed and were replaced by empty lists
    pub failed_collections: Vec<String>,
}

impl ReportSnapshot {
    /// Derive the report; deterministic for a given snapshot
    pub fn compute(&self) -> ReportData {
        ReportData::compute(self.kind, &self.dataset, self.period, self.fetched_at)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    status: LoadStatus,
    /// Kind and period of the latest issued batch
    pending: Option<(ReportKind, Period)>,
    snapshot: Option<Arc<ReportSnapshot>>,
    last_error: Option<String>,
    degraded: Option<DegradedState>,
}

/// Holds the report data shown by a frontend
pub struct ReportStore {
    /// Last issued sequence number (0 = none yet)
    latest_seq: AtomicU64,
    state: RwLock<StoreState>,
    event_bus: EventBus,
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportStore {
    pub fn new() -> Self {
        Self {
            latest_seq: AtomicU64::new(0),
            state: RwLock::new(StoreState::default()),
            event_bus: EventBus::default_capacity(),
        }
    }

    /// Get the event bus for subscribing to updates
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> LoadStatus {
        self.state.read().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == LoadStatus::Loading
    }

    /// Latest committed snapshot (Arc clone)
    pub fn snapshot(&self) -> Option<Arc<ReportSnapshot>> {
        self.state.read().snapshot.clone()
    }

    /// Message of the last failed batch, cleared by the next commit
    pub fn last_error(&self) -> Option<String> {
        self.state.read().last_error.clone()
    }

    /// Get current degraded state
    pub fn degraded_state(&self) -> DegradedState {
        self.state
            .read()
            .degraded
            .clone()
            .unwrap_or(DegradedState::Healthy)
    }

    /// Issue a new batch: returns its sequence number and enters `Loading`
    pub fn begin_batch(&self, kind: ReportKind, period: Period) -> u64 {
        let seq = {
            let mut state = self.state.write();
            let seq = self.latest_seq.fetch_add(1, Ordering::SeqCst) + 1;
            state.status = LoadStatus::Loading;
            state.pending = Some((kind, period));
            seq
        };

        debug!(seq, report = kind.slug(), period = period.label(), "Batch started");
        self.event_bus.publish(ReportEvent::LoadStarted { seq, kind });
        seq
    }

    /// Store a batch's data if `seq` is still the latest issued.
    ///
    /// Returns false (and drops the data) for stale batches.
    pub fn commit(&self, seq: u64, outcome: FetchOutcome) -> bool {
        let kind = outcome.kind;
        {
            let mut state = self.state.write();
            let latest = self.latest_seq.load(Ordering::SeqCst);
            if seq != latest {
                drop(state);
                self.discard(seq, latest);
                return false;
            }

            let degraded = DegradedState::from_report(&outcome.report);
            state.snapshot = Some(Arc::new(ReportSnapshot {
                seq,
                kind,
                period: outcome.period,
                fetched_at: outcome.fetched_at,
                failed_collections: outcome.report.failed.clone(),
                dataset: outcome.dataset,
            }));
            state.status = LoadStatus::Ready;
            state.last_error = None;
            state.degraded = Some(degraded);
        }

        log_report(seq, &outcome.report);
        self.event_bus.publish(ReportEvent::LoadCompleted { seq, kind });
        true
    }

    /// Mark the latest batch as failed: `Ready` with zeroed metrics and one
    /// `FetchFailed` event. Stale failures are ignored.
    pub fn fail(&self, seq: u64, message: impl Into<String>) -> bool {
        let message = message.into();
        {
            let mut state = self.state.write();
            let latest = self.latest_seq.load(Ordering::SeqCst);
            if seq != latest {
                drop(state);
                self.discard(seq, latest);
                return false;
            }

            let (kind, period) = state.pending.unwrap_or_default();
            state.snapshot = Some(Arc::new(ReportSnapshot {
                seq,
                kind,
                period,
                dataset: Dataset::default(),
                fetched_at: Utc::now(),
                failed_collections: Vec::new(),
            }));
            state.status = LoadStatus::Ready;
            state.last_error = Some(message.clone());
            state.degraded = Some(DegradedState::Unavailable {
                reason: message.clone(),
            });
        }

        warn!(seq, error = %message, "Report batch failed");
        self.event_bus.publish(ReportEvent::FetchFailed { seq, message });
        true
    }

    /// begin → fetch → commit/fail. Returns true when this batch committed.
    pub async fn refresh(
        &self,
        fetcher: &DataFetcher,
        kind: ReportKind,
        period: Period,
        scope: &FetchScope,
    ) -> bool {
        let seq = self.begin_batch(kind, period);
        match fetcher.fetch(kind, period, scope).await {
            Ok(outcome) => self.commit(seq, outcome),
            Err(e) => {
                self.fail(seq, e.to_string());
                false
            }
        }
    }

    fn discard(&self, seq: u64, latest: u64) {
        info!(seq, latest, "Discarding stale batch");
        self.event_bus
            .publish(ReportEvent::StaleDiscarded { seq, latest });
    }
}

fn log_report(seq: u64, report: &LoadReport) {
    let (warnings, errors) = report.error_count();
    info!(
        seq,
        loaded = report.loaded.len(),
        failed = report.failed.len(),
        records = report.records_fetched,
        warnings,
        errors,
        "Batch committed"
    );
}
