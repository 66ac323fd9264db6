//! Application state for the TUI

use crate::components::{Spinner, Toast, ToastManager};
use crossterm::event::{KeyCode, KeyModifiers};
use estatedash_core::export::{export_report_csv, ExportError};
use estatedash_core::view::{categories, Filterable};
use estatedash_core::{
    DataFetcher, DegradedState, Period, ReportData, ReportEvent, ReportKind, ReportStore,
    ViewState,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::debug;

/// Main application state
pub struct App {
    /// Shared report store
    pub store: Arc<ReportStore>,
    fetcher: DataFetcher,
    /// Tab, period, scope, filter and load status
    pub view: ViewState,
    event_rx: broadcast::Receiver<ReportEvent>,
    /// Report computed from the latest committed snapshot
    pub report: Option<ReportData>,
    report_seq: u64,
    /// Search box has keyboard focus
    pub search_mode: bool,
    /// Highlighted row of the main table
    pub selected: usize,
    pub toasts: ToastManager,
    pub spinner: Spinner,
    export_dir: PathBuf,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        store: Arc<ReportStore>,
        fetcher: DataFetcher,
        view: ViewState,
        export_dir: PathBuf,
    ) -> Self {
        let event_rx = store.event_bus().subscribe();
        Self {
            store,
            fetcher,
            view,
            event_rx,
            report: None,
            report_seq: 0,
            search_mode: false,
            selected: 0,
            toasts: ToastManager::new(),
            spinner: Spinner::new(),
            export_dir,
            should_quit: false,
        }
    }

    /// Issue a batch for the current tab, period and scope.
    ///
    /// The sequence number is taken before the task is spawned so batches
    /// are ordered by key press, not by task scheduling.
    pub fn request_refresh(&mut self) {
        let kind = self.view.tab;
        let period = self.view.period;
        let scope = self.view.scope.clone();

        self.view.begin_loading();
        let seq = self.store.begin_batch(kind, period);

        let store = self.store.clone();
        let fetcher = self.fetcher.clone();
        tokio::spawn(async move {
            match fetcher.fetch(kind, period, &scope).await {
                Ok(outcome) => {
                    store.commit(seq, outcome);
                }
                Err(e) => {
                    store.fail(seq, e.to_string());
                }
            }
        });
    }

    /// Handle a key press. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.search_mode {
            return self.handle_search_key(key);
        }

        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                true
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                true
            }
            KeyCode::Char(c) if ('1'..='8').contains(&c) => {
                let idx = (c as usize) - ('1' as usize);
                self.select_tab(ReportKind::from_index(idx));
                true
            }
            KeyCode::Tab => {
                if self.view.next_tab() {
                    self.on_view_changed();
                }
                true
            }
            KeyCode::BackTab => {
                if self.view.prev_tab() {
                    self.on_view_changed();
                }
                true
            }
            KeyCode::F(n @ 1..=4) => {
                let period = Period::all()[usize::from(n) - 1];
                if self.view.set_period(period) {
                    self.request_refresh();
                }
                true
            }
            KeyCode::Char('p') => {
                let periods = Period::all();
                let idx = periods.iter().position(|p| *p == self.view.period).unwrap_or(0);
                if self.view.set_period(periods[(idx + 1) % periods.len()]) {
                    self.request_refresh();
                }
                true
            }
            KeyCode::Char('r') | KeyCode::F(5) => {
                self.request_refresh();
                true
            }
            KeyCode::Char('/') => {
                self.search_mode = true;
                true
            }
            KeyCode::Char('c') => {
                let cats = self.categories();
                self.view.filter.cycle_category(&cats);
                self.selected = 0;
                true
            }
            KeyCode::Esc => {
                self.view.filter.clear();
                self.selected = 0;
                true
            }
            KeyCode::Char('x') => {
                self.export_current();
                true
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let (shown, _) = self.row_counts().unwrap_or((0, 0));
                if self.selected + 1 < shown {
                    self.selected += 1;
                }
                true
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    fn handle_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char(c) => {
                let mut query = self.view.filter.search().to_string();
                query.push(c);
                self.view.filter.set_search(query);
            }
            KeyCode::Backspace => {
                let mut query = self.view.filter.search().to_string();
                query.pop();
                self.view.filter.set_search(query);
            }
            KeyCode::Enter => self.search_mode = false,
            KeyCode::Esc => {
                self.view.filter.clear_search();
                self.search_mode = false;
            }
            _ => return false,
        }
        self.selected = 0;
        true
    }

    fn select_tab(&mut self, tab: ReportKind) {
        if self.view.select_tab(tab) {
            self.on_view_changed();
        }
    }

    fn on_view_changed(&mut self) {
        self.search_mode = false;
        self.selected = 0;
        self.request_refresh();
    }

    /// Drain store events (non-blocking)
    pub fn poll_events(&mut self) {
        loop {
            match self.event_rx.try_recv() {
                Ok(ReportEvent::LoadCompleted { seq, .. }) => {
                    if seq == self.store.latest_seq() {
                        self.sync_report();
                        if let DegradedState::PartialData { reason, .. } =
                            self.store.degraded_state()
                        {
                            self.toasts.push(Toast::warning(reason));
                        }
                    }
                }
                Ok(ReportEvent::FetchFailed { seq, message }) => {
                    if seq == self.store.latest_seq() {
                        self.sync_report();
                        self.toasts
                            .push(Toast::error(format!("Failed to load report: {}", message)));
                    }
                }
                Ok(ReportEvent::StaleDiscarded { seq, latest }) => {
                    debug!(seq, latest, "Ignoring stale batch");
                }
                Ok(ReportEvent::LoadStarted { .. }) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "Event receiver lagged");
                    self.sync_report();
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    /// Recompute the report when a newer snapshot was committed
    fn sync_report(&mut self) {
        if let Some(snapshot) = self.store.snapshot() {
            if snapshot.seq != self.report_seq {
                self.report = Some(snapshot.compute());
                self.report_seq = snapshot.seq;
                self.selected = 0;
            }
        }
        if !self.store.is_loading() {
            self.view.mark_ready();
        }
    }

    /// Write the on-screen report's table as CSV into the export directory.
    ///
    /// Nothing is written while the active tab is still loading.
    pub fn export_current(&mut self) {
        let date = chrono::Local::now().date_naive();
        let result = self
            .current_report()
            .map(|report| export_report_csv(report, &self.export_dir, date));

        match result {
            None => self.toasts.push(Toast::warning("Report still loading")),
            Some(Ok(path)) => self
                .toasts
                .push(Toast::success(format!("Exported {}", path.display()))),
            Some(Err(ExportError::EmptyDataset)) => {
                self.toasts.push(Toast::warning("Nothing to export"));
            }
            Some(Err(e)) => self.toasts.push(Toast::error(format!("Export failed: {}", e))),
        }
    }

    /// Categories offered by the current report's main table
    pub fn categories(&self) -> Vec<String> {
        match &self.report {
            Some(ReportData::Agents(r)) => categories(&r.agents),
            Some(ReportData::Agencies(r)) => categories(&r.agencies),
            Some(ReportData::Campaigns(r)) => categories(&r.campaigns),
            Some(ReportData::FollowUps(r)) => categories(&r.overdue_leads),
            _ => Vec::new(),
        }
    }

    /// (rows passing the filter, total rows) of the current main table
    pub fn row_counts(&self) -> Option<(usize, usize)> {
        fn counts<T: Filterable>(app: &App, rows: &[T]) -> Option<(usize, usize)> {
            Some((app.view.filter.apply(rows).len(), rows.len()))
        }

        match self.report.as_ref()? {
            ReportData::Overview(r) => counts(self, &r.metric_rows()),
            ReportData::Funnel(r) => counts(self, &r.stages),
            ReportData::Agents(r) => counts(self, &r.agents),
            ReportData::Agencies(r) => counts(self, &r.agencies),
            ReportData::Campaigns(r) => counts(self, &r.campaigns),
            ReportData::FollowUps(r) => counts(self, &r.overdue_leads),
            ReportData::SiteVisits(r) => counts(self, &r.upcoming),
            ReportData::Revenue(r) => counts(self, &r.series_rows()),
        }
    }

    /// Report matching the active tab, if its data has arrived
    pub fn current_report(&self) -> Option<&ReportData> {
        self.report
            .as_ref()
            .filter(|report| report.kind() == self.view.tab)
    }

    pub fn is_loading(&self) -> bool {
        self.view.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use estatedash_core::error::CoreError;
    use estatedash_core::fetcher::{Collection, EntitySource, FetchQuery, FetchScope};
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::TempDir;

    struct FixtureSource {
        fail: bool,
    }

    #[async_trait]
    impl EntitySource for FixtureSource {
        async fn fetch_collection(
            &self,
            collection: Collection,
            _query: &FetchQuery,
        ) -> Result<Vec<Value>, CoreError> {
            if self.fail {
                return Err(CoreError::HttpStatus {
                    collection: collection.name().to_string(),
                    status: 503,
                });
            }
            let now = chrono::Utc::now().to_rfc3339();
            Ok(match collection {
                Collection::Leads => vec![
                    json!({ "_id": "L1", "campaign": "Spring", "status": "converted", "createdAt": now }),
                    json!({ "_id": "L2", "campaign": "Autumn", "status": "new", "createdAt": now }),
                ],
                Collection::Users => vec![
                    json!({ "_id": "U1", "name": "Asha", "role": "agent", "agency": "A1" }),
                ],
                Collection::Agencies => vec![
                    json!({ "_id": "A1", "name": "Acme", "isActive": true }),
                    json!({ "_id": "A2", "name": "Beta", "isActive": false }),
                ],
                _ => Vec::new(),
            })
        }
    }

    fn app(fail: bool, tab: ReportKind, export_dir: PathBuf) -> App {
        let fetcher = DataFetcher::new(
            Arc::new(FixtureSource { fail }),
            500,
            Duration::from_secs(5),
        );
        let view = ViewState::new(tab, Period::Last30d, FetchScope::all());
        App::new(Arc::new(ReportStore::new()), fetcher, view, export_dir)
    }

    /// Poll events until the in-flight batch settles
    async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.poll_events();
            if !app.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("batch never settled");
    }

    fn press(app: &mut App, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn test_loading_then_ready() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Campaigns, dir.path().to_path_buf());
        assert!(app.is_loading());

        app.request_refresh();
        settle(&mut app).await;

        let Some(ReportData::Campaigns(report)) = app.current_report() else {
            panic!("expected campaign report");
        };
        assert_eq!(report.total_leads, 2);
        assert_eq!(app.row_counts(), Some((2, 2)));
    }

    #[tokio::test]
    async fn test_tab_and_period_keys_issue_batches() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Overview, dir.path().to_path_buf());

        assert!(press(&mut app, KeyCode::Char('1')));
        assert_eq!(app.store.latest_seq(), 0);

        press(&mut app, KeyCode::Char('4'));
        assert_eq!(app.view.tab, ReportKind::Agencies);
        assert_eq!(app.store.latest_seq(), 1);

        press(&mut app, KeyCode::F(3));
        assert_eq!(app.view.period, Period::Last90d);
        assert_eq!(app.store.latest_seq(), 2);

        press(&mut app, KeyCode::F(3));
        assert_eq!(app.store.latest_seq(), 2);

        settle(&mut app).await;
        assert!(matches!(app.current_report(), Some(ReportData::Agencies(_))));
        assert!(!press(&mut app, KeyCode::Char('z')));
    }

    #[tokio::test]
    async fn test_search_mode_captures_keys() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Campaigns, dir.path().to_path_buf());
        app.request_refresh();
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('/'));
        for c in "spq".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.view.filter.search(), "sp");
        assert_eq!(app.row_counts(), Some((1, 2)));

        press(&mut app, KeyCode::Enter);
        assert!(!app.search_mode);
        assert_eq!(app.view.filter.search(), "sp");

        press(&mut app, KeyCode::Esc);
        assert!(!app.view.filter.is_active());

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_category_cycles_over_report_rows() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Agencies, dir.path().to_path_buf());
        app.request_refresh();
        settle(&mut app).await;

        assert_eq!(
            app.categories(),
            vec!["average".to_string(), "poor".to_string()]
        );
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view.filter.category(), Some("average"));
        assert_eq!(app.row_counts(), Some((1, 2)));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view.filter.category(), Some("poor"));
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.view.filter.category(), None);
        assert_eq!(app.row_counts(), Some((2, 2)));
    }

    #[tokio::test]
    async fn test_failed_batch_shows_one_error_and_zeroed_report() {
        let dir = TempDir::new().unwrap();
        let mut app = app(true, ReportKind::Funnel, dir.path().to_path_buf());
        app.request_refresh();
        settle(&mut app).await;

        assert_eq!(app.toasts.len(), 1);
        assert_eq!(
            app.toasts.latest().map(|t| t.kind),
            Some(crate::components::ToastKind::Error)
        );
        let Some(ReportData::Funnel(report)) = app.current_report() else {
            panic!("expected funnel report");
        };
        assert_eq!(report.total, 0);
        assert_eq!(report.conversion_rate, 0.0);
    }

    #[tokio::test]
    async fn test_export_writes_csv_or_warns() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Campaigns, dir.path().to_path_buf());

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.toasts.latest().map(|t| t.message.as_str()), Some("Report still loading"));

        app.request_refresh();
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('x'));

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(
            app.toasts.latest().map(|t| t.kind),
            Some(crate::components::ToastKind::Success)
        );
    }

    #[tokio::test]
    async fn test_export_of_empty_report_warns() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Revenue, dir.path().to_path_buf());
        app.request_refresh();
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.toasts.latest().map(|t| t.message.as_str()), Some("Nothing to export"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_export_waits_for_switched_tab() {
        let dir = TempDir::new().unwrap();
        let mut app = app(false, ReportKind::Campaigns, dir.path().to_path_buf());
        app.request_refresh();
        settle(&mut app).await;

        // Agencies batch is issued but has not run yet
        press(&mut app, KeyCode::Char('4'));
        assert!(app.is_loading());
        assert!(app.current_report().is_none());

        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.toasts.latest().map(|t| t.message.as_str()), Some("Report still loading"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

        settle(&mut app).await;
        press(&mut app, KeyCode::Char('x'));
        let files: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(files.len(), 1);
        assert!(files[0].starts_with("agency-health-export-"));
    }
}
