//! Data Fetcher: concurrent, fault-tolerant reads of CRM collections
//!
//! A report batch reads every collection its [`ReportKind`] needs at once
//! (`join_all`). Each read is independent: a failed call becomes an empty
//! collection plus a warning in the batch's [`LoadReport`]. No retries, no
//! backoff. Only a batch that times out or gets no data at all is an error.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::analytics::{Period, ReportKind};
use crate::config::ClientConfig;
use crate::error::{CoreError, LoadError, LoadReport};
use crate::models::{decode_records, Dataset};

/// One remote entity collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Properties,
    Leads,
    Agencies,
    Transactions,
    Payments,
}

impl Collection {
    pub fn all() -> &'static [Collection] {
        &[
            Collection::Users,
            Collection::Properties,
            Collection::Leads,
            Collection::Agencies,
            Collection::Transactions,
            Collection::Payments,
        ]
    }

    /// Path segment and response key (`GET /leads` → `{ "leads": [...] }`)
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Properties => "properties",
            Collection::Leads => "leads",
            Collection::Agencies => "agencies",
            Collection::Transactions => "transactions",
            Collection::Payments => "payments",
        }
    }

    /// Collections the API filters by `startDate`/`endDate`; the rest are
    /// windowed after the fetch
    pub fn is_time_bounded(&self) -> bool {
        matches!(self, Collection::Transactions | Collection::Payments)
    }

    /// Agency-owned collections honor the `agency` scope parameter
    pub fn is_agency_scoped(&self) -> bool {
        !matches!(self, Collection::Agencies)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Optional narrowing of a batch to one agency
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchScope {
    pub agency_id: Option<String>,
}

impl FetchScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn agency(agency_id: impl Into<String>) -> Self {
        let id = agency_id.into();
        Self {
            agency_id: Some(id.trim().to_string()).filter(|id| !id.is_empty()),
        }
    }
}

/// Query parameters for one collection read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchQuery {
    pub limit: usize,
    pub role: Option<String>,
    pub agency: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl FetchQuery {
    pub fn build(
        collection: Collection,
        kind: ReportKind,
        period: Period,
        scope: &FetchScope,
        page_size: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let bounded = collection.is_time_bounded();
        Self {
            limit: page_size,
            role: (collection == Collection::Users && agents_only(kind))
                .then(|| "agent".to_string()),
            agency: scope
                .agency_id
                .clone()
                .filter(|_| collection.is_agency_scoped()),
            start_date: bounded.then(|| period.cutoff(now)),
            end_date: bounded.then_some(now),
        }
    }

    /// Pairs for the URL query string, in a stable order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("limit", self.limit.to_string())];
        if let Some(role) = &self.role {
            params.push(("role", role.clone()));
        }
        if let Some(agency) = &self.agency {
            params.push(("agency", agency.clone()));
        }
        if let Some(start) = self.start_date {
            params.push(("startDate", start.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        if let Some(end) = self.end_date {
            params.push(("endDate", end.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }
        params
    }
}

/// Reports that only look at agent users
fn agents_only(kind: ReportKind) -> bool {
    matches!(
        kind,
        ReportKind::Agents | ReportKind::Agencies | ReportKind::FollowUps
    )
}

/// Where raw entity records come from
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Raw JSON records of one collection
    async fn fetch_collection(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<Value>, CoreError>;

    /// Flat summary object from `/stats/reports`, if the backend has one
    async fn fetch_stats(&self) -> Result<Option<Map<String, Value>>, CoreError> {
        Ok(None)
    }
}

/// [`EntitySource`] backed by the CRM REST API
pub struct HttpSource {
    client: reqwest::Client,
    config: ClientConfig,
}

impl HttpSource {
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("estatedash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CoreError::InvalidConfig {
                message: format!("cannot build HTTP client: {}", e),
            })?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn get_json(&self, label: &str, url: &str, query: &[(&str, String)]) -> Result<Value, CoreError> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|source| CoreError::Http {
            collection: label.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::HttpStatus {
                collection: label.to_string(),
                status: status.as_u16(),
            });
        }

        response.json::<Value>().await.map_err(|source| CoreError::Decode {
            collection: label.to_string(),
            message: "response is not valid JSON".to_string(),
            source,
        })
    }
}

#[async_trait]
impl EntitySource for HttpSource {
    async fn fetch_collection(
        &self,
        collection: Collection,
        query: &FetchQuery,
    ) -> Result<Vec<Value>, CoreError> {
        let url = self.config.endpoint(collection.name());
        debug!(%collection, url = %url, "GET collection");
        let body = self.get_json(collection.name(), &url, &query.params()).await?;
        Ok(extract_records(collection, body))
    }

    async fn fetch_stats(&self) -> Result<Option<Map<String, Value>>, CoreError> {
        let url = self.config.endpoint("stats/reports");
        let body = self.get_json("stats", &url, &[]).await?;
        Ok(match body {
            Value::Object(mut map) => match map.remove("stats") {
                Some(Value::Object(inner)) => Some(inner),
                Some(other) => {
                    map.insert("stats".to_string(), other);
                    Some(map)
                }
                None => Some(map),
            },
            _ => None,
        })
    }
}

/// Pull the record list out of a collection response.
///
/// Accepts `{ "<collection>": [...] }`, `{ "data": [...] }` or a bare array;
/// any other shape is an empty collection.
pub fn extract_records(collection: Collection, body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in [collection.name(), "data"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            warn!(%collection, "Response carries no record list");
            Vec::new()
        }
        _ => {
            warn!(%collection, "Unexpected response shape");
            Vec::new()
        }
    }
}

/// Result of one batch
#[derive(Debug)]
pub struct FetchOutcome {
    pub kind: ReportKind,
    pub period: Period,
    pub dataset: Dataset,
    pub report: LoadReport,
    /// Instant the batch windows were computed against
    pub fetched_at: DateTime<Utc>,
}

/// Issues the reads for a report batch
#[derive(Clone)]
pub struct DataFetcher {
    source: Arc<dyn EntitySource>,
    page_size: usize,
    batch_timeout: Duration,
}

impl DataFetcher {
    pub fn new(source: Arc<dyn EntitySource>, page_size: usize, batch_timeout: Duration) -> Self {
        Self {
            source,
            page_size,
            batch_timeout,
        }
    }

    /// Fetcher over the HTTP API described by `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, CoreError> {
        let source = HttpSource::new(config.clone())?;
        Ok(Self::new(
            Arc::new(source),
            config.page_size,
            config.batch_timeout,
        ))
    }

    pub async fn fetch(
        &self,
        kind: ReportKind,
        period: Period,
        scope: &FetchScope,
    ) -> Result<FetchOutcome, CoreError> {
        self.fetch_at(kind, period, scope, Utc::now()).await
    }

    /// Same as [`fetch`](Self::fetch) with an explicit clock
    pub async fn fetch_at(
        &self,
        kind: ReportKind,
        period: Period,
        scope: &FetchScope,
        now: DateTime<Utc>,
    ) -> Result<FetchOutcome, CoreError> {
        let collections = kind.required_collections();
        info!(
            report = kind.slug(),
            period = period.label(),
            agency = scope.agency_id.as_deref().unwrap_or("all"),
            collections = collections.len(),
            "Fetching report batch"
        );

        let reads = join_all(collections.iter().map(|collection| {
            let query = FetchQuery::build(*collection, kind, period, scope, self.page_size, now);
            async move {
                let result = self.source.fetch_collection(*collection, &query).await;
                (*collection, result)
            }
        }));
        let stats = async {
            if kind == ReportKind::Overview {
                self.source.fetch_stats().await
            } else {
                Ok(None)
            }
        };

        let batch = async { futures::join!(reads, stats) };
        let (results, stats) = tokio::time::timeout(self.batch_timeout, batch)
            .await
            .map_err(|_| CoreError::BatchTimeout {
                timeout_secs: self.batch_timeout.as_secs(),
            })?;

        let mut report = LoadReport::new();
        let mut dataset = Dataset::default();

        for (collection, result) in results {
            match result {
                Ok(records) => {
                    let count = records.len();
                    if count >= self.page_size {
                        debug!(%collection, limit = self.page_size, "Collection hit the page size, data may be truncated");
                        report.add_error(
                            LoadError::warning(
                                collection.name(),
                                format!("Only the first {} records were read", self.page_size),
                            )
                            .with_suggestion("Raise --page-size or narrow the period"),
                        );
                    }
                    report.records_fetched += count;
                    report.loaded.push(collection.name().to_string());
                    store_records(&mut dataset, collection, records);
                }
                Err(e) => {
                    warn!(%collection, error = %e, "Collection fetch failed, using empty list");
                    report.failed.push(collection.name().to_string());
                    report.add_error(LoadError::from_core_error(collection.name(), &e));
                }
            }
        }

        match stats {
            Ok(stats) => dataset.server_stats = stats,
            Err(e) => debug!(error = %e, "No server stats"),
        }

        if report.loaded.is_empty() && !report.failed.is_empty() {
            let message = report
                .errors
                .first()
                .map(|e| e.message.clone())
                .unwrap_or_else(|| "every collection failed".to_string());
            return Err(CoreError::BatchFailed { message });
        }

        if let Some(agency_id) = &scope.agency_id {
            apply_scope(&mut dataset, agency_id);
        }

        info!(
            report = kind.slug(),
            records = report.records_fetched,
            failed = report.failed.len(),
            "Report batch fetched"
        );

        Ok(FetchOutcome {
            kind,
            period,
            dataset,
            report,
            fetched_at: now,
        })
    }
}

fn store_records(dataset: &mut Dataset, collection: Collection, records: Vec<Value>) {
    let name = collection.name();
    match collection {
        Collection::Users => dataset.users = decode_records(name, records),
        Collection::Properties => dataset.properties = decode_records(name, records),
        Collection::Leads => dataset.leads = decode_records(name, records),
        Collection::Agencies => dataset.agencies = decode_records(name, records),
        Collection::Transactions => dataset.transactions = decode_records(name, records),
        Collection::Payments => dataset.payments = decode_records(name, records),
    }
}

/// Keep only records owned by `agency_id`, for servers that ignore the
/// `agency` parameter. Records without an agency reference are dropped.
fn apply_scope(dataset: &mut Dataset, agency_id: &str) {
    dataset.users.retain(|u| u.agency.points_to(agency_id));
    dataset.properties.retain(|p| p.agency.points_to(agency_id));
    dataset.leads.retain(|l| l.agency.points_to(agency_id));
    dataset.agencies.retain(|a| a.id.points_to(agency_id));
}
