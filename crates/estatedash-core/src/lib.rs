//! estatedash-core - Core library for estatedash
//!
//! Provides models, the data fetcher, the fenced report store, report
//! analytics, CSV/JSON export and view filters for the CRM dashboards.

pub mod analytics;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod fetcher;
pub mod models;
pub mod store;
pub mod view;

pub use analytics::{Period, ReportData, ReportKind};
pub use config::{ClientConfig, Preferences};
pub use error::{CoreError, DegradedState, LoadReport};
pub use event::{EventBus, ReportEvent};
pub use export::{export_report_csv, export_report_json, export_to_csv, ExportError};
pub use fetcher::{DataFetcher, EntitySource, FetchScope, HttpSource};
pub use store::{LoadStatus, ReportStore};
pub use view::{Filterable, ReportFilter, ViewState};
