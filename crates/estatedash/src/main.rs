//! estatedash - Real-estate CRM reporting dashboard

mod cli;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use estatedash_core::config::DEFAULT_PAGE_SIZE;
use estatedash_core::{
    ClientConfig, DataFetcher, ExportError, FetchScope, Period, Preferences, ReportData,
    ReportKind, ReportStore, ViewState, export_report_csv, export_report_json,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "estatedash",
    version,
    about = "Reporting dashboard for a real-estate CRM",
    long_about = "Interactive TUI and command-line reports over a real-estate CRM API.\n\
                  \n\
                  Reports: overview, lead-funnel, agent-performance, agency-health,\n\
                  campaigns, follow-ups, site-visits, revenue.\n\
                  \n\
                  Examples:\n\
                    estatedash                                   # Run TUI (default)\n\
                    estatedash report lead-funnel -p 7d          # Print a report\n\
                    estatedash report agency-health --json       # Report as JSON\n\
                    estatedash export campaigns -o ./exports     # Write campaigns-export-<date>.csv\n\
                    estatedash prefs --period 90d                # Remember a default period\n\
                  \n\
                  Environment Variables:\n\
                    ESTATEDASH_API_URL               # API root (default: http://localhost:5000/api)\n\
                    ESTATEDASH_TOKEN                 # Bearer token\n\
                    ESTATEDASH_AGENCY                # Limit every report to one agency\n\
                    ESTATEDASH_NO_COLOR              # Disable ANSI colors (log-friendly)\n\
                    RUST_LOG                         # Log filter, e.g. debug or estatedash_core=info"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// CRM API root
    #[arg(
        long,
        env = "ESTATEDASH_API_URL",
        default_value = "http://localhost:5000/api",
        global = true
    )]
    api_url: String,

    /// Bearer token for the API
    #[arg(long, env = "ESTATEDASH_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Limit reports to one agency id
    #[arg(long, env = "ESTATEDASH_AGENCY", global = true)]
    agency: Option<String>,

    /// Records requested per collection
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE, global = true)]
    page_size: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "15", global = true)]
    timeout: u64,

    /// Timeout for a whole report batch in seconds
    #[arg(long, default_value = "30", global = true)]
    batch_timeout: u64,

    /// Preferences directory (default: <config dir>/estatedash)
    #[arg(long, env = "ESTATEDASH_CONFIG_DIR", global = true)]
    config_dir: Option<PathBuf>,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "ESTATEDASH_NO_COLOR", global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Run TUI interface (default)
    Tui {
        /// Report to open first
        #[arg(long, short = 'r')]
        report: Option<ReportKind>,
        /// Period: 7d, 30d, 90d, 1y
        #[arg(long, short = 'p')]
        period: Option<String>,
    },
    /// Print one report and exit
    Report {
        /// Report slug (see `estatedash reports`)
        report: ReportKind,
        /// Period: 7d, 30d, 90d, 1y
        #[arg(long, short = 'p')]
        period: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available reports
    Reports,
    /// Export a report table to a file
    Export {
        /// Report slug (see `estatedash reports`)
        report: ReportKind,
        /// Period: 7d, 30d, 90d, 1y
        #[arg(long, short = 'p')]
        period: Option<String>,
        /// Output directory (default: preferences export_dir, else current dir)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
        /// File format
        #[arg(long, value_parser = ["csv", "json"], default_value = "csv")]
        format: String,
    },
    /// Show or update saved preferences
    Prefs {
        /// Default period
        #[arg(long)]
        period: Option<String>,
        /// Report opened on start
        #[arg(long)]
        report: Option<ReportKind>,
        /// Default export directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let config_dir = cli
        .config_dir
        .clone()
        .or_else(Preferences::default_dir)
        .context("Could not determine config directory (use --config-dir)")?;
    let prefs = Preferences::load(&config_dir);

    let mode = cli.mode.take().unwrap_or(Mode::Tui {
        report: None,
        period: None,
    });
    let is_tui = matches!(mode, Mode::Tui { .. });
    init_logging(&config_dir, is_tui);

    let config = ClientConfig::new(cli.api_url.clone())
        .with_token(cli.token.clone())
        .with_page_size(cli.page_size)
        .with_timeouts(
            Duration::from_secs(cli.timeout),
            Duration::from_secs(cli.batch_timeout),
        );
    debug!(
        api = %config.base_url,
        page_size = config.page_size,
        agency = ?cli.agency,
        "Client configured"
    );

    let scope = cli
        .agency
        .as_deref()
        .map(FetchScope::agency)
        .unwrap_or_default();

    match mode {
        Mode::Tui { report, period } => {
            let kind = report.unwrap_or_else(|| prefs.report());
            let period = resolve_period(period.as_deref(), &prefs);
            run_tui(&config, ViewState::new(kind, period, scope), prefs.export_dir()).await?;
        }
        Mode::Report {
            report,
            period,
            json,
        } => {
            let period = resolve_period(period.as_deref(), &prefs);
            let data = load_report(&config, report, period, &scope).await?;
            let output = cli::format_report(&data, period, json, cli.no_color)
                .context("Failed to render report")?;
            println!("{}", output);
        }
        Mode::Reports => {
            println!("{}", cli::format_report_list(cli.no_color));
        }
        Mode::Export {
            report,
            period,
            out,
            format,
        } => {
            let period = resolve_period(period.as_deref(), &prefs);
            let dir = out.unwrap_or_else(|| prefs.export_dir());
            let data = load_report(&config, report, period, &scope).await?;
            let path = run_export(&data, &dir, &format)?;
            println!("Exported {}", path.display());
        }
        Mode::Prefs {
            period,
            report,
            export_dir,
        } => {
            run_prefs(&config_dir, prefs, period, report, export_dir)?;
        }
    }

    Ok(())
}

/// Logs go to `<config dir>/estatedash.log` under the TUI, stderr otherwise.
/// Filter from RUST_LOG, default `warn`.
fn init_logging(config_dir: &Path, to_file: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    if to_file {
        let file = std::fs::create_dir_all(config_dir)
            .and_then(|_| std::fs::File::create(config_dir.join("estatedash.log")));
        if let Ok(file) = file {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        // No log file means no logging: stderr would tear the TUI
        return;
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_period(flag: Option<&str>, prefs: &Preferences) -> Period {
    flag.map(Period::parse).unwrap_or_else(|| prefs.period())
}

async fn run_tui(config: &ClientConfig, view: ViewState, export_dir: PathBuf) -> Result<()> {
    let fetcher = DataFetcher::from_config(config).context("Invalid API configuration")?;
    let store = Arc::new(ReportStore::new());

    // Run TUI (shows the loading screen until the first batch settles)
    estatedash_tui::run(store, fetcher, view, export_dir).await
}

async fn load_report(
    config: &ClientConfig,
    kind: ReportKind,
    period: Period,
    scope: &FetchScope,
) -> Result<ReportData> {
    let fetcher = DataFetcher::from_config(config).context("Invalid API configuration")?;
    let outcome = fetcher
        .fetch(kind, period, scope)
        .await
        .with_context(|| format!("Failed to load {} report", kind.slug()))?;

    for line in cli::format_load_warnings(&outcome.report) {
        eprintln!("{}", line);
    }

    Ok(ReportData::compute(
        outcome.kind,
        &outcome.dataset,
        outcome.period,
        outcome.fetched_at,
    ))
}

fn run_export(report: &ReportData, dir: &Path, format: &str) -> Result<PathBuf> {
    let date = chrono::Local::now().date_naive();
    let result = match format {
        "json" => export_report_json(report, dir, date),
        _ => export_report_csv(report, dir, date),
    };

    match result {
        Ok(path) => {
            info!(path = %path.display(), report = report.kind().slug(), "Report exported");
            Ok(path)
        }
        Err(ExportError::EmptyDataset) => {
            anyhow::bail!("Nothing to export: {} has no rows for this period", report.kind().slug())
        }
        Err(e) => Err(e).context("Export failed"),
    }
}

fn run_prefs(
    config_dir: &Path,
    mut prefs: Preferences,
    period: Option<String>,
    report: Option<ReportKind>,
    export_dir: Option<PathBuf>,
) -> Result<()> {
    let changed = period.is_some() || report.is_some() || export_dir.is_some();

    if let Some(period) = period {
        prefs.default_period = Period::parse(&period).label().to_string();
    }
    if let Some(report) = report {
        prefs.default_report = report.slug().to_string();
    }
    if let Some(dir) = export_dir {
        prefs.export_dir = Some(dir);
    }

    if changed {
        prefs.save(config_dir)?;
    }

    println!("Preferences ({})", config_dir.display());
    println!("  Default period:  {}", prefs.period().display());
    println!("  Default report:  {}", prefs.report().slug());
    println!("  Export dir:      {}", prefs.export_dir().display());
    Ok(())
}
