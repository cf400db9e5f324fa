//! CLI entry point for the county statistics reporter.
//!
//! Provides subcommands for the daily summary run, regional aggregate
//! export, and NYT county series processing.

mod infra;
mod services;

use crate::infra::email::smtp::SmtpMailer;
use crate::infra::facebook::client::GraphApiClient;
use crate::infra::keys::Credentials;
use crate::services::publisher::{FeedPublisher, Mailer};
use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use covid_stats::{
    charts::ChartRenderer,
    config::{Config, ConfigStore},
    fetch::{BasicClient, fetch_table},
    nyt,
    output::{append_records, print_json, write_records},
    pipeline::{self, DailySummary, fetch_cases, fetch_inputs, positivity_by_county, summarize},
    report,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_stats")]
#[command(about = "Daily county COVID-19 statistics summary and publisher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest data, build the daily summary and publish it
    Report {
        /// YAML configuration file (also stores the last reported dates)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// JSON file holding publisher credentials
        #[arg(long, default_value = "credentials.json")]
        credentials: String,
    },
    /// Compute regional aggregates and append them to a CSV file
    Regional {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// CSV file to append results to
        #[arg(short, long, default_value = "regional.csv")]
        output: PathBuf,
    },
    /// Merge the NYT live and historical county files for the tracked counties
    Nyt {
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/covid_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            config,
            credentials,
        } => run_report(&config, &credentials).await,
        Commands::Regional { config, output } => run_regional(&config, &output).await,
        Commands::Nyt { config } => run_nyt(&config).await,
    };

    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "Run failed");
    }
    result
}

/// The daily pass: fetch, summarize, publish, then render charts.
#[tracing::instrument(skip_all, fields(config = %config_path.display()))]
async fn run_report(config_path: &Path, credentials: &str) -> Result<()> {
    let mut store = ConfigStore::load(config_path).context("failed to load config")?;
    let config = store.config().clone();

    let client = BasicClient::new();
    let inputs = fetch_inputs(&client, &config).await?;

    let now = Local::now().naive_local();
    let summary = summarize(&config, &inputs, &mut store, now);
    debug!(summary = %summary.text, "Summary assembled");

    if summary.should_publish(&config) {
        publish(&config, credentials, &summary, now).await;
    } else {
        info!("No new data; skipping publish");
    }

    render_charts(&config, &summary);

    info!("Report complete");
    Ok(())
}

/// Sends the summary to each enabled publisher. Failures are logged so one
/// publisher cannot stop the other.
async fn publish(config: &Config, credentials: &str, summary: &DailySummary, now: chrono::NaiveDateTime) {
    if !config.post_to_facebook && !config.send_email {
        return;
    }

    let creds = match Credentials::load(credentials) {
        Ok(creds) => creds,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Cannot publish without credentials");
            return;
        }
    };

    if config.post_to_facebook {
        let result = match creds.facebook_access_token() {
            Ok(token) => {
                let client = GraphApiClient::new(BasicClient::new(), token.to_string());
                client
                    .post(config.group(), &summary.text, &config.link)
                    .await
                    .map(|_| ())
            }
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!(error = %format!("{e:#}"), "Feed post failed");
        }
    }

    if config.send_email {
        let result = creds
            .gmail()
            .and_then(|(user, password)| SmtpMailer::gmail(user, password))
            .and_then(|mailer| mailer.send(&report::subject(now), &summary.text));
        match result {
            Ok(()) => info!("Email sent"),
            Err(e) => error!(error = %format!("{e:#}"), "Email failed"),
        }
    }
}

/// Renders the charts enabled in `config`. Rendering errors are logged.
fn render_charts(config: &Config, summary: &DailySummary) {
    let renderer = ChartRenderer::new(&config.chart_dir, config.chart_since);
    let records = &summary.positivity;

    if config.generate_bullet {
        if let Err(e) = renderer.positivity_bullets(records, &config.counties) {
            warn!(error = %format!("{e:#}"), "Bullet chart failed");
        }
    }
    if config.generate_line {
        if let Err(e) = renderer.positivity_lines(records, &config.counties) {
            warn!(error = %format!("{e:#}"), "Line chart failed");
        }
    }
    if config.generate_xkcd_graph {
        if let Err(e) = renderer.active_cases(records, &config.primary_county) {
            warn!(error = %format!("{e:#}"), "Active cases chart failed");
        }
    }
    if config.generate_state_map || config.generate_regional_map {
        warn!("Map rendering is not supported; skipping");
    }
}

/// Appends the pairwise and all-county aggregates to `output`.
#[tracing::instrument(skip_all, fields(config = %config_path.display(), output = %output.display()))]
async fn run_regional(config_path: &Path, output: &Path) -> Result<()> {
    let config = ConfigStore::load(config_path)
        .context("failed to load config")?
        .config()
        .clone();

    let client = BasicClient::new();
    let cases = fetch_cases(&client, &config).await?;
    let positivity = positivity_by_county(&cases, &config.counties, config.rolling_window);
    let aggregates = pipeline::regional(&positivity, &config);

    if let Some(latest) = aggregates.first() {
        print_json(latest)?;
    }
    append_records(output, &aggregates)?;

    info!(rows = aggregates.len(), "Regional aggregates written");
    Ok(())
}

/// Writes the merged NYT series for the configured states and counties.
#[tracing::instrument(skip_all, fields(config = %config_path.display()))]
async fn run_nyt(config_path: &Path) -> Result<()> {
    let store = ConfigStore::load(config_path).context("failed to load config")?;
    let Some(nyt_config) = store.config().nyt.clone() else {
        bail!("config has no `nyt` section");
    };

    let client = BasicClient::new();
    let (index, hints) = nyt::table_layout();

    let live = fetch_table(&client, &nyt_config.live_url, &index, &hints).await?;
    let historical = fetch_table(&client, &nyt_config.historical_url, &index, &hints).await?;

    let merged = nyt::merge(
        nyt::from_table(&historical)?,
        nyt::from_table(&live)?,
        &nyt_config.states,
    );

    for (state, counties) in &nyt_config.states {
        for county in counties {
            let rows = merged
                .iter()
                .filter(|d| &d.state == state && &d.county == county)
                .count();
            info!(state = %state, county = %county, rows, "County series merged");
        }
    }

    write_records(&nyt_config.output, &merged)?;
    info!(output = %nyt_config.output.display(), rows = merged.len(), "NYT series written");
    Ok(())
}
