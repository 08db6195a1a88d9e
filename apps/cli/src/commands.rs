//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use coursegeo_core::fetch::fetch_courses;
use coursegeo_core::pipeline::{ProgressReporter, RunReport, progress_line, run_pipeline};
use coursegeo_core::report::{DatasetSummary, summarize};
use coursegeo_core::resolver::RowOutcome;
use coursegeo_dataset::load_dataset;
use coursegeo_geocoder::{FixedDelay, NominatimGeocoder};
use coursegeo_shared::{
    AppConfig, FetchConfig, PipelineConfig, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// coursegeo: attach coordinates to university course listings.
#[derive(Parser)]
#[command(
    name = "coursegeo",
    version,
    about = "Geocode the institutions in a course dataset and write CSV + xlsx outputs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.coursegeo/coursegeo.toml.
    #[arg(long, global = true, env = "COURSEGEO_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Download the public course list and save it as a spreadsheet.
    Fetch {
        /// Course list URL.
        #[arg(long)]
        url: Option<Url>,

        /// Spreadsheet to write (a CSV sibling is written next to it).
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Column to match keywords against.
        #[arg(long, requires = "contains")]
        filter_column: Option<String>,

        /// Keep rows whose filter column contains this keyword (repeatable).
        #[arg(long = "contains", requires = "filter_column")]
        contains: Vec<String>,
    },

    /// Geocode every row and write enriched CSV and xlsx files.
    Geocode {
        /// Dataset to enrich (CSV or spreadsheet).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// CSV output path.
        #[arg(long)]
        csv_out: Option<PathBuf>,

        /// Spreadsheet output path.
        #[arg(long)]
        xlsx_out: Option<PathBuf>,

        /// Column holding institution names.
        #[arg(long)]
        name_column: Option<String>,

        /// Locality appended to every query (empty string disables it).
        #[arg(long)]
        country: Option<String>,

        /// Pause between queries in milliseconds.
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Discard matches whose importance is below this value.
        #[arg(long)]
        min_importance: Option<f64>,
    },

    /// Show coordinate coverage of an enriched dataset.
    Summary {
        /// Dataset to inspect (defaults to the CSV output).
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of preview rows.
        #[arg(long, default_value = "10")]
        rows: usize,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "coursegeo=info",
        1 => "coursegeo=debug",
        _ => "coursegeo=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Command::Fetch {
            url,
            out,
            filter_column,
            contains,
        } => cmd_fetch(config_path, url, out, filter_column, contains).await,
        Command::Geocode {
            input,
            csv_out,
            xlsx_out,
            name_column,
            country,
            delay_ms,
            timeout_secs,
            min_importance,
        } => {
            let overrides = GeocodeOverrides {
                input,
                csv_out,
                xlsx_out,
                name_column,
                country,
                delay_ms,
                timeout_secs,
                min_importance,
            };
            cmd_geocode(config_path, overrides).await
        }
        Command::Summary { input, rows } => cmd_summary(config_path, input, rows).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_fetch(
    config_path: Option<&Path>,
    url: Option<Url>,
    out: Option<PathBuf>,
    filter_column: Option<String>,
    contains: Vec<String>,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let mut fetch = FetchConfig::from(&config);

    if let Some(url) = url {
        fetch.url = url;
    }
    if let Some(out) = out {
        fetch.outputs.csv = out.with_extension("csv");
        fetch.outputs.xlsx = out;
    }
    fetch.filter_column = filter_column;
    fetch.keywords = contains;

    info!(url = %fetch.url, "fetching course list");
    let result = fetch_courses(&fetch).await?;

    println!();
    println!("  Course list saved!");
    println!("  Records:  {}", result.fetched);
    if fetch.filter_column.is_some() {
        println!("  Kept:     {}", result.kept);
    }
    println!("  Columns:  {}", result.columns);
    println!("  xlsx:     {}", result.outputs.xlsx.display());
    println!("  csv:      {}", result.outputs.csv.display());
    println!();

    Ok(())
}

/// Flag values layered over the `[defaults]` and `[geocoder]` sections.
struct GeocodeOverrides {
    input: Option<PathBuf>,
    csv_out: Option<PathBuf>,
    xlsx_out: Option<PathBuf>,
    name_column: Option<String>,
    country: Option<String>,
    delay_ms: Option<u64>,
    timeout_secs: Option<u64>,
    min_importance: Option<f64>,
}

async fn cmd_geocode(config_path: Option<&Path>, overrides: GeocodeOverrides) -> Result<()> {
    let mut config = resolve_config(config_path)?;

    if let Some(secs) = overrides.timeout_secs {
        config.geocoder.timeout_secs = secs;
    }
    if let Some(ms) = overrides.delay_ms {
        config.geocoder.rate_limit_ms = ms;
    }
    if overrides.min_importance.is_some() {
        config.geocoder.min_importance = overrides.min_importance;
    }

    let mut pipeline = PipelineConfig::from(&config);
    if let Some(input) = overrides.input {
        pipeline.input = input;
    }
    if let Some(csv) = overrides.csv_out {
        pipeline.outputs.csv = csv;
    }
    if let Some(xlsx) = overrides.xlsx_out {
        pipeline.outputs.xlsx = xlsx;
    }
    if let Some(column) = overrides.name_column {
        pipeline.name_column = column;
    }
    if let Some(country) = overrides.country {
        pipeline.country_hint = country;
    }

    let geocoder = NominatimGeocoder::new(&config.geocoder)?;
    let limiter = FixedDelay::from_millis(config.geocoder.rate_limit_ms);

    info!(
        input = %pipeline.input.display(),
        geocoder = %geocoder.search_url(),
        delay_ms = limiter.delay().as_millis(),
        "starting enrichment"
    );

    let cancel = CancellationToken::new();
    spawn_ctrl_c_handler(cancel.clone());

    let reporter = CliProgress::new()?;
    let report = run_pipeline(&pipeline, &geocoder, &limiter, &cancel, &reporter).await?;

    println!();
    if report.cancelled {
        println!("  Geocoding interrupted; partial results saved.");
    } else {
        println!("  Geocoding complete!");
    }
    println!("  Rows:       {}", report.rows);
    println!("  Processed:  {}", report.processed);
    println!("  Resolved:   {}", report.resolved);
    println!("  Unresolved: {}", report.unresolved);
    println!("  csv:        {}", report.outputs.csv.display());
    println!("  xlsx:       {}", report.outputs.xlsx.display());
    println!("  Elapsed:    {:.1}s", report.elapsed.as_secs_f64());
    print_summary(&report.summary);

    Ok(())
}

async fn cmd_summary(
    config_path: Option<&Path>,
    input: Option<PathBuf>,
    rows: usize,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let path = input.unwrap_or(config.defaults.csv_output);

    let dataset = load_dataset(&path)?;
    let summary = summarize(&dataset, &config.defaults.name_column, rows);

    println!();
    println!("  {}", path.display());
    print_summary(&summary);

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(summary: &DatasetSummary) {
    println!();
    println!("  With coordinates:    {}", summary.with_coordinates);
    println!("  Without coordinates: {}", summary.without_coordinates);

    if !summary.preview.is_empty() {
        println!();
        for row in &summary.preview {
            match row.point {
                Some(point) => println!("  {:<40} {point}", row.name),
                None => println!("  {:<40} -", row.name),
            }
        }
    }
    println!();
}

/// Cancel `token` on the first Ctrl-C; exit immediately on the second.
fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            if token.is_cancelled() {
                warn!("second interrupt, exiting without writing outputs");
                std::process::exit(130);
            }
            warn!("interrupt received, finishing current row (Ctrl-C again to abort)");
            token.cancel();
        }
    });
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .map_err(|e| eyre!("invalid progress template: {e}"))?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { bar })
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    // The per-row line is logged by `run_pipeline`.
    fn row_done(&self, outcome: &RowOutcome, current: usize, total: usize) {
        self.bar.set_message(progress_line(outcome, current, total));
    }

    fn done(&self, _report: &RunReport) {
        self.bar.finish_and_clear();
    }
}
