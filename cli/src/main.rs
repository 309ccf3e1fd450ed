//! Fluxwatch CLI
//!
//! Reports how long ago each measurement of an InfluxDB server last received
//! data.
//!
//! # Usage
//!
//! ```bash
//! fluxwatch --help
//! fluxwatch databases
//! fluxwatch --interval 120 check
//! fluxwatch check --database telegraf --measurement cpu --format json
//! ```

#![deny(unsafe_code)]

mod output;

use anyhow::{Context, Result};
use clap::builder::BoolishValueParser;
use clap::{Args, Parser, Subcommand, ValueEnum};
use shared::client::InfluxClient;
use shared::config::{CheckConfig, ConnectionConfig, NormalizeOptions, DEFAULT_INTERVAL_MINUTES};
use shared::models::MeasurementRef;
use shared::staleness::StalenessReporter;
use tracing_subscriber::EnvFilter;

/// Fluxwatch - InfluxDB measurement staleness reporter
#[derive(Debug, Parser)]
#[command(name = "fluxwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Lookback window in minutes
    #[arg(short, long, global = true, default_value_t = DEFAULT_INTERVAL_MINUTES)]
    interval: u32,

    /// Database to leave out (repeatable)
    #[arg(long = "exclude", global = true, default_value = "_internal")]
    exclude: Vec<String>,

    /// Whole-hour offset applied to every timestamp before comparison
    #[arg(long, global = true, default_value_t = 0, allow_hyphen_values = true)]
    timezone_offset: i32,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Connection flags, each falling back to its environment variable.
#[derive(Debug, Args)]
struct ConnectionArgs {
    /// Server host
    #[arg(long, env = "FLUXWATCH_HOST", default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, env = "FLUXWATCH_PORT", default_value_t = 8086)]
    port: u16,

    /// Username
    #[arg(short, long, env = "FLUXWATCH_USER", default_value = "")]
    username: String,

    /// Password
    #[arg(long, env = "FLUXWATCH_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Connect over HTTPS
    #[arg(long, env = "FLUXWATCH_SSL", value_parser = BoolishValueParser::new())]
    ssl: bool,

    /// Verify the server certificate
    #[arg(long, env = "FLUXWATCH_VERIFY_SSL", value_parser = BoolishValueParser::new())]
    verify_ssl: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "FLUXWATCH_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,
}

impl ConnectionArgs {
    fn to_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            timeout_secs: self.timeout_secs,
            ..ConnectionConfig::new(self.host.clone(), self.port)
                .with_credentials(self.username.clone(), self.password.clone())
                .with_ssl(self.ssl, self.verify_ssl)
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List databases, minus exclusions
    Databases,
    /// List the measurements of every database
    Measurements,
    /// Report staleness of one measurement or of every measurement
    Check {
        /// Database of the measurement to check
        #[arg(short, long, requires = "measurement")]
        database: Option<String>,

        /// Measurement to check
        #[arg(short, long, requires = "database")]
        measurement: Option<String>,

        /// Mark rows whose latest point is older than this many minutes
        #[arg(long)]
        stale_after: Option<f64>,
    },
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Aligned columns
    Text,
    /// Pretty-printed JSON
    Json,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.log_json);

    run(cli)
}

fn init_tracing(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let connection = cli.connection.to_config();
    connection
        .validate_config()
        .context("Invalid connection settings")?;

    let check = CheckConfig {
        interval_minutes: cli.interval,
        exclude_databases: cli.exclude,
    };
    check.validate_config().context("Invalid check settings")?;

    let normalize = NormalizeOptions::default().with_timezone_offset(cli.timezone_offset);

    tracing::debug!(
        address = %connection.base_url(),
        interval_minutes = check.interval_minutes,
        excluded = ?check.exclude_databases,
        "Starting"
    );

    let mut reporter = StalenessReporter::new(InfluxClient::new(&connection))
        .with_normalize_options(normalize.clone());

    let rendered = match cli.command.unwrap_or(Commands::Check {
        database: None,
        measurement: None,
        stale_after: None,
    }) {
        Commands::Databases => {
            let databases = reporter
                .list_databases(&check.exclude_databases)
                .context("Failed to list databases")?;
            output::render_databases(&databases, cli.format)?
        }
        Commands::Measurements => {
            let enumeration = reporter
                .enumerate(&check.exclude_databases)
                .context("Failed to enumerate measurements")?;
            output::render_enumeration(&enumeration, cli.format)?
        }
        Commands::Check {
            database: Some(database),
            measurement: Some(measurement),
            stale_after,
        } => {
            let target = MeasurementRef::new(database, measurement);
            let report = reporter
                .check(&target, check.interval_minutes)
                .with_context(|| format!("Failed to check {target}"))?;
            let view = output::View::new(cli.format, &normalize, stale_after);
            output::render_reports(std::slice::from_ref(&report), &[], &[], &view)?
        }
        Commands::Check { stale_after, .. } => {
            let enumeration = reporter
                .enumerate(&check.exclude_databases)
                .context("Failed to enumerate measurements")?;
            let batch = reporter.run(&enumeration.catalog, check.interval_minutes);
            let view = output::View::new(cli.format, &normalize, stale_after);
            output::render_reports(&batch.reports, &batch.skipped, &enumeration.failures, &view)?
        }
    };

    print!("{rendered}");
    Ok(())
}
