//! CLI entry point for the traffic insights tool.
//!
//! Loads a traffic-sensor CSV export, prints hourly, day-type and weather
//! insights, and renders the summary charts.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use traffic_insights::{
    analyzers::aggregate::summarize,
    charts::{register_font, render_all},
    output::{COMPLETION_LINE, log_pretty, print_insights, print_inspection, print_json},
    parser::{ColumnLayout, DEFAULT_SAMPLE_LIMIT, Ingested, VolumeColumn, load_file},
};

#[derive(Parser)]
#[command(name = "traffic_insights")]
#[command(about = "Traffic volume insights from sensor CSV exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a CSV export, print insights and write the charts
    Analyze {
        /// CSV export to read
        #[arg(value_name = "FILE", default_value = "TrafficVolumeData.csv")]
        input: PathBuf,

        /// Directory the charts are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Number of skipped rows to show
        #[arg(short, long, default_value_t = DEFAULT_SAMPLE_LIMIT)]
        samples: usize,

        /// Print the summary as JSON instead of insight lines
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Skip chart rendering
        #[arg(long, default_value_t = false)]
        no_charts: bool,

        /// TrueType font for chart text
        #[arg(long)]
        font: Option<PathBuf>,
    },
    /// Validate a CSV export and list rejected rows without aggregating
    Inspect {
        /// CSV export to read
        #[arg(value_name = "FILE", default_value = "TrafficVolumeData.csv")]
        input: PathBuf,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Number of rejected rows to list
        #[arg(short, long, default_value_t = 20)]
        samples: usize,
    },
}

/// Column positions (0-based) of the extracted fields.
#[derive(Args)]
struct ColumnArgs {
    #[arg(long, default_value_t = 0)]
    timestamp_column: usize,

    #[arg(long, default_value_t = 9)]
    rain_column: usize,

    #[arg(long, default_value_t = 10)]
    snow_column: usize,

    /// Traffic volume column; the last field of each row when omitted
    #[arg(long)]
    volume_column: Option<usize>,
}

impl From<&ColumnArgs> for ColumnLayout {
    fn from(args: &ColumnArgs) -> Self {
        ColumnLayout {
            timestamp: args.timestamp_column,
            rainfall: args.rain_column,
            snowfall: args.snow_column,
            volume: args
                .volume_column
                .map_or(VolumeColumn::Last, VolumeColumn::Index),
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/traffic_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_insights.log"));

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

    match cli.command {
        Commands::Analyze {
            input,
            output_dir,
            columns,
            samples,
            json,
            no_charts,
            font,
        } => {
            let ingested = ingest(&input, &(&columns).into(), samples)?;
            let summary = summarize(&input.display().to_string(), ingested);
            log_pretty(&summary);

            if json {
                print_json(&summary)?;
            } else {
                print_insights(&summary);
            }

            if no_charts {
                info!("Chart rendering disabled");
            } else {
                let with_text = register_font(font.as_deref());
                let paths = render_all(&summary, &output_dir, with_text)?;
                for path in &paths {
                    info!(path = %path.display(), "Chart saved");
                }
                if json {
                    info!("{COMPLETION_LINE}");
                } else {
                    println!("{COMPLETION_LINE}");
                }
            }
        }
        Commands::Inspect {
            input,
            columns,
            samples,
        } => {
            let ingested = ingest(&input, &(&columns).into(), samples)?;
            print_inspection(&input.display().to_string(), &ingested);
        }
    }

    Ok(())
}

/// Loads `input`, logging fatal ingestion errors before they end the run.
fn ingest(input: &Path, layout: &ColumnLayout, samples: usize) -> Result<Ingested> {
    load_file(input, layout, samples).map_err(|e| {
        error!(error = %e, "Ingestion failed");
        e.into()
    })
}
