//! # booking-forecast
//!
//! Command-line front end: grid search over seasonal transforms and models
//! for every hotel and market segment in a booking file.

use booking_forecast::config::PipelineConfig;
use booking_forecast::core::SeriesKey;
use booking_forecast::grid::report;
use booking_forecast::models::ModelRegistry;
use booking_forecast::pipeline::Pipeline;
use booking_forecast::seasonality::SeasonalRegistry;
use booking_forecast::{ForecastError, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "booking-forecast")]
#[command(about = "Pick the best seasonal transform and model per hotel segment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the grid and report the best configuration per series
    Run {
        /// Booking CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// JSON configuration; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Held-out window in days
        #[arg(long)]
        horizon: Option<usize>,

        /// Per-job fit budget in seconds
        #[arg(long)]
        timeout_secs: Option<f64>,

        /// Worker threads
        #[arg(long)]
        threads: Option<usize>,

        /// Seasonal transforms to try (comma separated)
        #[arg(long, value_delimiter = ',')]
        seasonal: Option<Vec<String>>,

        /// Models to try (comma separated)
        #[arg(long, value_delimiter = ',')]
        models: Option<Vec<String>>,

        /// Market segment words to keep (comma separated)
        #[arg(long, value_delimiter = ',')]
        segments: Option<Vec<String>>,

        /// Count cancelled bookings as demand
        #[arg(long)]
        include_canceled: bool,

        /// Ranked table of every job
        #[arg(long)]
        ranked_out: Option<PathBuf>,

        /// Best configuration per series
        #[arg(long)]
        best_out: Option<PathBuf>,

        /// Series to export, as "hotel/segment"
        #[arg(long, requires = "forecast_out")]
        forecast_series: Option<String>,

        /// Held-out actuals and forecast of --forecast-series
        #[arg(long, requires = "forecast_series")]
        forecast_out: Option<PathBuf>,
    },

    /// List registered seasonal transforms and models
    List,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booking_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(class = ?err.class(), "{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::List => {
            println!("Seasonal transforms:");
            for spec in SeasonalRegistry::standard().iter() {
                println!("  {}", spec.name);
            }
            println!("Models:");
            for spec in ModelRegistry::standard().iter() {
                println!("  {}", spec.name);
            }
            Ok(())
        }
        Commands::Run {
            input,
            config,
            horizon,
            timeout_secs,
            threads,
            seasonal,
            models,
            segments,
            include_canceled,
            ranked_out,
            best_out,
            forecast_series,
            forecast_out,
        } => {
            let mut config = match config {
                Some(path) => PipelineConfig::from_json_file(path)?,
                None => PipelineConfig::default(),
            };
            config.input = Some(input);
            if let Some(horizon) = horizon {
                config.horizon = horizon;
            }
            if timeout_secs.is_some() {
                config.fit_timeout_secs = timeout_secs;
            }
            if threads.is_some() {
                config.threads = threads;
            }
            if let Some(seasonal) = seasonal {
                config.seasonal = seasonal;
            }
            if let Some(models) = models {
                config.models = models;
            }
            if let Some(segments) = segments {
                config.segments = segments;
            }
            config.include_canceled |= include_canceled;

            // Fail on a malformed key before the grid runs.
            let forecast_key = forecast_series.as_deref().map(SeriesKey::parse).transpose()?;

            let output = Pipeline::new(config).run()?;
            let selection = &output.selection;

            print!("{}", report::summary(selection));

            if let Some(path) = ranked_out {
                report::write_ranked_csv(&path, &report::ranked_rows(selection))?;
                info!(path = %path.display(), "wrote ranked results");
            }
            if let Some(path) = best_out {
                report::write_best_csv(&path, selection.best())?;
                info!(path = %path.display(), "wrote best configurations");
            }
            if let (Some(key), Some(path)) = (forecast_key, forecast_out) {
                let best = selection.get(&key).ok_or_else(|| {
                    ForecastError::InvalidParameter(format!("no series {key} in the input"))
                })?;
                report::write_forecast_csv(&path, best)?;
                info!(path = %path.display(), %key, "wrote forecast");
            }
            Ok(())
        }
    }
}
