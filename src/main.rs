use cheap_stop::utils::distance_cache::DEFAULT_CAPACITY;
use cheap_stop::{
    plan_route, DistanceCache, Objective, OptimizerConfig, RouteOptimizer, RouteRequest,
};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(
    name = "cheap-stop",
    about = "Order the stores of a shopping trip into the shortest route",
    version
)]
struct Cli {
    /// JSON route request: `userLocation` and the selected `products`.
    #[arg(value_name = "request.json")]
    request: PathBuf,

    /// JSON optimizer configuration; flags below override its fields.
    #[arg(long, value_name = "path")]
    config: Option<PathBuf>,

    /// Distance cache file, loaded before routing and saved afterwards.
    #[arg(long, value_name = "path")]
    cache: Option<PathBuf>,

    /// Largest stop count solved exactly.
    #[arg(long, value_name = "stops")]
    threshold: Option<usize>,

    /// Wall-clock budget for the optimization, in milliseconds.
    #[arg(long = "budget-ms", value_name = "ms")]
    budget_ms: Option<u64>,

    /// Minimize total `distance` or total `duration`.
    #[arg(long)]
    objective: Option<Objective>,

    /// Base URL of an OSRM server used for road distances.
    #[cfg(feature = "osrm")]
    #[arg(long = "osrm-url", value_name = "url")]
    osrm_url: Option<String>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON for this input")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Route(#[from] cheap_stop::Error),

    #[error("failed to encode the response")]
    Encode(#[source] serde_json::Error),

    #[cfg(feature = "osrm")]
    #[error("failed to set up the OSRM client")]
    Osrm(#[from] reqwest::Error),
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_config(cli: &Cli) -> Result<OptimizerConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => read_json(path)?,
        None => OptimizerConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config = config.with_exact_threshold(threshold);
    }
    if let Some(budget_ms) = cli.budget_ms {
        config = config.with_time_budget(Duration::from_millis(budget_ms));
    }
    if let Some(objective) = cli.objective {
        config = config.with_objective(objective);
    }
    Ok(config)
}

// Remote lookups are fanned out on the rayon pool from this node count
#[cfg(feature = "osrm")]
const REMOTE_PARALLEL_THRESHOLD: usize = 2;

#[cfg(feature = "osrm")]
fn build_optimizer(cli: &Cli, config: OptimizerConfig) -> Result<RouteOptimizer, CliError> {
    use cheap_stop::utils::osrm::OsrmProvider;

    match &cli.osrm_url {
        Some(url) => {
            let threshold = config.parallel_threshold.min(REMOTE_PARALLEL_THRESHOLD);
            let provider = OsrmProvider::new(url.as_str())?;
            Ok(RouteOptimizer::new(config.with_parallel_threshold(threshold)).with_provider(provider))
        }
        None => Ok(RouteOptimizer::new(config)),
    }
}

#[cfg(not(feature = "osrm"))]
fn build_optimizer(_cli: &Cli, config: OptimizerConfig) -> Result<RouteOptimizer, CliError> {
    Ok(RouteOptimizer::new(config))
}

fn run(cli: Cli) -> Result<String, CliError> {
    let request: RouteRequest = read_json(&cli.request)?;
    let config = load_config(&cli)?;
    let optimizer = build_optimizer(&cli, config)?;

    // A missing cache file is a cold start, not an error
    let cache = match &cli.cache {
        Some(path) if path.exists() => Some(DistanceCache::load_json(path, DEFAULT_CAPACITY)?),
        Some(_) => Some(DistanceCache::default()),
        None => None,
    };

    let response = plan_route(&request, &optimizer, cache.as_ref())?;

    if let (Some(path), Some(cache)) = (&cli.cache, &cache) {
        cache.save_json(path)?;
    }

    serde_json::to_string_pretty(&response).map_err(CliError::Encode)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                eprintln!("  caused by: {}", cause);
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
