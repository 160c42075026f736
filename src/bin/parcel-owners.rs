//! Parcel owners CLI: run one selection against a live ArcGIS service.
//!
//! Usage:
//!   parcel-owners select --x <x> --y <y> [--config path] [--selection rows.json]
//!   parcel-owners check-url <url> [--allow host]...

use clap::{Parser, Subcommand};
use parcel_owners::{
    check_layer_url, ArcGisClient, MapPoint, Messages, PipelineConfig, SelectionPipeline, SelectionState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "parcel-owners",
    version,
    about = "Select parcels at a map point and list their owners"
)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query parcels at a point and print the next selection as JSON
    Select {
        /// Easting in the configured spatial reference
        #[arg(long, allow_negative_numbers = true)]
        x: f64,
        /// Northing in the configured spatial reference
        #[arg(long, allow_negative_numbers = true)]
        y: f64,
        /// Path to the YAML config
        #[arg(long)]
        config: Option<PathBuf>,
        /// Current selection, as a JSON array of rows
        #[arg(long)]
        selection: Option<PathBuf>,
    },
    /// Check whether a layer URL would be accepted as a data source
    CheckUrl {
        url: String,
        /// Allowed host; may be repeated
        #[arg(long = "allow")]
        allowed_hosts: Vec<String>,
    },
}

/// Get the default config path (~/.config/parcel-owners/config.yaml)
fn default_config_path() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".config"));
    config_dir.join("parcel-owners").join("config.yaml")
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_selection(path: Option<&Path>) -> Result<SelectionState, String> {
    let Some(path) = path else {
        return Ok(SelectionState::new());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read selection '{}': {}", path.display(), e))?;
    let state: SelectionState =
        serde_json::from_str(&json).map_err(|e| format!("invalid selection '{}': {}", path.display(), e))?;
    // Rows may come from an older run that predates id uniqueness
    Ok(SelectionState::from_rows(state.into_rows()))
}

fn cmd_select(x: f64, y: f64, config: Option<PathBuf>, selection: Option<PathBuf>) -> i32 {
    let config_path = config.unwrap_or_else(default_config_path);
    let config = match PipelineConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let existing = match load_selection(selection.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let client = match ArcGisClient::new(config.fields.clone(), config.spatial_reference.wkid) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let pipeline = SelectionPipeline::new(client.clone(), client)
        .with_messages(Arc::new(Messages::default().with_overrides(&config.messages)));
    let point = MapPoint::new(x, y).with_wkid(config.spatial_reference.wkid);

    // Single-threaded: overlapping queries, no parallel threads
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return 1;
        }
    };
    let outcome = rt.block_on(pipeline.select(Some(point), &config, &existing));

    match outcome {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Err(e) if e.is_user_visible() => {
            eprintln!("Error: {}", e);
            1
        }
        Err(_) => 130,
    }
}

fn cmd_check_url(url: &str, allowed_hosts: &[String]) -> i32 {
    match check_layer_url(url, allowed_hosts) {
        Ok(layer) => {
            println!("allowed: {}", layer.base());
            0
        }
        Err(e) => {
            println!("rejected: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Select {
            x,
            y,
            config,
            selection,
        } => cmd_select(x, y, config, selection),
        Commands::CheckUrl { url, allowed_hosts } => cmd_check_url(&url, &allowed_hosts),
    };
    std::process::exit(code);
}
