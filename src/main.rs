use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use food_delivery_pipeline::observability::init_logging;
use food_delivery_pipeline::{Config, Pipeline, Source};

#[derive(Parser)]
#[command(name = "food_delivery_pipeline")]
#[command(about = "Merge orders, users and restaurants exports into one CSV dataset")]
#[command(version = "0.1.0")]
struct Cli {
    /// Directory holding orders.csv, users.json and restaurants.sql
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline (default)
    Run {
        /// Print the run summary as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Load a single source and print its columns
    Inspect {
        /// One of: orders, users, restaurants
        source: Source,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let _log_guard = init_logging(&config);
    info!(data_dir = %config.data_dir.display(), "configuration loaded");

    let pipeline = Pipeline::new(config);

    match cli.command.unwrap_or(Commands::Run { json: false }) {
        Commands::Run { json } => {
            let summary = pipeline.run().map_err(|e| {
                error!("Pipeline failed: {}", e);
                e
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }
            let elapsed = summary.finished_at - summary.started_at;

            println!("\n✅ SUCCESS!");
            println!("Created → {}", summary.output_file.display());
            println!("Rows: {}", summary.rows);
            println!("   Store: {}", summary.store_file.display());
            println!("   Users format: {}", summary.users_tier);
            println!("   Orders matched to users: {}", summary.user_matches);
            println!("   Orders matched to restaurants: {}", summary.restaurant_matches);
            println!("   SHA-256: {}", summary.output_sha256);
            println!("   Elapsed: {} ms", elapsed.num_milliseconds());
            println!("\n==============================================");
        }
        Commands::Inspect { source } => {
            let table = pipeline.inspect(source)?;
            println!("Rows: {}", table.num_rows());
        }
    }

    Ok(())
}
