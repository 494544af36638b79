#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for offline pattern discovery analysis.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pattern_discovery_cli::load_points;
use pattern_discovery_clustering::ClusterDetector;
use pattern_discovery_clustering_models::ClusterParams;
use pattern_discovery_config::Settings;
use pattern_discovery_patterns::{KeywordInference, all_patterns, interpret, pattern, rank_patterns};
use pattern_discovery_voting::{WeightConfig, weight_for_points};

#[derive(Parser)]
#[command(name = "pattern_discovery_cli", about = "Offline pattern discovery analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect clusters in a points file, optionally interpreting them
    /// against a design pattern
    Analyze {
        /// JSON file containing an array of points or point records
        #[arg(long)]
        points: PathBuf,
        /// Pattern number to interpret the clusters against
        #[arg(long)]
        pattern: Option<u32>,
        /// Neighbour radius in km (overrides `DBSCAN_EPSILON_KM`)
        #[arg(long)]
        epsilon_km: Option<f64>,
        /// Minimum points per cluster (overrides `DBSCAN_MIN_POINTS`)
        #[arg(long)]
        min_points: Option<usize>,
    },
    /// List the registered design patterns
    Patterns,
    /// Rank design patterns by how well they match a description
    Infer {
        /// Free-text description of a place
        #[arg(long)]
        text: String,
    },
    /// Compute the voting weight of a session's points at one location
    Weight {
        /// JSON file with the points recorded near the location
        #[arg(long)]
        points: PathBuf,
        /// Only use points from this session
        #[arg(long)]
        session: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Commands::Analyze {
            points,
            pattern: pattern_number,
            epsilon_km,
            min_points,
        } => {
            let points = load_points(&points)?;
            let params = ClusterParams {
                epsilon_km: epsilon_km.unwrap_or(settings.dbscan_epsilon_km),
                min_points: min_points.unwrap_or(settings.dbscan_min_points),
            };
            log::info!(
                "Clustering {} points (epsilon {} km, min points {})",
                points.len(),
                params.epsilon_km,
                params.min_points
            );

            let clusters = ClusterDetector::new(params).detect(&points);
            let json = match pattern_number {
                Some(number) => {
                    let pattern = pattern(number)?;
                    serde_json::to_string_pretty(&interpret(&clusters, &pattern))?
                }
                None => serde_json::to_string_pretty(&clusters)?,
            };
            println!("{json}");
        }
        Commands::Patterns => {
            println!("{:<6} {:<28} POPULATION", "NUMBER", "NAME");
            println!("{}", "-".repeat(60));
            for pattern in all_patterns() {
                println!(
                    "{:<6} {:<28} {}",
                    pattern.number, pattern.name, pattern.population_range
                );
            }
        }
        Commands::Infer { text } => {
            let matches = rank_patterns(&text, &all_patterns(), &KeywordInference);
            if matches.is_empty() {
                println!("No pattern matched.");
            }
            for m in matches {
                println!("{:<6} {:<28} {:.2}", m.number, m.name, m.score);
            }
        }
        Commands::Weight { points, session } => {
            let mut points = load_points(&points)?;
            if let Some(session) = session {
                points.retain(|p| p.session_id == session);
            }
            points.sort_by_key(|p| p.timestamp);

            let config = WeightConfig {
                radius_km: settings.vote_radius_km,
                min_vote_minutes: settings.min_vote_minutes,
                max_vote_weight: settings.max_vote_weight,
            };
            let result = weight_for_points(&points, &config);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}
