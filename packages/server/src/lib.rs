#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for pattern discovery.
//!
//! Serves JSON endpoints for recording GPS points, detecting clusters and
//! interpreting them against design patterns, weighted voting on
//! suggestions, and the token reward ledger. All state lives in process:
//! an in-memory store for points, locations and votes plus one
//! [`TokenLedger`].

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use pattern_discovery_clustering_models::ClusterParams;
use pattern_discovery_config::Settings;
use pattern_discovery_database::MemoryStore;
use pattern_discovery_tokens::{LedgerConfig, TokenLedger};
use pattern_discovery_voting::{VotingService, WeightConfig};

/// Shared application state.
pub struct AppState {
    /// Points, locations, suggestions and votes.
    pub store: Arc<MemoryStore>,
    /// Voting weight and vote casting over `store`.
    pub voting: VotingService<MemoryStore>,
    /// Token issuance ledger.
    pub ledger: TokenLedger,
    /// Default clustering parameters.
    pub cluster_params: ClusterParams,
}

impl AppState {
    /// Builds empty state configured from `settings`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let store = Arc::new(MemoryStore::new());
        let weight_config = WeightConfig {
            radius_km: settings.vote_radius_km,
            min_vote_minutes: settings.min_vote_minutes,
            max_vote_weight: settings.max_vote_weight,
        };
        let ledger_config = LedgerConfig {
            max_supply: settings.max_supply,
            halving_interval: settings.halving_interval,
            genesis_reward: settings.genesis_reward,
            min_reward_floor: settings.min_reward_floor,
        };

        Self {
            voting: VotingService::new(Arc::clone(&store), weight_config),
            store,
            ledger: TokenLedger::new(ledger_config),
            cluster_params: ClusterParams {
                epsilon_km: settings.dbscan_epsilon_km,
                min_points: settings.dbscan_min_points,
            },
        }
    }
}

/// Registers every `/api` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/patterns", web::get().to(handlers::patterns))
            .route("/points", web::post().to(handlers::record_points))
            .route("/clusters", web::post().to(handlers::clusters))
            .route("/analysis", web::post().to(handlers::analysis))
            .route("/adherence", web::post().to(handlers::adherence))
            .route("/voting-weight", web::get().to(handlers::voting_weight))
            .route("/locations", web::post().to(handlers::create_location))
            .route("/suggestions", web::post().to(handlers::create_suggestion))
            .route("/suggestions/{id}/tally", web::get().to(handlers::tally))
            .route("/votes", web::post().to(handlers::cast_vote))
            .route("/tokens/award", web::post().to(handlers::award_tokens))
            .route("/tokens/spend", web::post().to(handlers::spend_tokens))
            .route("/tokens/supply", web::get().to(handlers::token_supply))
            .route(
                "/tokens/balance/{session_id}",
                web::get().to(handlers::token_balance),
            ),
    );
}

/// Starts the pattern discovery API server.
///
/// Loads [`Settings`] from the environment, builds the in-memory state and
/// runs the Actix-Web HTTP server. The caller provides the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Error` if the settings are invalid, or if the HTTP
/// server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let settings = Settings::load().map_err(|e| {
        log::error!("Invalid configuration: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let state = web::Data::new(AppState::new(&settings));

    let bind_addr = settings.bind_addr.clone();
    let port = settings.port;

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
