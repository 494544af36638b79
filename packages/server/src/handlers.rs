//! HTTP handler functions for the pattern discovery API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use pattern_discovery_clustering::ClusterDetector;
use pattern_discovery_clustering_models::ClusterParams;
use pattern_discovery_database::{LocationStore as _, PointStore as _, StoreError, VoteStore as _};
use pattern_discovery_database_models::{Location, Suggestion};
use pattern_discovery_patterns::{PatternError, all_patterns, interpret, pattern, score_adherence};
use pattern_discovery_server_models::{
    AdherenceRequest, AnalysisRequest, ApiHealth, AwardTokensRequest, AwardTokensResponse,
    CastVoteRequest, ClusterRequest, ClusterResponse, CreateSuggestionRequest,
    RecordPointsRequest, RecordPointsResponse, SpendTokensRequest, SpendTokensResponse,
    VotingWeightQuery,
};
use pattern_discovery_tokens::TokenError;
use pattern_discovery_tracking_models::SpatialPoint;
use pattern_discovery_voting::VotingError;
use uuid::Uuid;

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/patterns`
///
/// Lists every registered design pattern.
pub async fn patterns() -> HttpResponse {
    HttpResponse::Ok().json(all_patterns())
}

/// `POST /api/points`
///
/// Stores tracking, analyzed or saved point records.
pub async fn record_points(
    state: web::Data<AppState>,
    body: web::Json<RecordPointsRequest>,
) -> HttpResponse {
    let records = body.into_inner().points;
    let mut recorded = 0;
    for record in records {
        if let Err(e) = state.store.record(record) {
            return internal_error("Failed to record points", &e);
        }
        recorded += 1;
    }
    log::debug!("Recorded {recorded} points");
    HttpResponse::Ok().json(RecordPointsResponse { recorded })
}

/// `POST /api/clusters`
///
/// Detects clusters in the supplied or stored points.
pub async fn clusters(
    state: web::Data<AppState>,
    body: web::Json<ClusterRequest>,
) -> HttpResponse {
    let params = match cluster_params(&state, &body) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let points = match resolve_points(&state, &body) {
        Ok(points) => points,
        Err(e) => return internal_error("Failed to load points", &e),
    };

    let detection = ClusterDetector::new(params).detect_with_noise(&points);
    HttpResponse::Ok().json(ClusterResponse {
        params,
        clusters: detection.clusters,
        noise_count: detection.noise.len(),
    })
}

/// `POST /api/analysis`
///
/// Detects clusters and interprets them against a design pattern.
pub async fn analysis(
    state: web::Data<AppState>,
    body: web::Json<AnalysisRequest>,
) -> HttpResponse {
    let pattern = match pattern(body.pattern_number) {
        Ok(pattern) => pattern,
        Err(e) => return pattern_error(&e),
    };
    let params = match cluster_params(&state, &body.cluster) {
        Ok(params) => params,
        Err(response) => return response,
    };
    let points = match resolve_points(&state, &body.cluster) {
        Ok(points) => points,
        Err(e) => return internal_error("Failed to load points", &e),
    };

    let clusters = ClusterDetector::new(params).detect(&points);
    HttpResponse::Ok().json(interpret(&clusters, &pattern))
}

/// `POST /api/adherence`
///
/// Scores a single cluster against a design pattern.
pub async fn adherence(body: web::Json<AdherenceRequest>) -> HttpResponse {
    match score_adherence(&body.cluster, body.pattern_number) {
        Ok(report) => HttpResponse::Ok().json(report),
        Err(e) => pattern_error(&e),
    }
}

/// `GET /api/voting-weight?sessionId=..&locationId=..`
pub async fn voting_weight(
    state: web::Data<AppState>,
    query: web::Query<VotingWeightQuery>,
) -> HttpResponse {
    match state
        .voting
        .compute_voting_weight(&query.session_id, &query.location_id)
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(e) => voting_error(&e),
    }
}

/// `POST /api/locations`
///
/// Creates or replaces a votable location.
pub async fn create_location(
    state: web::Data<AppState>,
    body: web::Json<Location>,
) -> HttpResponse {
    let location = body.into_inner();
    match state.store.upsert_location(location.clone()) {
        Ok(()) => HttpResponse::Created().json(location),
        Err(e) => internal_error("Failed to save location", &e),
    }
}

/// `POST /api/suggestions`
pub async fn create_suggestion(
    state: web::Data<AppState>,
    body: web::Json<CreateSuggestionRequest>,
) -> HttpResponse {
    let request = body.into_inner();

    match state.store.location(&request.location_id) {
        Ok(Some(_)) => {}
        Ok(None) => return not_found(&format!("Location '{}' not found", request.location_id)),
        Err(e) => return internal_error("Failed to load location", &e),
    }

    let suggestion = Suggestion {
        id: request.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        location_id: request.location_id,
        title: request.title,
        description: request.description,
        session_id: request.session_id,
        created_at: Utc::now(),
    };

    match state.store.add_suggestion(suggestion.clone()) {
        Ok(()) => HttpResponse::Created().json(suggestion),
        Err(StoreError::Duplicate { id, .. }) => HttpResponse::Conflict().json(serde_json::json!({
            "error": format!("Suggestion '{id}' already exists")
        })),
        Err(e) => internal_error("Failed to save suggestion", &e),
    }
}

/// `POST /api/votes`
///
/// Returns the vote outcome; ineligible and duplicate votes are a
/// successful response with a `rejected` status.
pub async fn cast_vote(
    state: web::Data<AppState>,
    body: web::Json<CastVoteRequest>,
) -> HttpResponse {
    match state.voting.cast_vote(
        &body.suggestion_id,
        &body.session_id,
        body.vote_type,
        &body.location_id,
    ) {
        Ok(outcome) => HttpResponse::Ok().json(outcome),
        Err(e) => voting_error(&e),
    }
}

/// `GET /api/suggestions/{id}/tally`
pub async fn tally(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.voting.tally(&path) {
        Ok(tally) => HttpResponse::Ok().json(tally),
        Err(e) => voting_error(&e),
    }
}

/// `POST /api/tokens/award`
pub async fn award_tokens(
    state: web::Data<AppState>,
    body: web::Json<AwardTokensRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let amount = request.amount.unwrap_or_else(|| request.kind.base_rate());
    let reason = request.reason.unwrap_or_else(|| request.kind.to_string());

    let awarded = match state
        .ledger
        .award_tokens(&request.session_id, request.kind, amount, reason)
    {
        Ok(awarded) => awarded,
        Err(e) => return token_error(&e),
    };

    match state.ledger.supply() {
        Ok(supply) => HttpResponse::Ok().json(AwardTokensResponse { awarded, supply }),
        Err(e) => token_error(&e),
    }
}

/// `POST /api/tokens/spend`
pub async fn spend_tokens(
    state: web::Data<AppState>,
    body: web::Json<SpendTokensRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let reason = request.reason.unwrap_or_else(|| "spend".to_string());

    let success = match state
        .ledger
        .spend_tokens(&request.session_id, request.amount, reason)
    {
        Ok(success) => success,
        Err(e) => return token_error(&e),
    };

    match state.ledger.balance(&request.session_id) {
        Ok(balance) => HttpResponse::Ok().json(SpendTokensResponse { success, balance }),
        Err(e) => token_error(&e),
    }
}

/// `GET /api/tokens/supply`
pub async fn token_supply(state: web::Data<AppState>) -> HttpResponse {
    match state.ledger.supply() {
        Ok(supply) => HttpResponse::Ok().json(supply),
        Err(e) => token_error(&e),
    }
}

/// `GET /api/tokens/balance/{session_id}`
pub async fn token_balance(state: web::Data<AppState>, path: web::Path<String>) -> HttpResponse {
    match state.ledger.balance(&path) {
        Ok(balance) => HttpResponse::Ok().json(balance),
        Err(e) => token_error(&e),
    }
}

/// Validated clustering parameters for a request.
fn cluster_params(state: &AppState, request: &ClusterRequest) -> Result<ClusterParams, HttpResponse> {
    let params = request.params(state.cluster_params);
    if !(params.epsilon_km.is_finite() && params.epsilon_km > 0.0) {
        return Err(bad_request("epsilonKm must be a positive number"));
    }
    if params.min_points == 0 {
        return Err(bad_request("minPoints must be at least 1"));
    }
    Ok(params)
}

/// Points named by a request: inline, one session's, or everything stored.
fn resolve_points(state: &AppState, request: &ClusterRequest) -> Result<Vec<SpatialPoint>, StoreError> {
    match (&request.points, &request.session_id) {
        (Some(points), _) => Ok(points.clone()),
        (None, Some(session_id)) => state.store.points_for_session(session_id),
        (None, None) => state.store.all_points(),
    }
}

fn internal_error(context: &str, e: &dyn std::fmt::Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": context
    }))
}

fn not_found(message: &str) -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({
        "error": message
    }))
}

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": message
    }))
}

fn pattern_error(e: &PatternError) -> HttpResponse {
    match e {
        PatternError::UnknownPattern { .. } => not_found(&e.to_string()),
        PatternError::Registry { .. } => internal_error("Failed to load pattern registry", e),
    }
}

fn voting_error(e: &VotingError) -> HttpResponse {
    match e {
        VotingError::LocationNotFound { .. } | VotingError::SuggestionNotFound { .. } => {
            not_found(&e.to_string())
        }
        VotingError::Store(_) => internal_error("Voting store failure", e),
    }
}

fn token_error(e: &TokenError) -> HttpResponse {
    match e {
        TokenError::InvalidAmount { .. } => bad_request(&e.to_string()),
        TokenError::Poisoned => internal_error("Token ledger unavailable", e),
    }
}
