use crate::models::{CandidatesQuery, RankedResponse, RequestsQuery};
use crate::routes::{ApiError, AppState, CallerIdentity};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/candidates", web::get().to(rank_candidates))
        .route("/requests", web::get().to(rank_requests));
}

/// Providers ranked for one request
///
/// GET /api/v1/candidates?requestId={id}&limit={n}&minScore={0..100}
async fn rank_candidates(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    query: web::Query<CandidatesQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let limits = state.ranker.limits();
    let limit = limits.resolve_limit(query.limit);
    let min_score = limits.resolve_min_score(query.min_score);

    let request = state.directory.request(&query.request_id).await?;
    let candidates = state.directory.providers().await?;

    let result = state.ranker.rank_candidates(&request, &candidates, limit, min_score);

    tracing::info!(
        "Ranked {} of {} candidates for request {} (caller {})",
        result.results.len(),
        result.total_considered,
        request.id,
        caller.user_id()
    );

    Ok(HttpResponse::Ok().json(RankedResponse {
        results: result.results,
        total_considered: result.total_considered,
    }))
}

/// Open requests ranked for one provider
///
/// GET /api/v1/requests?candidateId={id}&limit={n}&minScore={0..100}
async fn rank_requests(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    query: web::Query<RequestsQuery>,
) -> Result<HttpResponse, ApiError> {
    query.validate()?;

    let limits = state.ranker.limits();
    let limit = limits.resolve_limit(query.limit);
    let min_score = limits.resolve_min_score(query.min_score);

    let candidate = state.directory.provider(&query.candidate_id).await?;
    let requests = state.directory.open_requests().await?;

    let result = state
        .ranker
        .rank_requests(&candidate, &requests, chrono::Utc::now(), limit, min_score);

    tracing::info!(
        "Ranked {} of {} requests for provider {} (caller {})",
        result.results.len(),
        result.total_considered,
        candidate.id,
        caller.user_id()
    );

    Ok(HttpResponse::Ok().json(RankedResponse {
        results: result.results,
        total_considered: result.total_considered,
    }))
}
