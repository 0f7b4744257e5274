use crate::models::{MatchesQuery, MatchesResponse};
use crate::routes::{ApiError, AppState, CallerIdentity};
use crate::services::MatchOrder;
use actix_web::{web, HttpResponse};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/matches", web::get().to(list_matches))
        .route("/matches/stats", web::get().to(match_stats));
}

/// Mutual matches of the caller
///
/// GET /api/v1/matches?order=desc|asc
async fn list_matches(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    query: web::Query<MatchesQuery>,
) -> Result<HttpResponse, ApiError> {
    let order = MatchOrder::parse(query.order.as_deref());
    let matches = state.queries.list_mutual_matches(caller.user_id(), order).await?;

    Ok(HttpResponse::Ok().json(MatchesResponse {
        count: matches.len(),
        matches,
    }))
}

/// GET /api/v1/matches/stats
async fn match_stats(state: web::Data<AppState>, caller: CallerIdentity) -> Result<HttpResponse, ApiError> {
    let stats = state.queries.stats(caller.user_id()).await?;
    Ok(HttpResponse::Ok().json(stats))
}
