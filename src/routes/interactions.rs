use crate::models::{InteractionResponse, RecordInteractionRequest};
use crate::routes::{ApiError, AppState, CallerIdentity};
use actix_web::{web, HttpResponse};
use validator::Validate;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/interactions", web::post().to(record_interaction));
}

/// Record a like or pass from the caller
///
/// POST /api/v1/interactions
///
/// Request body:
/// ```json
/// { "targetId": "string", "liked": true }
/// ```
///
/// Returns `{"matched": bool}`. A repeated swipe on the same target is
/// rejected with `400 DuplicateInteraction`.
async fn record_interaction(
    state: web::Data<AppState>,
    caller: CallerIdentity,
    req: web::Json<RecordInteractionRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let outcome = state
        .detector
        .process_interaction(caller.user_id(), &req.target_id, req.liked)
        .await?;

    tracing::info!(
        "Interaction {} -> {} (liked: {}, matched: {})",
        caller.user_id(),
        req.target_id,
        req.liked,
        outcome.matched
    );

    Ok(HttpResponse::Ok().json(InteractionResponse { matched: outcome.matched }))
}
