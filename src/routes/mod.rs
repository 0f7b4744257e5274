// Route exports
pub mod auth;
pub mod error;
pub mod interactions;
pub mod matches;
pub mod notifications;
pub mod ranking;

use crate::core::{MatchDetector, Ranker};
use crate::models::HealthResponse;
use crate::services::{
    ConnectionRegistry, InteractionLedger, MatchQueryService, NotificationDispatcher, ProfileDirectory,
};
use actix_web::{web, HttpResponse, Responder};
use auth::TokenVerifier;
use std::sync::Arc;
use std::time::Duration;

pub use auth::CallerIdentity;
pub use error::{handle_json_payload_error, handle_query_payload_error, ApiError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn InteractionLedger>,
    pub directory: Arc<dyn ProfileDirectory>,
    pub registry: Arc<ConnectionRegistry>,
    pub detector: Arc<MatchDetector>,
    pub queries: Arc<MatchQueryService>,
    pub ranker: Ranker,
    pub verifier: Arc<TokenVerifier>,
    pub keep_alive: Duration,
}

impl AppState {
    /// Wire the detector, dispatcher and query service around shared collaborators
    pub fn new(
        ledger: Arc<dyn InteractionLedger>,
        directory: Arc<dyn ProfileDirectory>,
        registry: Arc<ConnectionRegistry>,
        ranker: Ranker,
        verifier: TokenVerifier,
        keep_alive: Duration,
    ) -> Self {
        let dispatcher = NotificationDispatcher::new(Arc::clone(&registry));
        let detector = MatchDetector::new(Arc::clone(&ledger), Arc::clone(&directory), dispatcher);
        let queries = MatchQueryService::new(Arc::clone(&ledger), Arc::clone(&directory));

        Self {
            ledger,
            directory,
            registry,
            detector: Arc::new(detector),
            queries: Arc::new(queries),
            ranker,
            verifier: Arc::new(verifier),
            keep_alive,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health_check))
            .configure(interactions::configure)
            .configure(matches::configure)
            .configure(ranking::configure)
            .configure(notifications::configure),
    );
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.ledger.health_check().await.unwrap_or(false);
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        open_channels: state.registry.open_channels(),
        timestamp: chrono::Utc::now(),
    })
}
