//! Foundry Match - mutual-match detection and compatibility ranking
//!
//! This library records likes and passes between marketplace users, detects
//! mutual matches exactly once per pair, pushes live notifications to
//! connected clients and ranks providers against project requests.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{CompatibilityScorer, MatchDetector, MatchError, Ranker, ScoringWeights};
pub use models::{InteractionRecord, NotificationEvent, ProjectRequest, ScoreResult, ServiceProvider};
pub use services::{ConnectionRegistry, InteractionLedger, MatchQueryService, NotificationDispatcher};
