use crate::models::domain::{MutualMatch, ScoreResult};
use serde::{Deserialize, Serialize};

/// Response for `POST /interactions`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionResponse {
    pub matched: bool,
}

/// Response for `GET /matches`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<MutualMatch>,
    pub count: usize,
}

/// Response for both ranking directions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResponse {
    pub results: Vec<ScoreResult>,
    #[serde(rename = "totalConsidered")]
    pub total_considered: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(rename = "openChannels")]
    pub open_channels: usize,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
