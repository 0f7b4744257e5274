use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /interactions`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RecordInteractionRequest {
    #[validate(length(min = 1, max = 128))]
    #[serde(alias = "target_id", rename = "targetId")]
    pub target_id: String,
    pub liked: bool,
}

/// Query of `GET /candidates`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidatesQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "request_id", rename = "requestId")]
    pub request_id: String,
    #[serde(default)]
    pub limit: Option<u16>,
    #[validate(range(max = 100))]
    #[serde(alias = "min_score", rename = "minScore", default)]
    pub min_score: Option<u8>,
}

/// Query of `GET /requests`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestsQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "candidate_id", rename = "candidateId")]
    pub candidate_id: String,
    #[serde(default)]
    pub limit: Option<u16>,
    #[validate(range(max = 100))]
    #[serde(alias = "min_score", rename = "minScore", default)]
    pub min_score: Option<u8>,
}

/// Query of `GET /matches`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchesQuery {
    #[serde(default)]
    pub order: Option<String>,
}
