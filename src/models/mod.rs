// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Availability, BriefProfile, Complexity, ExperienceTier, InteractionRecord, InteractionStats,
    MutualMatch, NotificationEvent, NotificationKind, PairKey, ProjectRequest, RequestStatus,
    ScoreResult, ServiceProvider, Urgency,
};
pub use requests::{CandidatesQuery, MatchesQuery, RecordInteractionRequest, RequestsQuery};
pub use responses::{ErrorResponse, HealthResponse, InteractionResponse, MatchesResponse, RankedResponse};
