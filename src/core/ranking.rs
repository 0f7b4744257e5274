use crate::core::scoring::{CompatibilityScorer, ScoringWeights};
use crate::models::{ProjectRequest, RequestStatus, ScoreResult, ServiceProvider};
use chrono::{DateTime, Utc};

/// Result of a ranking pass
#[derive(Debug)]
pub struct RankResult {
    pub results: Vec<ScoreResult>,
    pub total_considered: usize,
}

/// Ranking limits applied to both directions
#[derive(Debug, Clone, Copy)]
pub struct RankLimits {
    pub default_limit: usize,
    pub max_limit: usize,
    pub default_min_score: u8,
}

impl Default for RankLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
            default_min_score: 0,
        }
    }
}

impl RankLimits {
    pub fn resolve_limit(&self, requested: Option<u16>) -> usize {
        requested
            .map(|l| l as usize)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }

    pub fn resolve_min_score(&self, requested: Option<u8>) -> u8 {
        requested.unwrap_or(self.default_min_score).min(100)
    }
}

/// Ranks candidates for a request, or open requests for a candidate
///
/// # Pipeline
/// 1. Eligibility pre-filter (self-owned and closed requests are skipped)
/// 2. Scoring through [`CompatibilityScorer`]
/// 3. `min_score` threshold
/// 4. Sort by score descending, then subject id ascending
/// 5. Truncate to `limit`
#[derive(Debug, Clone)]
pub struct Ranker {
    weights: ScoringWeights,
    limits: RankLimits,
}

impl Ranker {
    pub fn new(weights: ScoringWeights, limits: RankLimits) -> Self {
        Self { weights, limits }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default(), RankLimits::default())
    }

    pub fn limits(&self) -> &RankLimits {
        &self.limits
    }

    /// Rank providers against one request
    pub fn rank_candidates(
        &self,
        request: &ProjectRequest,
        candidates: &[ServiceProvider],
        limit: usize,
        min_score: u8,
    ) -> RankResult {
        let scorer = CompatibilityScorer::candidates_for_request(self.weights);

        let scored = candidates
            .iter()
            // A provider is never offered their own request
            .filter(|candidate| candidate.user_id != request.owner_id)
            .map(|candidate| scorer.score(request, candidate))
            .collect();

        finish(scored, candidates.len(), limit, min_score)
    }

    /// Rank open requests against one provider
    pub fn rank_requests(
        &self,
        candidate: &ServiceProvider,
        requests: &[ProjectRequest],
        as_of: DateTime<Utc>,
        limit: usize,
        min_score: u8,
    ) -> RankResult {
        let scorer = CompatibilityScorer::requests_for_candidate(self.weights, as_of);

        let scored = requests
            .iter()
            .filter(|request| request.status == RequestStatus::Open)
            .filter(|request| request.owner_id != candidate.user_id)
            .map(|request| scorer.score(request, candidate))
            .collect();

        finish(scored, requests.len(), limit, min_score)
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

fn finish(mut scored: Vec<ScoreResult>, total_considered: usize, limit: usize, min_score: u8) -> RankResult {
    scored.retain(|r| r.score >= min_score);

    scored.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.subject_id.cmp(&b.subject_id))
    });

    scored.truncate(limit);

    RankResult {
        results: scored,
        total_considered,
    }
}
