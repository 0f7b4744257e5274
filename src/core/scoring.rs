use crate::models::{
    Availability, Complexity, ExperienceTier, ProjectRequest, ScoreResult, ServiceProvider, Urgency,
};
use chrono::{DateTime, Utc};

/// Maximum points each component can contribute
///
/// Components are computed independently, summed, and the sum is capped at 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringWeights {
    pub category: u32,
    pub skills: u32,
    /// Flat award when the request names no specific skills
    pub general_skills: u32,
    pub suitability: u32,
    /// Top-tier candidate on a lowest-complexity request
    pub overqualified: u32,
    pub budget_fit: u32,
    pub budget_buffer: u32,
    /// No budget stated, or no rate to estimate a cost from
    pub budget_neutral: u32,
    /// Percentage over budget still considered a near fit
    pub budget_buffer_pct: u64,
    pub timeline: u32,
    pub bonus_cap: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category: 30,
            skills: 25,
            general_skills: 15,
            suitability: 15,
            overqualified: 10,
            budget_fit: 15,
            budget_buffer: 10,
            budget_neutral: 8,
            budget_buffer_pct: 20,
            timeline: 10,
            bonus_cap: 5,
        }
    }
}

/// Bonus for candidates ranked against a request: `(min completed projects, points)`
pub const COMPLETED_PROJECTS_BONUS: &[(u32, u32)] = &[(20, 5), (10, 3), (3, 1)];

/// Bonus for requests ranked against a candidate: `(max existing applicants, points)`
pub const LOW_COMPETITION_BONUS: &[(u32, u32)] = &[(0, 3), (4, 2), (9, 1)];

/// Bonus for requests ranked against a candidate: `(max age in days, points)`
pub const FRESHNESS_BONUS: &[(i64, u32)] = &[(3, 2), (7, 1)];

/// Experience tiers that suit a request of the given complexity
pub fn acceptable_tiers(complexity: Complexity) -> &'static [ExperienceTier] {
    match complexity {
        Complexity::Low => &[ExperienceTier::Junior, ExperienceTier::Mid],
        Complexity::Medium => &[ExperienceTier::Mid, ExperienceTier::Senior],
        Complexity::High => &[ExperienceTier::Senior, ExperienceTier::Expert],
        Complexity::Critical => &[ExperienceTier::Expert],
    }
}

/// Availability states compatible with the requested urgency
pub fn acceptable_availability(urgency: Urgency) -> &'static [Availability] {
    match urgency {
        Urgency::Urgent => &[Availability::Available],
        Urgency::Soon => &[Availability::Available, Availability::PartTime],
        Urgency::Flexible => &[Availability::Available, Availability::PartTime, Availability::Busy],
    }
}

/// Which side is being ranked, and therefore which bonus table applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Rank providers for one request; subject is the provider
    CandidatesForRequest,
    /// Rank open requests for one provider; subject is the request
    RequestsForCandidate { as_of: DateTime<Utc> },
}

/// Points awarded by one component plus its explanation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub points: u32,
    pub reason: String,
}

impl Component {
    fn zero() -> Self {
        Self { points: 0, reason: String::new() }
    }

    fn new(points: u32, reason: impl Into<String>) -> Self {
        Self { points, reason: reason.into() }
    }
}

/// Deterministic multi-factor compatibility scorer
///
/// Pure: no I/O and no clock reads. The requests direction takes its
/// reference instant explicitly so freshness stays reproducible.
#[derive(Debug, Clone)]
pub struct CompatibilityScorer {
    weights: ScoringWeights,
    direction: Direction,
}

impl CompatibilityScorer {
    pub fn candidates_for_request(weights: ScoringWeights) -> Self {
        Self { weights, direction: Direction::CandidatesForRequest }
    }

    pub fn requests_for_candidate(weights: ScoringWeights, as_of: DateTime<Utc>) -> Self {
        Self { weights, direction: Direction::RequestsForCandidate { as_of } }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score `candidate` against `request`
    ///
    /// Components are evaluated in a fixed order (category, skills,
    /// suitability, budget, timeline, bonus) and `reasons` follows that
    /// order, one entry per nonzero component.
    pub fn score(&self, request: &ProjectRequest, candidate: &ServiceProvider) -> ScoreResult {
        let components = [
            category_points(request, candidate, &self.weights),
            skill_points(request, candidate, &self.weights),
            suitability_points(request, candidate, &self.weights),
            budget_points(request, candidate, &self.weights),
            timeline_points(request, candidate, &self.weights),
            self.bonus_points(request, candidate),
        ];

        let mut total: u32 = 0;
        let mut reasons = Vec::new();
        for component in components {
            if component.points > 0 {
                total = total.saturating_add(component.points);
                reasons.push(component.reason);
            }
        }

        let subject_id = match self.direction {
            Direction::CandidatesForRequest => candidate.id.clone(),
            Direction::RequestsForCandidate { .. } => request.id.clone(),
        };

        ScoreResult {
            subject_id,
            score: total.min(100) as u8,
            reasons,
        }
    }

    fn bonus_points(&self, request: &ProjectRequest, candidate: &ServiceProvider) -> Component {
        match self.direction {
            Direction::CandidatesForRequest => experience_bonus(candidate, &self.weights),
            Direction::RequestsForCandidate { as_of } => marketplace_bonus(request, as_of, &self.weights),
        }
    }
}

pub fn category_points(
    request: &ProjectRequest,
    candidate: &ServiceProvider,
    weights: &ScoringWeights,
) -> Component {
    let offered = candidate
        .categories
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&request.category));

    if offered {
        Component::new(weights.category, format!("Category match: {}", request.category))
    } else {
        Component::zero()
    }
}

/// Ratio of required skills the candidate declares, rounded half-up
pub fn skill_points(
    request: &ProjectRequest,
    candidate: &ServiceProvider,
    weights: &ScoringWeights,
) -> Component {
    let mut required: Vec<String> = request
        .required_skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    required.sort();
    required.dedup();

    if required.is_empty() {
        return Component::new(weights.general_skills, "General expertise");
    }

    let offered: Vec<String> = candidate.skills.iter().map(|s| s.trim().to_lowercase()).collect();
    let matched = required.iter().filter(|s| offered.contains(s)).count() as u64;
    let total = required.len() as u64;

    let points = ((weights.skills as u64 * matched * 2 + total) / (total * 2)) as u32;
    if points == 0 {
        return Component::zero();
    }

    Component::new(points, format!("Skill overlap: {}/{}", matched, total))
}

pub fn suitability_points(
    request: &ProjectRequest,
    candidate: &ServiceProvider,
    weights: &ScoringWeights,
) -> Component {
    if acceptable_tiers(request.complexity).contains(&candidate.tier) {
        return Component::new(
            weights.suitability,
            format!("Experience suits {} complexity", request.complexity.as_str()),
        );
    }

    if request.complexity == Complexity::Low && candidate.tier == ExperienceTier::Expert {
        return Component::new(weights.overqualified, "Overqualified expert for low complexity");
    }

    Component::zero()
}

pub fn budget_points(
    request: &ProjectRequest,
    candidate: &ServiceProvider,
    weights: &ScoringWeights,
) -> Component {
    let Some(budget) = request.budget else {
        return Component::new(weights.budget_neutral, "No budget specified");
    };

    let Some(cost) = candidate.estimated_cost(request.complexity) else {
        return Component::new(weights.budget_neutral, "Rate negotiable");
    };

    if cost <= budget {
        return Component::new(weights.budget_fit, format!("Estimated ${} within ${} budget", cost, budget));
    }

    // cost <= budget * (1 + pct/100), kept in integers
    let stretch = budget.saturating_mul(100 + weights.budget_buffer_pct);
    if cost.saturating_mul(100) <= stretch {
        return Component::new(
            weights.budget_buffer,
            format!("Estimated ${} within {}% of budget", cost, weights.budget_buffer_pct),
        );
    }

    Component::zero()
}

pub fn timeline_points(
    request: &ProjectRequest,
    candidate: &ServiceProvider,
    weights: &ScoringWeights,
) -> Component {
    if acceptable_availability(request.urgency).contains(&candidate.availability) {
        Component::new(weights.timeline, "Availability fits timeline")
    } else {
        Component::zero()
    }
}

fn experience_bonus(candidate: &ServiceProvider, weights: &ScoringWeights) -> Component {
    let points = COMPLETED_PROJECTS_BONUS
        .iter()
        .find(|(min, _)| candidate.completed_projects >= *min)
        .map(|(_, pts)| *pts)
        .unwrap_or(0)
        .min(weights.bonus_cap);

    if points == 0 {
        return Component::zero();
    }
    Component::new(points, format!("Completed {} projects", candidate.completed_projects))
}

fn marketplace_bonus(request: &ProjectRequest, as_of: DateTime<Utc>, weights: &ScoringWeights) -> Component {
    let competition = LOW_COMPETITION_BONUS
        .iter()
        .find(|(max, _)| request.applicant_count <= *max)
        .map(|(_, pts)| *pts)
        .unwrap_or(0);

    // Requests dated in the future count as brand new
    let age_days = (as_of - request.created_at).num_days().max(0);
    let freshness = FRESHNESS_BONUS
        .iter()
        .find(|(max, _)| age_days <= *max)
        .map(|(_, pts)| *pts)
        .unwrap_or(0);

    let points = (competition + freshness).min(weights.bonus_cap);
    if points == 0 {
        return Component::zero();
    }

    let mut parts = Vec::new();
    if competition > 0 {
        parts.push(format!("{} applicants", request.applicant_count));
    }
    if freshness > 0 {
        parts.push(format!("posted {} days ago", age_days));
    }
    Component::new(points, format!("Low competition bonus: {}", parts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;
    use chrono::{Duration, TimeZone};

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn create_test_request() -> ProjectRequest {
        ProjectRequest {
            id: "req-1".to_string(),
            owner_id: "owner".to_string(),
            title: "Landing page".to_string(),
            category: "design".to_string(),
            required_skills: vec!["Figma".to_string(), "Sketch".to_string()],
            complexity: Complexity::Medium,
            budget: Some(2000),
            urgency: Urgency::Soon,
            created_at: fixed_now() - Duration::days(1),
            applicant_count: 2,
            status: RequestStatus::Open,
        }
    }

    fn create_test_provider() -> ServiceProvider {
        ServiceProvider {
            id: "prov-1".to_string(),
            user_id: "user-prov-1".to_string(),
            name: "Dana".to_string(),
            title: Some("Product designer".to_string()),
            image: None,
            categories: vec!["design".to_string()],
            skills: vec!["Figma".to_string(), "InVision".to_string()],
            tier: ExperienceTier::Senior,
            hourly_rate: Some(50),
            availability: Availability::Available,
            completed_projects: 0,
        }
    }

    #[test]
    fn test_reference_example_scores_83() {
        let scorer = CompatibilityScorer::candidates_for_request(ScoringWeights::default());
        let result = scorer.score(&create_test_request(), &create_test_provider());

        assert_eq!(result.score, 83);
        assert_eq!(result.reasons.len(), 5);
        assert_eq!(result.subject_id, "prov-1");
        assert!(result.reasons[0].starts_with("Category match"));
        assert_eq!(result.reasons[1], "Skill overlap: 1/2");
    }

    #[test]
    fn test_skill_rounding_is_half_up() {
        let weights = ScoringWeights::default();
        let mut request = create_test_request();
        let provider = create_test_provider();

        request.required_skills = vec!["figma".into(), "sketch".into(), "framer".into()];
        // 25 * 1/3 = 8.33
        assert_eq!(skill_points(&request, &provider, &weights).points, 8);

        request.required_skills = vec!["figma".into(), "sketch".into()];
        // 25 * 1/2 = 12.5
        assert_eq!(skill_points(&request, &provider, &weights).points, 13);
    }

    #[test]
    fn test_no_required_skills_awards_flat_points() {
        let weights = ScoringWeights::default();
        let mut request = create_test_request();
        request.required_skills.clear();

        let component = skill_points(&request, &create_test_provider(), &weights);
        assert_eq!(component.points, 15);
        assert_eq!(component.reason, "General expertise");
    }

    #[test]
    fn test_duplicate_required_skills_counted_once() {
        let weights = ScoringWeights::default();
        let mut request = create_test_request();
        request.required_skills = vec!["Figma".into(), "figma".into()];

        assert_eq!(skill_points(&request, &create_test_provider(), &weights).points, 25);
    }

    #[test]
    fn test_overqualified_expert_gets_reduced_points() {
        let weights = ScoringWeights::default();
        let mut request = create_test_request();
        request.complexity = Complexity::Low;
        let mut provider = create_test_provider();

        provider.tier = ExperienceTier::Expert;
        assert_eq!(suitability_points(&request, &provider, &weights).points, 10);

        provider.tier = ExperienceTier::Senior;
        assert_eq!(suitability_points(&request, &provider, &weights).points, 0);

        provider.tier = ExperienceTier::Junior;
        assert_eq!(suitability_points(&request, &provider, &weights).points, 15);
    }

    #[test]
    fn test_budget_tiers() {
        let weights = ScoringWeights::default();
        let mut request = create_test_request();
        let mut provider = create_test_provider();

        // 30h * 70 = 2100, within 20% of 2000
        provider.hourly_rate = Some(70);
        assert_eq!(budget_points(&request, &provider, &weights).points, 10);

        // 30h * 80 = 2400, exactly at the buffer edge
        provider.hourly_rate = Some(80);
        assert_eq!(budget_points(&request, &provider, &weights).points, 10);

        // 30h * 81 = 2430, over
        provider.hourly_rate = Some(81);
        assert_eq!(budget_points(&request, &provider, &weights).points, 0);

        request.budget = None;
        assert_eq!(budget_points(&request, &provider, &weights).points, 8);
    }

    #[test]
    fn test_unrated_provider_is_neutral() {
        let weights = ScoringWeights::default();
        let mut provider = create_test_provider();
        provider.hourly_rate = None;
        assert_eq!(budget_points(&create_test_request(), &provider, &weights).points, 8);
    }

    #[test]
    fn test_timeline_table() {
        let weights = ScoringWeights::default();
        let mut request = create_test_request();
        let mut provider = create_test_provider();

        request.urgency = Urgency::Urgent;
        provider.availability = Availability::PartTime;
        assert_eq!(timeline_points(&request, &provider, &weights).points, 0);

        request.urgency = Urgency::Flexible;
        provider.availability = Availability::Busy;
        assert_eq!(timeline_points(&request, &provider, &weights).points, 10);

        provider.availability = Availability::Unavailable;
        assert_eq!(timeline_points(&request, &provider, &weights).points, 0);
    }

    #[test]
    fn test_candidate_direction_bonus_uses_completed_projects() {
        let scorer = CompatibilityScorer::candidates_for_request(ScoringWeights::default());
        let mut provider = create_test_provider();
        provider.completed_projects = 12;

        let result = scorer.score(&create_test_request(), &provider);
        assert_eq!(result.score, 86);
        assert_eq!(result.reasons.last().map(String::as_str), Some("Completed 12 projects"));
    }

    #[test]
    fn test_request_direction_bonus_uses_competition_and_freshness() {
        let scorer = CompatibilityScorer::requests_for_candidate(ScoringWeights::default(), fixed_now());
        let mut provider = create_test_provider();
        // ignored in this direction
        provider.completed_projects = 50;

        let result = scorer.score(&create_test_request(), &provider);
        // 2 applicants -> 2, one day old -> 2
        assert_eq!(result.score, 87);
        assert_eq!(result.subject_id, "req-1");
    }

    #[test]
    fn test_bonus_is_capped() {
        let scorer = CompatibilityScorer::requests_for_candidate(ScoringWeights::default(), fixed_now());
        let mut request = create_test_request();
        request.applicant_count = 0;

        let result = scorer.score(&request, &create_test_provider());
        // 3 + 2 capped at 5
        assert_eq!(result.score, 88);
    }

    #[test]
    fn test_score_capped_at_100() {
        let weights = ScoringWeights { category: 90, ..ScoringWeights::default() };
        let scorer = CompatibilityScorer::candidates_for_request(weights);
        let result = scorer.score(&create_test_request(), &create_test_provider());
        assert_eq!(result.score, 100);
    }

    #[test]
    fn test_nothing_matches_scores_zero() {
        let scorer = CompatibilityScorer::candidates_for_request(ScoringWeights::default());
        let request = ProjectRequest {
            category: "legal".to_string(),
            complexity: Complexity::Critical,
            urgency: Urgency::Urgent,
            budget: Some(100),
            ..create_test_request()
        };
        let provider = ServiceProvider {
            skills: vec![],
            tier: ExperienceTier::Junior,
            availability: Availability::Unavailable,
            ..create_test_provider()
        };

        let result = scorer.score(&request, &provider);
        assert_eq!(result.score, 0);
        assert!(result.reasons.is_empty());
    }
}
