use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One-directional like or pass from `sender_id` toward `receiver_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: Uuid,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    #[serde(rename = "receiverId")]
    pub receiver_id: String,
    pub liked: bool,
    pub matched: bool,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Set together with `matched`, identical on both rows of the pair
    #[serde(rename = "matchedAt", default)]
    pub matched_at: Option<DateTime<Utc>>,
}

impl InteractionRecord {
    pub fn new(sender_id: &str, receiver_id: &str, liked: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            liked,
            matched: false,
            created_at: Utc::now(),
            matched_at: None,
        }
    }

    /// The party on the other side of this record from `user_id`
    pub fn counterpart_of(&self, user_id: &str) -> Option<&str> {
        if self.sender_id == user_id {
            Some(&self.receiver_id)
        } else if self.receiver_id == user_id {
            Some(&self.sender_id)
        } else {
            None
        }
    }
}

/// Unordered pair of identities; `(a, b)` and `(b, a)` produce the same key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    low: String,
    high: String,
}

impl PairKey {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { low: a.to_string(), high: b.to_string() }
        } else {
            Self { low: b.to_string(), high: a.to_string() }
        }
    }
}

/// Per-user counters maintained alongside the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionStats {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "likesReceived")]
    pub likes_received: i64,
    pub matches: i64,
}

/// Brief public profile, used as notification payload and match counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefProfile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl BriefProfile {
    /// Profile carrying only the identity, for when the directory is unreachable
    pub fn id_only(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            title: None,
            image: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Match,
    Like,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Match => "match",
            NotificationKind::Like => "like",
        }
    }
}

/// Fire-and-forget event pushed to a recipient's open channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(rename = "recipientId")]
    pub recipient_id: String,
    pub payload: BriefProfile,
}

impl NotificationEvent {
    pub fn like(recipient_id: &str, from: BriefProfile) -> Self {
        Self {
            kind: NotificationKind::Like,
            recipient_id: recipient_id.to_string(),
            payload: from,
        }
    }

    pub fn matched(recipient_id: &str, other: BriefProfile) -> Self {
        Self {
            kind: NotificationKind::Match,
            recipient_id: recipient_id.to_string(),
            payload: other,
        }
    }
}

/// Entry of a user's mutual-match list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutualMatch {
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    #[serde(rename = "matchedAt")]
    pub matched_at: DateTime<Utc>,
    #[serde(rename = "otherUser")]
    pub other_user: BriefProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
    Critical,
}

impl Complexity {
    /// Hours of work assumed when turning an hourly rate into a cost estimate
    pub fn estimated_hours(&self) -> u64 {
        match self {
            Complexity::Low => 10,
            Complexity::Medium => 30,
            Complexity::High => 80,
            Complexity::Critical => 160,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
            Complexity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceTier {
    Junior,
    Mid,
    Senior,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Urgent,
    Soon,
    Flexible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    PartTime,
    Busy,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Open,
    Closed,
}

fn default_open() -> RequestStatus {
    RequestStatus::Open
}

/// A project owner's request for help
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRequest {
    pub id: String,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(default)]
    pub title: String,
    pub category: String,
    #[serde(rename = "requiredSkills", default)]
    pub required_skills: Vec<String>,
    pub complexity: Complexity,
    /// Whole dollars; `None` when the owner did not state a budget
    #[serde(default)]
    pub budget: Option<u64>,
    pub urgency: Urgency,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "applicantCount", default)]
    pub applicant_count: u32,
    #[serde(default = "default_open")]
    pub status: RequestStatus,
}

/// A service provider that can be ranked against requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub tier: ExperienceTier,
    /// Whole dollars per hour
    #[serde(rename = "hourlyRate", default)]
    pub hourly_rate: Option<u64>,
    pub availability: Availability,
    #[serde(rename = "completedProjects", default)]
    pub completed_projects: u32,
}

impl ServiceProvider {
    /// Projected cost of taking on a request of the given complexity
    pub fn estimated_cost(&self, complexity: Complexity) -> Option<u64> {
        self.hourly_rate
            .map(|rate| rate.saturating_mul(complexity.estimated_hours()))
    }
}

/// Scored subject returned by either ranking direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    #[serde(rename = "subjectId")]
    pub subject_id: String,
    pub score: u8,
    pub reasons: Vec<String>,
}
