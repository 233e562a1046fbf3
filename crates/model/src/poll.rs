use crate::id::{CategoryId, OptionId, PollId, UserId};
use chrono::{DateTime, Utc};
use core::fmt::{self, Display};
use serde::{Deserialize, Serialize};

/// Governs how many options a single ballot may select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollKind {
    SingleChoice,
    MultiChoice,
}

/// Sourcing strategy that produced the poll's option set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VotingOptionType {
    CustomOptions,
    UserSpecific,
    CategoryUserBased,
}

/// Voter eligibility: everyone, or only members of `allowed_categories`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryScope {
    All,
    Specific,
}

/// Lifecycle state derived from the wall clock; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PollStatus {
    Upcoming,
    Active,
    Completed,
}

impl Display for PollStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
        })
    }
}

/// One selectable choice within a poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub id: OptionId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Server-reported tally; the client never computes this locally.
    #[serde(default)]
    pub vote_count: u64,
    /// The person being voted for, when options were sourced from users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_user: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: PollKind,
    pub voting_option_type: VotingOptionType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Informational only; disclosure is decided by status, vote, and publish.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_display_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_result_published: bool,
    pub category_type: CategoryScope,
    #[serde(default)]
    pub allowed_categories: Vec<CategoryId>,
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub total_votes: u64,
    #[serde(default)]
    pub total_voters: u64,
}

impl Poll {
    pub fn has_option(&self, id: &OptionId) -> bool {
        self.options.iter().any(|option| option.id == *id)
    }
}

/// The viewer's cast record for a poll, as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
    #[serde(default)]
    pub selected_options: Vec<OptionId>,
    #[serde(default)]
    pub selected_options_details: Vec<PollOption>,
}
