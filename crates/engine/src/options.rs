//! Resolves a poll's authoritative option set from one of the three sourcing
//! strategies, and validates create/edit submissions before they reach the
//! backend. Validation failures here are never sent over the wire.

use crate::timing;
use chrono::{DateTime, Utc};
use core::fmt::{self, Display};
use model::{Category, CategoryId, CategoryScope, Poll, PollKind, PollStatus, User, UserId, VotingOptionType};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingTitle,
    InvalidSchedule,
    MissingAllowedCategories,
    InsufficientOptions,
    InsufficientUsersInCategories,
    EditNotPermitted,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MissingTitle => "A poll needs a non-empty title.",
            Self::InvalidSchedule => "The start time must come before the end time.",
            Self::MissingAllowedCategories => "A category-restricted poll must allow at least one category.",
            Self::InsufficientOptions => "A poll needs at least two voting options.",
            Self::InsufficientUsersInCategories => {
                "The selected categories resolve to fewer than two distinct users."
            }
            Self::EditNotPermitted => "This poll already has votes; only its details may still be edited.",
        })
    }
}

pub type Result<T> = core::result::Result<T, ValidationError>;

/// Author-supplied free-text option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomOption {
    pub name: String,
    pub image_url: Option<String>,
}

/// Author-curated user with an optional display-name override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserOption {
    pub user: User,
    pub display_name: Option<String>,
}

/// The three option-sourcing strategies, keyed by [`VotingOptionType`].
///
/// The `Categories` variant carries live directory data: callers must fetch
/// (or re-fetch) the selected categories immediately before submission, since
/// the union is a read-through preview rather than a cached snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionSource {
    Custom(Vec<CustomOption>),
    Users(Vec<UserOption>),
    Categories(Vec<Category>),
}

impl OptionSource {
    pub const fn voting_option_type(&self) -> VotingOptionType {
        match self {
            Self::Custom(_) => VotingOptionType::CustomOptions,
            Self::Users(_) => VotingOptionType::UserSpecific,
            Self::Categories(_) => VotingOptionType::CategoryUserBased,
        }
    }
}

/// An option ready for submission; the backend assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOption {
    pub name: String,
    pub image_url: Option<String>,
    pub target_user: Option<UserId>,
}

/// Resolves the concrete option set for the given sourcing strategy.
pub fn resolve(source: &OptionSource) -> Result<Vec<ResolvedOption>> {
    match source {
        OptionSource::Custom(raw) => resolve_custom(raw),
        OptionSource::Users(selected) => resolve_users(selected),
        OptionSource::Categories(categories) => resolve_categories(categories),
    }
}

fn resolve_custom(raw: &[CustomOption]) -> Result<Vec<ResolvedOption>> {
    let options: Vec<_> = raw
        .iter()
        .filter(|option| !option.name.trim().is_empty())
        .map(|option| ResolvedOption {
            name: option.name.trim().to_owned(),
            image_url: option.image_url.clone(),
            target_user: None,
        })
        .collect();
    if options.len() < 2 {
        return Err(ValidationError::InsufficientOptions);
    }
    Ok(options)
}

fn resolve_users(selected: &[UserOption]) -> Result<Vec<ResolvedOption>> {
    if selected.len() < 2 {
        return Err(ValidationError::InsufficientOptions);
    }
    Ok(selected
        .iter()
        .map(|selection| ResolvedOption {
            name: selection
                .display_name
                .clone()
                .unwrap_or_else(|| selection.user.name.clone()),
            image_url: None,
            target_user: Some(selection.user.id.clone()),
        })
        .collect())
}

fn resolve_categories(categories: &[Category]) -> Result<Vec<ResolvedOption>> {
    // Union of all member users, deduplicated by id, first-seen order kept.
    let mut seen = HashSet::new();
    let mut options = Vec::new();
    for user in categories.iter().flat_map(|category| category.users.iter()) {
        if seen.insert(user.id.clone()) {
            options.push(ResolvedOption {
                name: user.name.clone(),
                image_url: None,
                target_user: Some(user.id.clone()),
            });
        }
    }
    if options.len() < 2 {
        return Err(ValidationError::InsufficientUsersInCategories);
    }
    Ok(options)
}

/// Everything the author submits to create a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub title: String,
    pub description: String,
    pub kind: PollKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub result_display_time: Option<DateTime<Utc>>,
    pub category_type: CategoryScope,
    pub allowed_categories: Vec<CategoryId>,
    pub source: OptionSource,
}

/// Runs the mode-independent checks, then resolves the option set.
pub fn validate_draft(draft: &PollDraft) -> Result<Vec<ResolvedOption>> {
    if draft.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if draft.start_time >= draft.end_time {
        return Err(ValidationError::InvalidSchedule);
    }
    if draft.category_type == CategoryScope::Specific && draft.allowed_categories.is_empty() {
        return Err(ValidationError::MissingAllowedCategories);
    }
    resolve(&draft.source)
}

/// Partial edit of an existing poll. `options` replaces the whole option set
/// (and thereby the sourcing strategy); everything else is metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub result_display_time: Option<DateTime<Utc>>,
    pub options: Option<OptionSource>,
}

impl PollPatch {
    pub const fn alters_options(&self) -> bool {
        self.options.is_some()
    }
}

/// Validates an edit against the stored poll. Option-set changes are only
/// permitted while the poll has no votes and has not yet launched; metadata
/// edits stay open. Returns the re-resolved option set when one was supplied.
pub fn validate_edit(poll: &Poll, now: DateTime<Utc>, patch: &PollPatch) -> Result<Option<Vec<ResolvedOption>>> {
    if let Some(title) = &patch.title {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
    }

    let start = patch.start_time.unwrap_or(poll.start_time);
    let end = patch.end_time.unwrap_or(poll.end_time);
    if start >= end {
        return Err(ValidationError::InvalidSchedule);
    }

    let Some(source) = &patch.options else {
        return Ok(None);
    };
    if poll.total_votes > 0 || timing::status(now, poll.start_time, poll.end_time) != PollStatus::Upcoming {
        return Err(ValidationError::EditNotPermitted);
    }
    resolve(source).map(Some)
}
