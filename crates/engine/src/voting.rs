//! Vote-cast preconditions and result disclosure rules.
//!
//! These checks mirror what the backend enforces at commit time. The client
//! runs them to fail fast and to pick the right view state, but the server's
//! verdict on an in-flight request always wins (a poll may end while a cast
//! is on the wire).

use crate::timing;
use chrono::{DateTime, Utc};
use core::fmt::{self, Display};
use model::{CategoryId, CategoryScope, OptionId, Poll, PollKind, PollStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastError {
    /// A cast record already exists for this voter. Benign: callers switch to
    /// the already-voted view instead of surfacing an error.
    AlreadyVoted,
    /// The poll is not in its active window (not yet started, or ended).
    PollNotActive,
    /// The voter's categories do not intersect the poll's allowed set.
    NotEligible,
    /// Selection arity or membership violates the poll kind.
    InvalidOptionSelection,
}

impl Display for CastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AlreadyVoted => "You have already voted in this poll.",
            Self::PollNotActive => "This poll is not accepting votes right now.",
            Self::NotEligible => "You are not eligible to vote in this poll.",
            Self::InvalidOptionSelection => "The selection does not match the options this poll accepts.",
        })
    }
}

pub type Result<T> = core::result::Result<T, CastError>;

/// Whether the voter may cast at all, per the poll's category scope.
pub fn is_eligible(poll: &Poll, voter_categories: &[CategoryId]) -> bool {
    match poll.category_type {
        CategoryScope::All => true,
        CategoryScope::Specific => voter_categories
            .iter()
            .any(|category| poll.allowed_categories.contains(category)),
    }
}

/// Arity and membership checks for a selection, per the poll kind. Duplicate
/// ids are rejected so a multi-choice ballot cannot double-count an option.
pub fn check_selection(poll: &Poll, option_ids: &[OptionId]) -> Result<()> {
    match poll.kind {
        PollKind::SingleChoice if option_ids.len() != 1 => return Err(CastError::InvalidOptionSelection),
        PollKind::MultiChoice if option_ids.is_empty() => return Err(CastError::InvalidOptionSelection),
        _ => {}
    }
    for (index, id) in option_ids.iter().enumerate() {
        if !poll.has_option(id) || option_ids[..index].contains(id) {
            return Err(CastError::InvalidOptionSelection);
        }
    }
    Ok(())
}

/// Full precondition check for casting a vote.
pub fn check_cast(
    poll: &Poll,
    now: DateTime<Utc>,
    has_voted: bool,
    voter_categories: &[CategoryId],
    option_ids: &[OptionId],
) -> Result<()> {
    if timing::status(now, poll.start_time, poll.end_time) != PollStatus::Active {
        return Err(CastError::PollNotActive);
    }
    if !is_eligible(poll, voter_categories) {
        return Err(CastError::NotEligible);
    }
    if has_voted {
        return Err(CastError::AlreadyVoted);
    }
    check_selection(poll, option_ids)
}

/// Whether aggregate tallies are visible to this viewer. An active poll the
/// viewer has not voted in never reveals running counts; `result_display_time`
/// is informational text and does not gate disclosure.
pub fn should_show_results(status: PollStatus, viewer_has_voted: bool, is_result_published: bool) -> bool {
    status == PollStatus::Completed || viewer_has_voted || is_result_published
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    PollNotEnded,
}

impl Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PollNotEnded => "Results can only be published after the poll has ended.",
        })
    }
}

/// Publishing is valid only once the poll has completed. Re-publishing an
/// already published poll is a no-op, since the flag is irreversible.
pub fn check_publish(poll: &Poll, now: DateTime<Utc>) -> core::result::Result<(), PublishError> {
    if timing::status(now, poll.start_time, poll.end_time) != PollStatus::Completed {
        return Err(PublishError::PollNotEnded);
    }
    Ok(())
}
