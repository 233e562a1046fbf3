pub mod directory;
pub mod id;
pub mod poll;

pub use directory::{Category, CategoryPreview, User};
pub use id::{CategoryId, OptionId, PollId, UserId};
pub use poll::{CategoryScope, Poll, PollKind, PollOption, PollStatus, VoteStatus, VotingOptionType};
