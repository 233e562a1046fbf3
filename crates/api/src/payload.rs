//! Wire shapes for the backend's JSON API. Field names are camelCase on the
//! wire; request payloads borrow from the validated inputs so nothing is
//! cloned just to serialize it.

use chrono::{DateTime, Utc};
use engine::options::{PollDraft, PollPatch, ResolvedOption};
use model::{CategoryId, CategoryPreview, CategoryScope, OptionId, Poll, PollKind, User, UserId, VotingOptionType};
use serde::{Deserialize, Serialize};

/// A single poll with the viewer's vote state, as returned by `GET /polls/{id}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollView {
    #[serde(flatten)]
    pub poll: Poll,
    #[serde(default)]
    pub has_voted: bool,
    #[serde(default)]
    pub selected_options: Vec<OptionId>,
}

/// An option submitted at creation time; the backend assigns ids.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOption<'a> {
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_user: Option<&'a UserId>,
}

impl<'a> From<&'a ResolvedOption> for NewOption<'a> {
    fn from(option: &'a ResolvedOption) -> Self {
        Self {
            name: &option.name,
            image_url: option.image_url.as_deref(),
            target_user: option.target_user.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePollRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
    #[serde(rename = "type")]
    pub kind: PollKind,
    pub voting_option_type: VotingOptionType,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_display_time: Option<DateTime<Utc>>,
    pub category_type: CategoryScope,
    pub allowed_categories: &'a [CategoryId],
    pub options: Vec<NewOption<'a>>,
}

impl<'a> CreatePollRequest<'a> {
    pub fn new(draft: &'a PollDraft, resolved: &'a [ResolvedOption]) -> Self {
        Self {
            title: &draft.title,
            description: &draft.description,
            kind: draft.kind,
            voting_option_type: draft.source.voting_option_type(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            result_display_time: draft.result_display_time,
            category_type: draft.category_type,
            allowed_categories: &draft.allowed_categories,
            options: resolved.iter().map(NewOption::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePollRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_display_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voting_option_type: Option<VotingOptionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NewOption<'a>>>,
}

impl<'a> UpdatePollRequest<'a> {
    pub fn new(patch: &'a PollPatch, resolved: Option<&'a [ResolvedOption]>) -> Self {
        Self {
            title: patch.title.as_deref(),
            description: patch.description.as_deref(),
            start_time: patch.start_time,
            end_time: patch.end_time,
            result_display_time: patch.result_display_time,
            voting_option_type: patch.options.as_ref().map(|source| source.voting_option_type()),
            options: resolved.map(|options| options.iter().map(NewOption::from).collect()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastVoteRequest<'a> {
    pub option_ids: &'a [OptionId],
}

/// Category-to-user union preview: the live candidate list plus a summary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub data: Vec<User>,
    pub preview: CategoryPreview,
}

/// Error body the backend attaches to non-success responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFailure {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use engine::options::{self, CustomOption, OptionSource};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn create_request_serializes_to_the_documented_shape() {
        let draft = PollDraft {
            title: String::from("Best demo"),
            description: String::from("Quarterly demo day"),
            kind: PollKind::SingleChoice,
            start_time: at(0),
            end_time: at(3_600),
            result_display_time: None,
            category_type: CategoryScope::All,
            allowed_categories: Vec::new(),
            source: OptionSource::Custom(vec![
                CustomOption { name: String::from("Alpha"), image_url: None },
                CustomOption { name: String::from("Beta"), image_url: Some(String::from("https://img/b.png")) },
            ]),
        };
        let resolved = options::validate_draft(&draft).unwrap();
        let value = serde_json::to_value(CreatePollRequest::new(&draft, &resolved)).unwrap();

        assert_eq!(value["title"], "Best demo");
        assert_eq!(value["type"], "SINGLE_CHOICE");
        assert_eq!(value["votingOptionType"], "CUSTOM_OPTIONS");
        assert_eq!(value["categoryType"], "ALL");
        assert_eq!(value["options"][0]["name"], "Alpha");
        assert_eq!(value["options"][1]["imageUrl"], "https://img/b.png");
        assert!(value.get("resultDisplayTime").is_none());
        assert!(value["options"][0].get("targetUser").is_none());
    }

    #[test]
    fn update_request_omits_untouched_fields() {
        let patch = PollPatch {
            description: Some(String::from("now with cake")),
            ..PollPatch::default()
        };
        let value = serde_json::to_value(UpdatePollRequest::new(&patch, None)).unwrap();
        assert_eq!(value["description"], "now with cake");
        assert!(value.get("title").is_none());
        assert!(value.get("options").is_none());
        assert!(value.get("votingOptionType").is_none());
    }

    #[test]
    fn cast_request_carries_option_ids() {
        let ids = [OptionId::new("o1"), OptionId::new("o2")];
        let value = serde_json::to_value(CastVoteRequest { option_ids: &ids }).unwrap();
        assert_eq!(value, serde_json::json!({ "optionIds": ["o1", "o2"] }));
    }

    #[test]
    fn poll_view_deserializes_flattened_vote_state() {
        let raw = r#"{
            "id": "p1",
            "title": "Lunch spot",
            "type": "MULTI_CHOICE",
            "votingOptionType": "CUSTOM_OPTIONS",
            "startTime": "2026-01-01T00:00:00Z",
            "endTime": "2026-01-02T00:00:00Z",
            "categoryType": "ALL",
            "options": [],
            "hasVoted": true,
            "selectedOptions": ["o2"]
        }"#;
        let view: PollView = serde_json::from_str(raw).unwrap();
        assert_eq!(view.poll.kind, PollKind::MultiChoice);
        assert!(view.has_voted);
        assert_eq!(view.selected_options, [OptionId::new("o2")]);
    }
}
