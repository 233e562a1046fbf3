//! HTTP client for the poll backend.
//!
//! Every operation takes an explicit [`Session`] rather than reading ambient
//! auth state, and every enforcement decision made here is only a fast local
//! precheck: the backend re-validates at commit time and its verdict wins.

pub mod error;
pub mod payload;
pub mod watch;

use chrono::Utc;
use dashmap::DashMap;
use engine::options::{self, PollDraft, PollPatch};
use engine::voting::{self, CastError};
use error::{Error, Result};
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{body, Body, Method, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use model::{CategoryId, OptionId, Poll, PollId, User, UserId, VoteStatus};
use payload::{ApiFailure, CastVoteRequest, CreatePollRequest, PollView, PreviewResponse, UpdatePollRequest};
use serde::de::DeserializeOwned;

pub use model;

pub const APPLICATION_JSON: &str = "application/json";

/// Caller identity threaded into every request; no ambient session state.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token for the backend.
    pub token: Box<str>,
    /// The caller's directory identity; vote records key on this server-side.
    pub user: UserId,
    /// Directory categories the caller belongs to, for eligibility prechecks.
    pub categories: Vec<CategoryId>,
}

impl Session {
    pub fn new(token: impl Into<Box<str>>, user: UserId) -> Self {
        Self { token: token.into(), user, categories: Vec::new() }
    }
}

/// Outcome of a cast attempt. A pre-existing record is an expected state, not
/// an error: callers switch to the already-voted view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastOutcome {
    /// The ballot was recorded; the server reports the new vote state.
    Accepted(VoteStatus),
    /// A record already existed for this (poll, voter) pair.
    AlreadyVoted,
}

pub struct Client {
    /// API prefix, e.g. `https://events.example.com/api`.
    prefix: Box<str>,
    http: hyper::Client<HttpsConnector<HttpConnector>>,
    /// Polls with a cast currently in flight; at most one each.
    pending_casts: DashMap<PollId, ()>,
}

impl Client {
    pub fn new(base_url: &str) -> Self {
        let connector = HttpsConnector::new();
        let http = hyper::Client::builder().build(connector);
        Self {
            prefix: base_url.trim_end_matches('/').into(),
            http,
            pending_casts: DashMap::new(),
        }
    }

    fn uri(&self, path: &str) -> Result<Uri> {
        Ok([self.prefix.as_ref(), path].concat().parse()?)
    }

    async fn send_raw(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<body::Bytes> {
        let builder = Request::builder()
            .method(method)
            .uri(self.uri(path)?)
            .header(ACCEPT, APPLICATION_JSON)
            .header(AUTHORIZATION, format!("Bearer {}", session.token));
        let request = match payload {
            Some(bytes) => builder.header(CONTENT_TYPE, APPLICATION_JSON).body(Body::from(bytes))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.http.request(request).await?;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body()).await?;
        if status.is_success() {
            Ok(bytes)
        } else {
            Err(decode_failure(status, &bytes))
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        session: &Session,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> Result<T> {
        let bytes = self.send_raw(session, method, path, payload).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Admin view: every poll, regardless of eligibility.
    pub async fn list_polls(&self, session: &Session, page: u32, limit: u32) -> Result<Vec<Poll>> {
        self.send(session, Method::GET, &format!("/polls?page={page}&limit={limit}"), None).await
    }

    /// Polls the caller is eligible to see and vote in.
    pub async fn list_visible_polls(&self, session: &Session, page: u32, limit: u32) -> Result<Vec<Poll>> {
        self.send(session, Method::GET, &format!("/polls/visible?page={page}&limit={limit}"), None).await
    }

    /// A single poll together with the viewer's vote state.
    pub async fn get_poll(&self, session: &Session, id: &PollId) -> Result<PollView> {
        self.send(session, Method::GET, &format!("/polls/{id}"), None).await
    }

    /// The viewer's cast record for a poll.
    pub async fn vote_status(&self, session: &Session, id: &PollId) -> Result<VoteStatus> {
        self.send(session, Method::GET, &format!("/polls/{id}/vote"), None).await
    }

    /// Validates and resolves the draft locally first; invalid drafts never
    /// reach the wire.
    pub async fn create_poll(&self, session: &Session, draft: &PollDraft) -> Result<Poll> {
        let resolved = options::validate_draft(draft)?;
        let payload = serde_json::to_vec(&CreatePollRequest::new(draft, &resolved))?;
        self.send(session, Method::POST, "/polls", Some(payload)).await
    }

    /// Edits a poll. Option-set changes are gated locally: once any vote
    /// exists (or the poll has launched) only metadata goes through.
    pub async fn update_poll(&self, session: &Session, poll: &Poll, patch: &PollPatch) -> Result<Poll> {
        let resolved = options::validate_edit(poll, Utc::now(), patch)?;
        let payload = serde_json::to_vec(&UpdatePollRequest::new(patch, resolved.as_deref()))?;
        self.send(session, Method::PATCH, &format!("/polls/{}", poll.id), Some(payload)).await
    }

    /// Removes a poll and, on the backend, all of its votes.
    pub async fn delete_poll(&self, session: &Session, id: &PollId) -> Result<()> {
        self.send_raw(session, Method::DELETE, &format!("/polls/{id}"), None).await?;
        Ok(())
    }

    /// Submits a ballot. Local preconditions fail fast, but the poll may end
    /// while the request is on the wire, so the server's verdict is accepted
    /// either way. The request is never cancelled mid-flight: an ambiguous
    /// vote state is worse than waiting out a slow response.
    pub async fn cast_vote(
        &self,
        session: &Session,
        poll: &Poll,
        vote_state: &VoteStatus,
        option_ids: &[OptionId],
    ) -> Result<CastOutcome> {
        match voting::check_cast(poll, Utc::now(), vote_state.has_voted, &session.categories, option_ids) {
            Ok(()) => {}
            Err(CastError::AlreadyVoted) => return Ok(CastOutcome::AlreadyVoted),
            Err(err) => return Err(err.into()),
        }

        // At most one in-flight cast per poll; a concurrent second attempt
        // fails fast instead of racing the first.
        use dashmap::mapref::entry::Entry;
        match self.pending_casts.entry(poll.id.clone()) {
            Entry::Vacant(entry) => {
                entry.insert(());
            }
            Entry::Occupied(_) => return Err(Error::CastPending),
        }

        let result = self.submit_cast(session, &poll.id, option_ids).await;
        self.pending_casts.remove(&poll.id);
        result
    }

    async fn submit_cast(&self, session: &Session, id: &PollId, option_ids: &[OptionId]) -> Result<CastOutcome> {
        let payload = serde_json::to_vec(&CastVoteRequest { option_ids })?;
        let attempt = self
            .send::<VoteStatus>(session, Method::POST, &format!("/polls/{id}/votes"), Some(payload))
            .await;
        match attempt {
            Ok(recorded) => Ok(CastOutcome::Accepted(recorded)),
            // The duplicate-record violation is benign; the viewer simply
            // moves to the already-voted display state.
            Err(Error::Cast(CastError::AlreadyVoted)) => Ok(CastOutcome::AlreadyVoted),
            Err(Error::Status(status, _)) if status == StatusCode::CONFLICT => Ok(CastOutcome::AlreadyVoted),
            Err(err) => Err(err),
        }
    }

    /// Reveals tallies to everyone. Only valid once the poll has completed;
    /// the flag is irreversible.
    pub async fn publish_results(&self, session: &Session, poll: &Poll) -> Result<Poll> {
        voting::check_publish(poll, Utc::now())?;
        self.send(session, Method::POST, &format!("/polls/{}/publish", poll.id), None).await
    }

    /// Directory lookup of users available as voting options, optionally
    /// filtered by category.
    pub async fn list_option_users(&self, session: &Session, categories: &[CategoryId]) -> Result<Vec<User>> {
        let path = match join_ids(categories) {
            Some(joined) => format!("/users/options?categories={joined}"),
            None => String::from("/users/options"),
        };
        self.send(session, Method::GET, &path, None).await
    }

    /// Live category-to-user union preview. Callers re-run this immediately
    /// before submitting a category-sourced poll; the result is a read-through
    /// view, not a snapshot.
    pub async fn preview_category_users(
        &self,
        session: &Session,
        categories: &[CategoryId],
    ) -> Result<PreviewResponse> {
        let joined = join_ids(categories).unwrap_or_default();
        self.send(session, Method::GET, &format!("/categories/preview?categories={joined}"), None).await
    }

    /// Candidate pool for user-sourced options. A preview failure degrades to
    /// the unfiltered directory list instead of blocking poll authoring.
    pub async fn option_candidates(&self, session: &Session, categories: &[CategoryId]) -> Result<Vec<User>> {
        if categories.is_empty() {
            return self.list_option_users(session, &[]).await;
        }
        match self.preview_category_users(session, categories).await {
            Ok(preview) => Ok(preview.data),
            Err(err) => {
                log::warn!("category preview failed, falling back to the full directory: {err}");
                self.list_option_users(session, &[]).await
            }
        }
    }
}

/// Maps a non-success response onto the error taxonomy. Known backend codes
/// take precedence over the raw status.
fn decode_failure(status: StatusCode, bytes: &[u8]) -> Error {
    let failure: ApiFailure = serde_json::from_slice(bytes).unwrap_or_default();
    match failure.code.as_deref() {
        Some("ALREADY_VOTED") => Error::Cast(CastError::AlreadyVoted),
        Some("POLL_NOT_ACTIVE") => Error::Cast(CastError::PollNotActive),
        Some("NOT_ELIGIBLE") => Error::Cast(CastError::NotEligible),
        Some("EDIT_NOT_PERMITTED") => Error::Validation(engine::options::ValidationError::EditNotPermitted),
        _ => Error::Status(status, failure.message),
    }
}

fn join_ids(categories: &[CategoryId]) -> Option<String> {
    if categories.is_empty() {
        return None;
    }
    let mut joined = String::new();
    for (index, id) in categories.iter().enumerate() {
        if index > 0 {
            joined.push(',');
        }
        joined.push_str(id.as_str());
    }
    Some(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::options::ValidationError;

    #[test]
    fn known_backend_codes_win_over_the_raw_status() {
        let body = br#"{ "code": "ALREADY_VOTED", "message": "duplicate" }"#;
        assert!(matches!(
            decode_failure(StatusCode::CONFLICT, body),
            Error::Cast(CastError::AlreadyVoted)
        ));

        let body = br#"{ "code": "POLL_NOT_ACTIVE" }"#;
        assert!(matches!(
            decode_failure(StatusCode::FORBIDDEN, body),
            Error::Cast(CastError::PollNotActive)
        ));

        let body = br#"{ "code": "EDIT_NOT_PERMITTED" }"#;
        assert!(matches!(
            decode_failure(StatusCode::FORBIDDEN, body),
            Error::Validation(ValidationError::EditNotPermitted)
        ));
    }

    #[test]
    fn unknown_failures_keep_the_status_and_message() {
        let body = br#"{ "message": "quota exceeded" }"#;
        match decode_failure(StatusCode::TOO_MANY_REQUESTS, body) {
            Error::Status(status, Some(message)) => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("unexpected mapping: {other:?}"),
        }

        // Non-JSON bodies still map somewhere sensible.
        match decode_failure(StatusCode::BAD_GATEWAY, b"<html>oops</html>") {
            Error::Status(status, None) => assert_eq!(status, StatusCode::BAD_GATEWAY),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn category_filters_join_into_one_query_value() {
        assert_eq!(join_ids(&[]), None);
        let ids = [CategoryId::new("c1"), CategoryId::new("c2"), CategoryId::new("c3")];
        assert_eq!(join_ids(&ids).as_deref(), Some("c1,c2,c3"));
    }
}
