use core::fmt::{self, Display};
use engine::options::ValidationError;
use engine::voting::{CastError, PublishError};
use hyper::http::uri::InvalidUri;
use hyper::{http, StatusCode};

#[derive(Debug)]
pub enum Error {
    /// Connection-level failure. Safe to retry; casting is idempotent per
    /// (poll, voter) on the server side.
    Transport(hyper::Error),
    Http(http::Error),
    Uri(InvalidUri),
    /// The response body was not the JSON we expected.
    Data(serde_json::Error),
    /// Rejected locally before anything was sent.
    Validation(ValidationError),
    /// Cast precondition failure, local or reported by the server.
    Cast(CastError),
    Publish(PublishError),
    /// A cast for this poll is still in flight; the submit control must stay
    /// disabled until it resolves.
    CastPending,
    /// Any other non-success response, with the server's message if present.
    Status(StatusCode, Option<String>),
}

impl From<hyper::Error> for Error {
    fn from(err: hyper::Error) -> Self {
        Self::Transport(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::Http(err)
    }
}

impl From<InvalidUri> for Error {
    fn from(err: InvalidUri) -> Self {
        Self::Uri(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Data(err)
    }
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<CastError> for Error {
    fn from(err: CastError) -> Self {
        Self::Cast(err)
    }
}

impl From<PublishError> for Error {
    fn from(err: PublishError) -> Self {
        Self::Publish(err)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(err) => write!(f, "failed to reach the backend: {err}"),
            Self::Http(err) => write!(f, "could not construct the request: {err}"),
            Self::Uri(err) => write!(f, "invalid endpoint URI: {err}"),
            Self::Data(err) => write!(f, "unexpected data in the response: {err}"),
            Self::Validation(err) => err.fmt(f),
            Self::Cast(err) => err.fmt(f),
            Self::Publish(err) => err.fmt(f),
            Self::CastPending => f.write_str("A vote for this poll is already being submitted."),
            Self::Status(status, Some(message)) => write!(f, "the backend rejected the request ({status}): {message}"),
            Self::Status(status, None) => write!(f, "the backend rejected the request ({status})"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
