use crate::{api, NodeId};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("comment text is empty")]
    EmptyText,

    #[error("null byte in comment text")]
    NullByte,

    #[error("comment {0} is deleted")]
    Deleted(NodeId),

    #[error("comment {0} is not confirmed by the store yet")]
    Unconfirmed(NodeId),

    #[error("editing comments is disabled")]
    EditDisabled,

    #[error("solutions only exist on forum threads")]
    NotAForumThread,
}

/// Failure of an engine operation
///
/// Clonable so that every caller coalesced onto the same page load gets the
/// same result.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Transport-level failure, including timeouts; never retried automatically
    #[error("network error: {0}")]
    Transient(String),

    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("permission denied")]
    Unauthorized,

    /// The local tree is stale, the view reloads before reporting this
    #[error("comment {0} is not in the local tree")]
    NotFound(NodeId),

    #[error("comment {0} already has a mutation in flight")]
    Busy(NodeId),

    #[error("thread view is closed")]
    Closed,

    #[error("store rejected the request: {0}")]
    Remote(api::Error),
}

impl From<api::Error> for Error {
    fn from(e: api::Error) -> Error {
        match e {
            api::Error::PermissionDenied => Error::Unauthorized,
            api::Error::EmptyText => Error::Validation(ValidationError::EmptyText),
            api::Error::NullByteInString(_) => Error::Validation(ValidationError::NullByte),
            e => Error::Remote(e),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Transient(e.to_string())
    }
}

/// Rejects text before any optimistic change is applied
pub(crate) fn validate_text(text: &str) -> Result<(), ValidationError> {
    match api::validate_text(text) {
        Ok(()) => Ok(()),
        Err(api::Error::EmptyText) => Err(ValidationError::EmptyText),
        Err(_) => Err(ValidationError::NullByte),
    }
}
