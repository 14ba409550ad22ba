use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;
use uuid::Uuid;

use crate::CommentId;

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Comment not found {0}")]
    NotFound(CommentId),

    #[error("Comment text is empty")]
    EmptyText,

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Comment was deleted {0}")]
    CommentDeleted(CommentId),

    #[error("Content item is not a forum thread")]
    NotAForumThread,
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::EmptyText => StatusCode::BAD_REQUEST,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::CommentDeleted(_) => StatusCode::CONFLICT,
            Error::NotAForumThread => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        let mut body = match self {
            Error::Unknown(_) => json!({ "type": "unknown" }),
            Error::PermissionDenied => json!({ "type": "permission-denied" }),
            Error::NotFound(id) => json!({
                "type": "not-found",
                "id": id,
            }),
            Error::EmptyText => json!({ "type": "empty-text" }),
            Error::NullByteInString(s) => json!({
                "type": "null-byte",
                "string": s,
            }),
            Error::CommentDeleted(id) => json!({
                "type": "comment-deleted",
                "id": id,
            }),
            Error::NotAForumThread => json!({ "type": "not-a-forum-thread" }),
        };
        body["success"] = json!(false);
        body["error"] = match self {
            Error::Unknown(msg) => json!(msg),
            e => json!(e.to_string()),
        };
        serde_json::to_vec(&body).expect("serializing error body")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let id = || -> anyhow::Result<CommentId> {
            data.get("id")
                .and_then(|id| id.as_str())
                .and_then(|id| Uuid::from_str(id).ok())
                .map(CommentId)
                .ok_or_else(|| anyhow!("error is about a comment but has no proper id"))
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("error").and_then(|msg| msg.as_str()).unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(id()?),
                "empty-text" => Error::EmptyText,
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "comment-deleted" => Error::CommentDeleted(id()?),
                "not-a-forum-thread" => Error::NotAForumThread,
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}
