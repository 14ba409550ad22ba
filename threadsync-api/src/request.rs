use crate::{CommentId, ContentId, ContentRef, ContentType, Error, QuoteSnapshot};

/// Body of `POST /comments`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewComment {
    pub content_type: ContentType,
    pub content_id: ContentId,
    pub text: String,
}

impl NewComment {
    pub fn new(content: ContentRef, text: String) -> NewComment {
        NewComment {
            content_type: content.content_type,
            content_id: content.content_id,
            text,
        }
    }

    pub fn content(&self) -> ContentRef {
        ContentRef {
            content_type: self.content_type,
            content_id: self.content_id,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_text(&self.text)
    }
}

/// Body of `POST /comments/reply`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct NewReply {
    pub parent_id: CommentId,
    pub text: String,

    /// Snapshot of the quoted comment, which is not necessarily the parent
    #[serde(default)]
    pub replied_to: Option<QuoteSnapshot>,
}

impl NewReply {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_text(&self.text)?;
        if let Some(q) = &self.replied_to {
            crate::validate_string(&q.text)?;
        }
        Ok(())
    }
}

/// Body of `PUT /comments/edit`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EditComment {
    pub comment_id: CommentId,
    pub text: String,
}

impl EditComment {
    pub fn validate(&self) -> Result<(), Error> {
        crate::validate_text(&self.text)
    }
}

/// Query string of `DELETE /comments/delete`
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DeleteComment {
    pub id: CommentId,
}

/// Body of `PUT /comments/solution`
///
/// Setting `is_solution` sweeps every other post of `hilo_id` back to false.
#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct SetSolution {
    pub hilo_id: ContentId,
    pub comment_id: CommentId,
    pub is_solution: bool,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Success {
        Success { success: true }
    }
}
