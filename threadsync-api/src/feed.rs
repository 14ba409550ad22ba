use crate::{Comment, CommentId, ContentRef, Time, UserId};

/// One push notification, scoped to the thread container it concerns
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FeedEvent {
    pub content: ContentRef,

    #[serde(flatten)]
    pub message: FeedMessage,
}

/// Serialized as `{"event": "new_comment", "payload": {...}}`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum FeedMessage {
    NewComment(Comment),
    NewReply {
        parent_id: CommentId,
        comment: Comment,
    },
    VoteChanged {
        comment_id: CommentId,
        vote_total: i64,
    },
    CommentEdited {
        comment_id: CommentId,
        text: String,
        edited_at: Time,
    },
    CommentDeleted {
        comment_id: CommentId,
        deleted_at: Time,
        deleted_by: UserId,
    },
    SolutionChanged {
        comment_id: CommentId,
        is_solution: bool,
    },
}

impl FeedMessage {
    /// The already-existing comment this message modifies, if any
    ///
    /// Insertions return `None`: they target a parent, not a comment.
    pub fn target(&self) -> Option<CommentId> {
        match self {
            FeedMessage::NewComment(_) | FeedMessage::NewReply { .. } => None,
            FeedMessage::VoteChanged { comment_id, .. }
            | FeedMessage::CommentEdited { comment_id, .. }
            | FeedMessage::CommentDeleted { comment_id, .. }
            | FeedMessage::SolutionChanged { comment_id, .. } => Some(*comment_id),
        }
    }
}
