use std::fmt;

use chrono::Utc;

use crate::api::{self, Author, CommentId, Deletion, QuoteSnapshot, Time, Uuid};

/// Identifier of a node in the local tree
///
/// Optimistic nodes carry a `Temporary` id until the store confirms them, so
/// they can never collide with a store id.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum NodeId {
    Stored(CommentId),
    Temporary(Uuid),
}

impl NodeId {
    pub fn temporary() -> NodeId {
        NodeId::Temporary(Uuid::new_v4())
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, NodeId::Temporary(_))
    }

    pub fn stored(&self) -> Option<CommentId> {
        match self {
            NodeId::Stored(id) => Some(*id),
            NodeId::Temporary(_) => None,
        }
    }
}

impl From<CommentId> for NodeId {
    fn from(id: CommentId) -> NodeId {
        NodeId::Stored(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Stored(id) => write!(f, "{}", id.0),
            NodeId::Temporary(id) => write!(f, "tmp-{}", id),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Comment {
    pub id: NodeId,
    pub author: Author,
    pub text: String,
    pub created_at: Time,

    /// Set on first edit, never cleared, never before `created_at`
    pub edited_at: Option<Time>,

    /// Soft-delete tombstone: the node keeps its place and its replies
    pub deleted: Option<Deletion>,

    pub replied_to: Option<QuoteSnapshot>,
    pub is_solution: bool,
    pub vote_total: i64,

    /// Child comments in chronological order
    pub replies: im::Vector<Comment>,
}

impl Comment {
    /// Builds the optimistic node shown while a create or reply is in flight
    pub fn pending(author: Author, text: String, replied_to: Option<QuoteSnapshot>) -> Comment {
        Comment {
            id: NodeId::temporary(),
            author,
            text,
            created_at: Utc::now(),
            edited_at: None,
            deleted: None,
            replied_to,
            is_solution: false,
            vote_total: 0,
            replies: im::Vector::new(),
        }
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Text to render, `None` for tombstones
    pub fn visible_text(&self) -> Option<&str> {
        match self.deleted {
            Some(_) => None,
            None => Some(&self.text),
        }
    }

    /// Copies every field of `other` except the replies and the quote
    ///
    /// Mutations of a node never touch either, but pushes may have updated
    /// them since `other` was taken.
    pub fn restore_fields_from(&mut self, other: &Comment) {
        let replies = std::mem::take(&mut self.replies);
        let replied_to = self.replied_to.take();
        *self = Comment {
            replies,
            replied_to,
            ..other.clone()
        };
    }
}

impl From<api::Comment> for Comment {
    fn from(c: api::Comment) -> Comment {
        Comment {
            id: NodeId::Stored(c.id),
            author: c.author,
            text: c.text,
            created_at: c.created_at,
            edited_at: c.edited_at,
            deleted: c.deleted,
            replied_to: c.replied_to,
            is_solution: c.is_solution,
            vote_total: c.vote_total,
            replies: c.replies.into_iter().map(Comment::from).collect(),
        }
    }
}
