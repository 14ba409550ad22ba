use std::fmt;

use uuid::Uuid;

use crate::{Author, Time, UserId};

/// Store-assigned comment identifier
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct CommentId(pub Uuid);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Deletion {
    pub at: Time,
    pub by: UserId,
}

/// Frozen copy of the comment a reply quotes, taken when the reply was composed
///
/// Only `is_deleted` ever changes after capture: deleting the quoted comment
/// flips it, while edits of the quoted comment leave `text` untouched.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct QuoteSnapshot {
    pub id: CommentId,
    pub author: String,
    pub text: String,
    pub color: String,
    pub is_edited: bool,
    pub is_deleted: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub author: Author,
    pub text: String,
    pub created_at: Time,

    /// Set on first edit, never cleared
    #[serde(default)]
    pub edited_at: Option<Time>,

    /// Soft-delete tombstone
    #[serde(default)]
    pub deleted: Option<Deletion>,

    #[serde(default)]
    pub replied_to: Option<QuoteSnapshot>,

    #[serde(default)]
    pub is_solution: bool,

    #[serde(default)]
    pub vote_total: i64,

    /// Children in chronological order
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.is_some()
    }

    /// Number of replies at any depth below this comment
    pub fn reply_count(&self) -> usize {
        self.replies.iter().map(|r| 1 + r.reply_count()).sum()
    }

    pub fn find(&self, id: CommentId) -> Option<&Comment> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter().find_map(|r| r.find(id))
    }

    pub fn find_mut(&mut self, id: CommentId) -> Option<&mut Comment> {
        if self.id == id {
            return Some(self);
        }
        self.replies.iter_mut().find_map(|r| r.find_mut(id))
    }

    /// Calls `f` on this comment and every reply below it
    pub fn for_each_mut(&mut self, f: &mut impl FnMut(&mut Comment)) {
        f(self);
        for r in self.replies.iter_mut() {
            r.for_each_mut(f);
        }
    }
}
