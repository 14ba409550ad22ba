use crate::{Comment, ContentId, ContentRef, ContentType};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Asc,
    Desc,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    CreatedAt,
    Replies,
    Votes,
}

/// Query string of `GET /comments`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListComments {
    pub content_type: ContentType,
    pub content_id: ContentId,
    pub limit: usize,
    pub offset: usize,
    pub order: OrderType,
    pub sort_by: SortBy,
}

impl ListComments {
    pub fn content(&self) -> ContentRef {
        ContentRef {
            content_type: self.content_type,
            content_id: self.content_id,
        }
    }
}

/// Body of a successful `GET /comments`
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPage {
    pub success: bool,

    /// Top-level comments of this page, each with its full reply tree
    #[serde(rename = "comentarios")]
    pub comments: Vec<Comment>,

    /// Number of top-level comments in the whole thread
    pub total: usize,
}
