use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
    api::{
        self, CommentId, CommentPage, ContentRef, EditComment, FeedEvent, ListComments,
        NewComment, NewReply, SetSolution,
    },
    Error,
};

/// Remote side of a thread view
///
/// Implementations report every non-success as an `Err`, which the view turns
/// into a rollback of the matching optimistic change. Timeouts are the
/// implementation's business and surface as `Error::Transient`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_page(&self, q: &ListComments) -> Result<CommentPage, Error>;
    async fn create_comment(&self, c: &NewComment) -> Result<api::Comment, Error>;
    async fn create_reply(&self, r: &NewReply) -> Result<api::Comment, Error>;
    async fn edit_comment(&self, e: &EditComment) -> Result<(), Error>;
    async fn delete_comment(&self, id: CommentId) -> Result<(), Error>;

    /// Sets or clears the solution flag, sweeping other posts of the thread
    async fn set_solution(&self, s: &SetSolution) -> Result<(), Error>;

    /// Push notifications for `content`, ending when the store hangs up
    async fn subscribe(&self, content: &ContentRef) -> Result<BoxStream<'static, FeedEvent>, Error>;
}
