use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

pub const STUB_UUID: Uuid = uuid!("ffffffff-ffff-ffff-ffff-ffffffffffff");

mod comment;
pub use comment::{Comment, CommentId, Deletion, QuoteSnapshot};

mod content;
pub use content::{ContentId, ContentRef, ContentType};

mod error;
pub use error::Error;

mod feed;
pub use feed::{FeedEvent, FeedMessage};

mod query;
pub use query::{CommentPage, ListComments, OrderType, SortBy};

mod request;
pub use request::{DeleteComment, EditComment, NewComment, NewReply, SetSolution, Success};

mod user;
pub use user::{AuthToken, Author, UserId};

// Strings are stored by the reference server in places that cannot hold a null
// byte, so every text coming from a client goes through this.
pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

/// Checks the text of a new comment, reply or edit
pub fn validate_text(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyText);
    }
    Ok(())
}
