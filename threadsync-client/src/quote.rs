use crate::{api::QuoteSnapshot, Comment, Error, NodeId, ValidationError};

/// Freezes `comment` for quoting in a reply
///
/// Tombstones cannot be quoted, nor can optimistic nodes since the snapshot
/// must reference a store id.
pub fn capture_quote(comment: &Comment) -> Result<QuoteSnapshot, Error> {
    if comment.is_deleted() {
        return Err(ValidationError::Deleted(comment.id).into());
    }
    let id = match comment.id {
        NodeId::Stored(id) => id,
        id @ NodeId::Temporary(_) => return Err(ValidationError::Unconfirmed(id).into()),
    };
    Ok(QuoteSnapshot {
        id,
        author: comment.author.display_name.clone(),
        text: comment.text.clone(),
        color: comment.author.color.clone(),
        is_edited: comment.is_edited(),
        is_deleted: false,
    })
}
