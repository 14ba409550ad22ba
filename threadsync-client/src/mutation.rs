use chrono::Utc;

use crate::{
    api::{self, CommentId, Deletion, EditComment, NewComment, NewReply},
    capture_quote,
    error::validate_text,
    thread::{PendingKind, ThreadState},
    Comment, Error, NodeId, Store, ThreadView, ValidationError,
};

impl<S: Store + 'static> ThreadView<S> {
    /// Posts a new top-level comment
    ///
    /// The comment shows up in the tree under a temporary id right away, and
    /// is swapped for the stored comment once the store confirms it, or
    /// removed if the store fails.
    pub async fn post_comment(&self, text: String) -> Result<CommentId, Error> {
        validate_text(&text)?;
        let (temp, epoch) = {
            let mut guard = self.lock_open()?;
            let st = &mut *guard;
            let node = Comment::pending(self.inner.config.viewer.clone(), text.clone(), None);
            let temp = node.id;
            st.tree = st.pager.place_new(&st.tree, node);
            st.pending.insert(temp, PendingKind::Create);
            (temp, st.epoch)
        };
        let res = self
            .inner
            .store
            .create_comment(&NewComment::new(self.inner.content, text))
            .await;
        self.settle_create(temp, epoch, res, true)
    }

    /// Replies under `parent`, optionally quoting `quoting`
    ///
    /// The quoted comment may be any node of the thread, not only the parent.
    pub async fn reply(
        &self,
        parent: NodeId,
        quoting: Option<NodeId>,
        text: String,
    ) -> Result<CommentId, Error> {
        validate_text(&text)?;
        let prepared = self.begin_reply(parent, quoting, &text);
        let (temp, epoch, req) = self.recover(prepared).await?;
        let res = self.inner.store.create_reply(&req).await;
        self.settle_create(temp, epoch, res, false)
    }

    /// Replaces the text of `id`
    ///
    /// `authorized` is the caller's decision that the viewer may edit it.
    pub async fn edit(&self, id: NodeId, text: String, authorized: bool) -> Result<(), Error> {
        if !self.inner.config.edit_enabled {
            return Err(ValidationError::EditDisabled.into());
        }
        if !authorized {
            return Err(Error::Unauthorized);
        }
        validate_text(&text)?;
        let prepared = self.begin(id, PendingKind::Edit, |c| {
            c.text = text.clone();
            c.edited_at = Some(Utc::now().max(c.created_at));
        });
        let (comment_id, previous, epoch) = self.recover(prepared).await?;
        let res = self
            .inner
            .store
            .edit_comment(&EditComment { comment_id, text })
            .await;
        self.finish(id, epoch, &previous, res, |_| ())
    }

    /// Tombstones `id`, leaving its replies in place
    ///
    /// `authorized` is the caller's decision that the viewer is the author of
    /// the comment or the owner of the thread.
    pub async fn delete(&self, id: NodeId, authorized: bool) -> Result<(), Error> {
        if !authorized {
            return Err(Error::Unauthorized);
        }
        let deletion = Deletion {
            at: Utc::now(),
            by: self.inner.config.viewer.id,
        };
        let prepared = self.begin(id, PendingKind::Delete, |c| c.deleted = Some(deletion));
        let (comment_id, previous, epoch) = self.recover(prepared).await?;
        {
            let mut st = self.inner.state.lock();
            if st.accepts(epoch) {
                st.tree = st.tree.with_quotes_deleted(comment_id, true);
            }
        }
        let res = self.inner.store.delete_comment(comment_id).await;
        self.finish(id, epoch, &previous, res, |st| {
            st.tree = st.tree.with_quotes_deleted(comment_id, false);
        })
    }

    /// Reloads and reports a target missing from the local tree
    pub(crate) async fn recover<T>(&self, prepared: Result<T, Error>) -> Result<T, Error> {
        match prepared {
            Err(Error::NotFound(id)) => Err(self.stale(id).await),
            res => res,
        }
    }

    /// Checks and optimistically applies a single-node mutation
    fn begin(
        &self,
        id: NodeId,
        kind: PendingKind,
        f: impl FnOnce(&mut Comment),
    ) -> Result<(CommentId, Comment, u64), Error> {
        let mut st = self.lock_open()?;
        let (comment_id, previous) = st.target(id)?;
        st.apply(id, kind, f)?;
        Ok((comment_id, previous, st.epoch))
    }

    fn begin_reply(
        &self,
        parent: NodeId,
        quoting: Option<NodeId>,
        text: &str,
    ) -> Result<(NodeId, u64, NewReply), Error> {
        let mut st = self.lock_open()?;
        let parent_node = st.tree.find_by_id(parent).ok_or(Error::NotFound(parent))?;
        let parent_id = parent.stored().ok_or(ValidationError::Unconfirmed(parent))?;
        if parent_node.is_deleted() {
            return Err(ValidationError::Deleted(parent).into());
        }
        if st.pending.contains_key(&parent) {
            return Err(Error::Busy(parent));
        }
        let replied_to = match quoting {
            None => None,
            Some(q) => Some(capture_quote(
                st.tree.find_by_id(q).ok_or(Error::NotFound(q))?,
            )?),
        };
        let node = Comment::pending(
            self.inner.config.viewer.clone(),
            String::from(text),
            replied_to.clone(),
        );
        let temp = node.id;
        st.tree = st
            .tree
            .append_reply(parent, node)
            .ok_or(Error::NotFound(parent))?;
        st.pending.insert(temp, PendingKind::Create);
        let req = NewReply {
            parent_id,
            text: String::from(text),
            replied_to,
        };
        Ok((temp, st.epoch, req))
    }

    /// Swaps the optimistic node `temp` for the stored comment, or drops it
    fn settle_create(
        &self,
        temp: NodeId,
        epoch: u64,
        res: Result<api::Comment, Error>,
        top_level: bool,
    ) -> Result<CommentId, Error> {
        let mut guard = self.inner.state.lock();
        let st = &mut *guard;
        if !st.accepts(epoch) {
            tracing::debug!(%temp, "discarding create response for a reset or closed view");
            return res.map(|c| c.id);
        }
        st.pending.remove(&temp);
        match res {
            Ok(c) => {
                let id = c.id;
                let stored = NodeId::Stored(id);
                let tree = if st.tree.contains(stored) {
                    tracing::debug!(%stored, "created comment already arrived through the feed");
                    st.pager.rename_new(temp, None);
                    st.tree.remove_node(temp)
                } else {
                    st.pager.rename_new(temp, Some(stored));
                    if top_level {
                        st.pager.note_inserted();
                    }
                    st.tree.map_node(temp, move |n| *n = Comment::from(c))
                };
                match tree {
                    Some(t) => st.tree = t,
                    None => tracing::debug!(%temp, "optimistic comment vanished before confirmation"),
                }
                Ok(id)
            }
            Err(err) => {
                tracing::warn!(%temp, %err, "create failed, discarding optimistic comment");
                st.pager.rename_new(temp, None);
                if let Some(t) = st.tree.remove_node(temp) {
                    st.tree = t;
                }
                Err(err)
            }
        }
    }

    /// Commits or rolls back a single-node mutation once the store answered
    pub(crate) fn finish(
        &self,
        id: NodeId,
        epoch: u64,
        previous: &Comment,
        res: Result<(), Error>,
        undo: impl FnOnce(&mut ThreadState),
    ) -> Result<(), Error> {
        let mut st = self.inner.state.lock();
        if !st.accepts(epoch) {
            tracing::debug!(%id, "discarding mutation response for a reset or closed view");
            return res;
        }
        if let Err(err) = &res {
            tracing::warn!(%id, %err, "mutation failed, rolling back");
            st.rollback(id, previous);
            undo(&mut *st);
        }
        st.settle(id);
        res
    }
}
