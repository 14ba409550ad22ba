use crate::{
    api::{Deletion, FeedEvent, FeedMessage},
    thread::ThreadState,
    Comment, NodeId, Store, ThreadView,
};

impl<S: Store + 'static> ThreadView<S> {
    /// Merges one push notification into the tree
    ///
    /// Safe to call at any time and any number of times with the same event.
    /// Returns false if the event was not for this view or the view is closed.
    pub fn merge(&self, evt: FeedEvent) -> bool {
        let mut st = self.inner.state.lock();
        if st.closed {
            tracing::debug!(?evt, "ignoring push for a closed view");
            return false;
        }
        if evt.content != self.inner.content {
            tracing::debug!(?evt, content = %self.inner.content, "ignoring push for another thread");
            return false;
        }
        st.apply_message(evt.message);
        true
    }
}

impl ThreadState {
    pub(crate) fn apply_message(&mut self, msg: FeedMessage) {
        if let Some(buffer) = self.buffered.as_mut() {
            buffer.push(msg);
            return;
        }
        if let Some(id) = self.deferral_key(&msg) {
            tracing::debug!(%id, "deferring push until the pending mutation settles");
            self.deferred.entry(id).or_default().push(msg);
            return;
        }
        match msg {
            FeedMessage::NewComment(c) => {
                let id = NodeId::Stored(c.id);
                if self.tree.contains(id) {
                    tracing::debug!(%id, "ignoring already-held pushed comment");
                    return;
                }
                self.tree = self.pager.place_new(&self.tree, Comment::from(c));
                self.pager.note_inserted();
            }
            FeedMessage::NewReply { parent_id, comment } => {
                let id = NodeId::Stored(comment.id);
                if self.tree.contains(id) {
                    tracing::debug!(%id, "ignoring already-held pushed reply");
                    return;
                }
                match self
                    .tree
                    .append_reply(NodeId::Stored(parent_id), Comment::from(comment))
                {
                    Some(t) => self.tree = t,
                    None => {
                        // it will come along with its parent's page
                        tracing::debug!(%id, %parent_id, "ignoring pushed reply to unloaded parent")
                    }
                }
            }
            FeedMessage::VoteChanged {
                comment_id,
                vote_total,
            } => self.update(NodeId::Stored(comment_id), |c| c.vote_total = vote_total),
            FeedMessage::CommentEdited {
                comment_id,
                text,
                edited_at,
            } => self.update(NodeId::Stored(comment_id), |c| {
                c.text = text;
                c.edited_at = Some(edited_at.max(c.created_at));
            }),
            FeedMessage::CommentDeleted {
                comment_id,
                deleted_at,
                deleted_by,
            } => {
                self.update(NodeId::Stored(comment_id), |c| {
                    if c.deleted.is_none() {
                        c.deleted = Some(Deletion {
                            at: deleted_at,
                            by: deleted_by,
                        });
                    }
                });
                self.tree = self.tree.with_quotes_deleted(comment_id, true);
            }
            FeedMessage::SolutionChanged {
                comment_id,
                is_solution,
            } => match self
                .tree
                .with_solution(NodeId::Stored(comment_id), is_solution)
            {
                Some(t) => self.tree = t,
                None => tracing::debug!(%comment_id, "ignoring solution push for unloaded comment"),
            },
        }
    }

    /// Pending node a push must wait for, if any
    fn deferral_key(&self, msg: &FeedMessage) -> Option<NodeId> {
        let target = NodeId::Stored(msg.target()?);
        if self.pending.contains_key(&target) {
            return Some(target);
        }
        if let FeedMessage::SolutionChanged {
            is_solution: true, ..
        } = msg
        {
            // Marking a solution also unmarks the current holder
            if let Some(holder) = self.tree.solution_holder() {
                if self.pending.contains_key(&holder.id) {
                    return Some(holder.id);
                }
            }
        }
        None
    }

    fn update(&mut self, id: NodeId, f: impl FnOnce(&mut Comment)) {
        match self.tree.map_node(id, f) {
            Some(t) => self.tree = t,
            None => tracing::debug!(%id, "ignoring push for unloaded comment"),
        }
    }
}
