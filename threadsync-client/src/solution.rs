use crate::{
    api::SetSolution,
    thread::PendingKind,
    Comment, CommentTree, Error, NodeId, Store, ThreadView, ValidationError,
};

/// Which post of a forum thread, if any, is its accepted answer
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolutionState {
    NoSolution,
    SolutionAt(NodeId),
}

impl SolutionState {
    pub fn of(tree: &CommentTree) -> SolutionState {
        match tree.solution_holder() {
            Some(c) => SolutionState::SolutionAt(c.id),
            None => SolutionState::NoSolution,
        }
    }
}

impl CommentTree {
    pub fn solution_holder(&self) -> Option<&Comment> {
        self.iter().find(|c| c.is_solution)
    }

    /// Sets the solution flag of `id`, clearing it everywhere else when set
    ///
    /// Both changes land in the same returned tree, so no observer can ever
    /// see two solutions. Returns `None` if `id` is not in the tree.
    pub fn with_solution(&self, id: NodeId, is_solution: bool) -> Option<CommentTree> {
        let mut tree = self.map_node(id, |c| c.is_solution = is_solution)?;
        if is_solution {
            let others = tree
                .iter()
                .filter(|c| c.is_solution && c.id != id)
                .map(|c| c.id)
                .collect::<Vec<_>>();
            for other in others {
                tree = tree.map_node(other, |c| c.is_solution = false)?;
            }
        }
        Some(tree)
    }
}

struct Toggle {
    comment: Comment,
    holder: Option<Comment>,
    epoch: u64,
}

impl<S: Store + 'static> ThreadView<S> {
    pub fn solution(&self) -> SolutionState {
        SolutionState::of(&self.inner.state.lock().tree)
    }

    /// Marks `id` as the thread's solution, unmarking the previous one
    ///
    /// Only the author of a forum thread may do this. Marking the current
    /// solution again does nothing.
    pub async fn mark_solution(&self, id: NodeId, is_thread_author: bool) -> Result<(), Error> {
        self.toggle_solution(id, true, is_thread_author).await
    }

    /// Clears the solution flag of `id`
    pub async fn unmark_solution(&self, id: NodeId, is_thread_author: bool) -> Result<(), Error> {
        self.toggle_solution(id, false, is_thread_author).await
    }

    async fn toggle_solution(
        &self,
        id: NodeId,
        is_solution: bool,
        is_thread_author: bool,
    ) -> Result<(), Error> {
        if !self.inner.content.content_type.supports_solution() {
            return Err(ValidationError::NotAForumThread.into());
        }
        if !is_thread_author {
            return Err(Error::Unauthorized);
        }
        let prepared = self.begin_toggle(id, is_solution);
        let toggle = match self.recover(prepared).await? {
            Some(t) => t,
            None => return Ok(()),
        };
        let comment_id = toggle.comment.id.stored().ok_or(Error::NotFound(id))?;
        let res = self
            .inner
            .store
            .set_solution(&SetSolution {
                hilo_id: self.inner.content.content_id,
                comment_id,
                is_solution,
            })
            .await;

        let mut st = self.inner.state.lock();
        if !st.accepts(toggle.epoch) {
            tracing::debug!(%id, "discarding solution response for a reset or closed view");
            return res;
        }
        if let Err(err) = &res {
            tracing::warn!(%id, %err, "solution change failed, rolling back");
            st.rollback(id, &toggle.comment);
            if let Some(holder) = &toggle.holder {
                st.rollback(holder.id, holder);
            }
        }
        st.settle(id);
        if let Some(holder) = &toggle.holder {
            st.settle(holder.id);
        }
        res
    }

    fn begin_toggle(&self, id: NodeId, is_solution: bool) -> Result<Option<Toggle>, Error> {
        let mut guard = self.lock_open()?;
        let st = &mut *guard;
        let (_, comment) = st.target(id)?;
        if comment.is_solution == is_solution {
            return Ok(None);
        }
        let holder = match is_solution {
            false => None,
            true => st.tree.solution_holder().cloned(),
        };
        if let Some(h) = &holder {
            if st.pending.contains_key(&h.id) {
                return Err(Error::Busy(h.id));
            }
        }
        st.tree = st
            .tree
            .with_solution(id, is_solution)
            .ok_or(Error::NotFound(id))?;
        st.pending.insert(id, PendingKind::Solution);
        if let Some(h) = &holder {
            st.pending.insert(h.id, PendingKind::Solution);
        }
        Ok(Some(Toggle {
            comment,
            holder,
            epoch: st.epoch,
        }))
    }
}
