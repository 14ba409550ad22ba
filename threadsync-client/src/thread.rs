use std::{collections::HashMap, sync::Arc};

use futures::FutureExt;
use parking_lot::{Mutex, MutexGuard};
use tokio::sync::watch;

use crate::{
    api::{Author, CommentId, CommentPage, ContentRef, FeedMessage},
    pager::PageLoad,
    Comment, CommentTree, Error, NodeId, Order, Pager, Store, ValidationError,
};

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug)]
pub struct ThreadConfig {
    /// Author of optimistic nodes, and `deleted_by` of optimistic tombstones
    pub viewer: Author,

    /// Number of top-level comments requested per page
    pub page_size: usize,

    /// Forum deployments disable editing but keep deletion
    pub edit_enabled: bool,
}

impl ThreadConfig {
    pub fn new(viewer: Author) -> ThreadConfig {
        ThreadConfig {
            viewer,
            page_size: DEFAULT_PAGE_SIZE,
            edit_enabled: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum PendingKind {
    Create,
    Edit,
    Delete,
    Solution,
}

pub(crate) struct ThreadState {
    pub(crate) tree: CommentTree,
    pub(crate) pager: Pager,

    /// Nodes with a mutation in flight, at most one per node
    pub(crate) pending: HashMap<NodeId, PendingKind>,

    /// Pushes about a pending node, replayed once it settles
    pub(crate) deferred: HashMap<NodeId, Vec<FeedMessage>>,

    /// Pushes received while a reset is loading its first page
    pub(crate) buffered: Option<Vec<FeedMessage>>,

    /// Bumped on every reset so that responses to older requests get dropped
    pub(crate) epoch: u64,

    pub(crate) closed: bool,
}

impl ThreadState {
    /// Checks that `id` may be mutated, returning its store id and a copy of it
    pub(crate) fn target(&self, id: NodeId) -> Result<(CommentId, Comment), Error> {
        let node = self.tree.find_by_id(id).ok_or(Error::NotFound(id))?;
        let stored = id.stored().ok_or(ValidationError::Unconfirmed(id))?;
        if self.pending.contains_key(&id) {
            return Err(Error::Busy(id));
        }
        if node.is_deleted() {
            return Err(ValidationError::Deleted(id).into());
        }
        Ok((stored, node.clone()))
    }

    /// Optimistically applies `f` to `id` and marks it pending
    pub(crate) fn apply(
        &mut self,
        id: NodeId,
        kind: PendingKind,
        f: impl FnOnce(&mut Comment),
    ) -> Result<(), Error> {
        self.tree = self.tree.map_node(id, f).ok_or(Error::NotFound(id))?;
        self.pending.insert(id, kind);
        Ok(())
    }

    /// Puts back every field of `id` but its replies
    pub(crate) fn rollback(&mut self, id: NodeId, previous: &Comment) {
        match self.tree.map_node(id, |c| c.restore_fields_from(previous)) {
            Some(t) => self.tree = t,
            None => tracing::debug!(%id, "node to roll back vanished from the tree"),
        }
    }

    /// Ends the mutation in flight on `id` and replays what was deferred
    pub(crate) fn settle(&mut self, id: NodeId) {
        self.pending.remove(&id);
        if let Some(msgs) = self.deferred.remove(&id) {
            for msg in msgs {
                self.apply_message(msg);
            }
        }
    }

    /// Whether a response issued at `epoch` may still write into the tree
    pub(crate) fn accepts(&self, epoch: u64) -> bool {
        !self.closed && self.epoch == epoch
    }
}

pub(crate) struct Inner<S> {
    pub(crate) store: S,
    pub(crate) content: ContentRef,
    pub(crate) config: ThreadConfig,
    pub(crate) state: Mutex<ThreadState>,
    pub(crate) shutdown: watch::Sender<bool>,
}

impl<S> Inner<S> {
    fn absorb_page(&self, epoch: u64, res: Result<CommentPage, Error>) -> Result<usize, Error> {
        let mut guard = self.state.lock();
        let st = &mut *guard;
        if st.closed {
            return Err(Error::Closed);
        }
        if st.epoch != epoch {
            tracing::debug!(content = %self.content, "dropping page fetched before a reset");
            return Ok(0);
        }
        st.pager.in_flight = None;
        let buffered = st.buffered.take();
        let res = match res {
            Ok(page) => {
                let (tree, kept) = st.pager.absorb(&st.tree, page);
                st.tree = tree;
                Ok(kept)
            }
            Err(e) => {
                tracing::warn!(content = %self.content, err = %e, "failed loading comment page");
                Err(e)
            }
        };
        for msg in buffered.into_iter().flatten() {
            st.apply_message(msg);
        }
        res
    }
}

/// One open view of a thread container, owning its comment tree
///
/// Cloning yields another handle to the same view. The tree lock is never held
/// across a call to the store, so unrelated mutations and page loads can be in
/// flight at the same time.
pub struct ThreadView<S> {
    pub(crate) inner: Arc<Inner<S>>,
}

impl<S> Clone for ThreadView<S> {
    fn clone(&self) -> Self {
        ThreadView {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Store + 'static> ThreadView<S> {
    pub fn new(store: S, content: ContentRef, config: ThreadConfig) -> ThreadView<S> {
        let (shutdown, _) = watch::channel(false);
        ThreadView {
            inner: Arc::new(Inner {
                store,
                content,
                config,
                state: Mutex::new(ThreadState {
                    tree: CommentTree::new(),
                    pager: Pager::new(Order::default()),
                    pending: HashMap::new(),
                    deferred: HashMap::new(),
                    buffered: None,
                    epoch: 0,
                    closed: false,
                }),
                shutdown,
            }),
        }
    }

    pub fn content(&self) -> ContentRef {
        self.inner.content
    }

    pub fn config(&self) -> &ThreadConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Current tree, cheap to clone and never modified afterwards
    pub fn tree(&self) -> CommentTree {
        self.inner.state.lock().tree.clone()
    }

    pub fn order(&self) -> Order {
        self.inner.state.lock().pager.order()
    }

    pub fn total(&self) -> usize {
        self.inner.state.lock().pager.total()
    }

    pub fn has_more(&self) -> bool {
        self.inner.state.lock().pager.has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().pager.is_loading()
    }

    pub fn is_pending(&self, id: NodeId) -> bool {
        self.inner.state.lock().pending.contains_key(&id)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    pub(crate) fn lock_open(&self) -> Result<MutexGuard<'_, ThreadState>, Error> {
        let st = self.inner.state.lock();
        if st.closed {
            return Err(Error::Closed);
        }
        Ok(st)
    }

    /// Tears the view down and drops the tree
    ///
    /// Stops the feed and rejects further operations. Responses still in
    /// flight get discarded when they arrive.
    pub fn close(&self) {
        let mut st = self.inner.state.lock();
        if !st.closed {
            tracing::debug!(content = %self.inner.content, "closing thread view");
        }
        st.closed = true;
        st.tree = CommentTree::new();
        st.pager = Pager::new(st.pager.order());
        st.pending.clear();
        st.deferred.clear();
        st.buffered = None;
        let _ = self.inner.shutdown.send(true);
    }

    fn start_load(&self, st: &mut ThreadState) -> PageLoad {
        let q = st.pager.query(self.inner.content, self.inner.config.page_size);
        let epoch = st.epoch;
        let inner = self.inner.clone();
        let load = async move {
            let res = inner.store.fetch_page(&q).await;
            inner.absorb_page(epoch, res)
        }
        .boxed()
        .shared();
        st.pager.in_flight = Some(load.clone());
        load
    }

    /// Drops everything held and loads the first page in `order`
    ///
    /// Mutations still in flight get their responses discarded. Pushes that
    /// arrive before the page are replayed on top of it.
    pub async fn load_first_page(&self, order: Order) -> Result<usize, Error> {
        let load = {
            let mut guard = self.lock_open()?;
            let st = &mut *guard;
            st.epoch += 1;
            st.tree = CommentTree::new();
            st.pager = Pager::new(order);
            st.pending.clear();
            st.deferred.clear();
            st.buffered = Some(Vec::new());
            self.start_load(st)
        };
        load.await
    }

    /// Loads the page at the cursor, returning how many new top-level
    /// comments it brought
    ///
    /// Joins the request already in flight instead of issuing another one, and
    /// returns 0 once everything is loaded.
    pub async fn load_next_page(&self) -> Result<usize, Error> {
        let load = {
            let mut guard = self.lock_open()?;
            let st = &mut *guard;
            if let Some(load) = st.pager.in_flight.clone() {
                load
            } else if !st.pager.has_more() {
                return Ok(0);
            } else {
                self.start_load(st)
            }
        };
        load.await
    }

    /// Full reset keeping the current order
    pub async fn reload(&self) -> Result<usize, Error> {
        let order = self.order();
        self.load_first_page(order).await
    }

    /// Reloads after finding the local tree stale, and returns the error to
    /// report for the operation that found it
    pub(crate) async fn stale(&self, id: NodeId) -> Error {
        tracing::warn!(%id, content = %self.inner.content, "local tree is stale, reloading");
        if let Err(err) = self.reload().await {
            tracing::warn!(%err, "reload after stale tree failed");
        }
        Error::NotFound(id)
    }
}
