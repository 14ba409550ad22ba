use std::collections::HashSet;

use futures::future::{BoxFuture, Shared};

use crate::{
    api::{CommentPage, ContentRef, ListComments, OrderType, SortBy},
    Comment, CommentTree, Error, NodeId, Position,
};

/// Server-defined ordering of top-level comments
///
/// Changing it requires a full reset: already-loaded items may move.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Order {
    pub sort_by: SortBy,
    pub direction: OrderType,
}

impl Order {
    pub fn newest_first() -> Order {
        Order {
            sort_by: SortBy::CreatedAt,
            direction: OrderType::Desc,
        }
    }

    pub fn oldest_first() -> Order {
        Order {
            sort_by: SortBy::CreatedAt,
            direction: OrderType::Asc,
        }
    }

    pub fn most_replies() -> Order {
        Order {
            sort_by: SortBy::Replies,
            direction: OrderType::Desc,
        }
    }

    pub fn position(&self) -> Position {
        Position::for_order(self)
    }
}

impl Default for Order {
    fn default() -> Order {
        Order::newest_first()
    }
}

pub(crate) type PageLoad = Shared<BoxFuture<'static, Result<usize, Error>>>;

/// Cursor state of the forward-only top-level comment loader
pub struct Pager {
    order: Order,
    cursor: usize,
    total: usize,
    pages: usize,
    exhausted: bool,

    /// New top-level comments kept behind everything later pages will bring
    trailing: HashSet<NodeId>,

    pub(crate) in_flight: Option<PageLoad>,
}

impl Pager {
    pub fn new(order: Order) -> Pager {
        Pager {
            order,
            cursor: 0,
            total: 0,
            pages: 0,
            exhausted: false,
            trailing: HashSet::new(),
            in_flight: None,
        }
    }

    pub fn order(&self) -> Order {
        self.order
    }

    /// Offset of the next page, counted in store items
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_more(&self) -> bool {
        !self.exhausted && (self.pages == 0 || self.cursor < self.total)
    }

    pub(crate) fn query(&self, content: ContentRef, limit: usize) -> ListComments {
        ListComments {
            content_type: content.content_type,
            content_id: content.content_id,
            limit,
            offset: self.cursor,
            order: self.order.direction,
            sort_by: self.order.sort_by,
        }
    }

    /// A comment the store did not count yet joined the thread
    pub(crate) fn note_inserted(&mut self) {
        self.total += 1;
    }

    /// Puts a new top-level comment where the order wants it
    ///
    /// Appending orders cannot place it among pages not loaded yet, so until
    /// the last page it stays behind them and pages get inserted before it.
    pub(crate) fn place_new(&mut self, tree: &CommentTree, c: Comment) -> CommentTree {
        let pos = self.order.position();
        if pos == Position::Back && self.has_more() {
            self.trailing.insert(c.id);
        }
        tree.insert_top(c, pos)
    }

    /// The new comment `temp` got confirmed as `stored`, or dropped on `None`
    pub(crate) fn rename_new(&mut self, temp: NodeId, stored: Option<NodeId>) {
        if self.trailing.remove(&temp) {
            self.trailing.extend(stored);
        }
    }

    fn trailing_start(&self, tree: &CommentTree) -> usize {
        tree.roots()
            .iter()
            .position(|c| self.trailing.contains(&c.id))
            .unwrap_or(tree.len())
    }

    /// Appends `page` to `tree`, dropping every item already held
    ///
    /// Returns the new tree and the number of top-level comments kept.
    pub(crate) fn absorb(&mut self, tree: &CommentTree, page: CommentPage) -> (CommentTree, usize) {
        self.pages += 1;
        self.total = page.total;
        self.cursor += page.comments.len();
        if page.comments.is_empty() {
            self.exhausted = true;
        }

        let mut known = tree.iter().map(|c| c.id).collect::<HashSet<_>>();
        let mut tree = tree.clone();
        let mut kept = 0;
        for c in page.comments {
            let id = NodeId::Stored(c.id);
            if self.trailing.remove(&id) {
                // the page reached it, move the held node where the page has it
                if let Some(held) = tree.find_by_id(id).cloned() {
                    if let Some(t) = tree.remove_node(id) {
                        tree = t.insert_top_at(self.trailing_start(&t), held);
                    }
                }
                continue;
            }
            if known.contains(&id) {
                tracing::debug!(%id, "dropping already-held comment from fetched page");
                continue;
            }
            let mut c = Comment::from(c);
            strip_known_replies(&mut c, &mut known);
            known.insert(id);
            tree = tree.insert_top_at(self.trailing_start(&tree), c);
            kept += 1;
        }
        if !self.has_more() {
            self.trailing.clear();
        }
        (tree, kept)
    }
}

fn strip_known_replies(c: &mut Comment, known: &mut HashSet<NodeId>) {
    c.replies.retain(|r| {
        let dup = known.contains(&r.id);
        if dup {
            tracing::debug!(id = %r.id, "dropping already-held reply from fetched page");
        }
        !dup
    });
    for r in c.replies.iter_mut() {
        known.insert(r.id);
        strip_known_replies(r, known);
    }
}
