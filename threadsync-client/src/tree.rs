use crate::{
    api::{CommentId, OrderType, SortBy},
    Comment, NodeId, Order,
};

/// Where a new top-level comment goes in the container
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Position {
    Front,
    Back,
}

impl Position {
    /// Newest-first orderings show new comments at the top, everything else
    /// appends them behind the loaded pages
    pub fn for_order(order: &Order) -> Position {
        match (order.sort_by, order.direction) {
            (SortBy::CreatedAt, OrderType::Desc) => Position::Front,
            _ => Position::Back,
        }
    }
}

/// Top-level comments of one thread container
///
/// Every operation returns a new tree. Nodes along the path to the modified
/// node are copied, other subtrees are shared with `self`, which makes keeping
/// around snapshots for rollback cheap.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CommentTree {
    roots: im::Vector<Comment>,
}

impl CommentTree {
    pub fn new() -> CommentTree {
        CommentTree {
            roots: im::Vector::new(),
        }
    }

    pub fn roots(&self) -> &im::Vector<Comment> {
        &self.roots
    }

    /// Number of top-level comments
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first iteration over every node, parents before their replies
    pub fn iter(&self) -> Nodes<'_> {
        Nodes {
            stack: self.roots.iter().rev().collect(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    pub fn find_by_id(&self, id: NodeId) -> Option<&Comment> {
        self.iter().find(|c| c.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.find_by_id(id).is_some()
    }

    fn path_to(&self, id: NodeId) -> Option<Vec<usize>> {
        fn walk(list: &im::Vector<Comment>, id: NodeId, path: &mut Vec<usize>) -> bool {
            for (i, c) in list.iter().enumerate() {
                path.push(i);
                if c.id == id || walk(&c.replies, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }
        let mut path = Vec::new();
        walk(&self.roots, id, &mut path).then(|| path)
    }

    /// Returns a tree where the node `id` went through `f`, or `None` if there
    /// is no such node, in which case the local tree is stale
    pub fn map_node(&self, id: NodeId, f: impl FnOnce(&mut Comment)) -> Option<CommentTree> {
        let path = self.path_to(id)?;
        let mut roots = self.roots.clone();
        f(node_at_mut(&mut roots, &path)?);
        Some(CommentTree { roots })
    }

    /// Removes exactly the node `id` along with its reply list
    ///
    /// Only meant for discarding a never-confirmed optimistic node: deletion
    /// of stored comments is a tombstone set through `map_node`.
    pub fn remove_node(&self, id: NodeId) -> Option<CommentTree> {
        let path = self.path_to(id)?;
        let (last, parent) = path.split_last()?;
        let mut roots = self.roots.clone();
        if parent.is_empty() {
            roots.remove(*last);
        } else {
            node_at_mut(&mut roots, parent)?.replies.remove(*last);
        }
        Some(CommentTree { roots })
    }

    pub fn append_reply(&self, parent: NodeId, child: Comment) -> Option<CommentTree> {
        self.map_node(parent, move |p| p.replies.push_back(child))
    }

    pub fn insert_top(&self, comment: Comment, pos: Position) -> CommentTree {
        let mut roots = self.roots.clone();
        match pos {
            Position::Front => roots.push_front(comment),
            Position::Back => roots.push_back(comment),
        }
        CommentTree { roots }
    }

    pub fn insert_top_at(&self, index: usize, comment: Comment) -> CommentTree {
        let mut roots = self.roots.clone();
        roots.insert(index.min(roots.len()), comment);
        CommentTree { roots }
    }

    /// Sets `is_deleted` on every quote snapshot of `quoted`
    pub fn with_quotes_deleted(&self, quoted: CommentId, deleted: bool) -> CommentTree {
        let quoting = self
            .iter()
            .filter(|c| {
                c.replied_to
                    .as_ref()
                    .map_or(false, |q| q.id == quoted && q.is_deleted != deleted)
            })
            .map(|c| c.id)
            .collect::<Vec<_>>();
        let mut res = self.clone();
        for id in quoting {
            if let Some(t) = res.map_node(id, |c| {
                if let Some(q) = c.replied_to.as_mut() {
                    q.is_deleted = deleted;
                }
            }) {
                res = t;
            }
        }
        res
    }
}

impl FromIterator<Comment> for CommentTree {
    fn from_iter<I: IntoIterator<Item = Comment>>(iter: I) -> CommentTree {
        CommentTree {
            roots: iter.into_iter().collect(),
        }
    }
}

fn node_at_mut<'a>(roots: &'a mut im::Vector<Comment>, path: &[usize]) -> Option<&'a mut Comment> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get_mut(*first)?;
    for i in rest {
        node = node.replies.get_mut(*i)?;
    }
    Some(node)
}

pub struct Nodes<'a> {
    stack: Vec<&'a Comment>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Comment;

    fn next(&mut self) -> Option<&'a Comment> {
        let c = self.stack.pop()?;
        self.stack.extend(c.replies.iter().rev());
        Some(c)
    }
}
