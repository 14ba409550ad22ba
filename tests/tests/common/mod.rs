#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use threadsync_client::{
    api::{AuthToken, Author, ContentRef, QuoteSnapshot, UserId, Uuid},
    CommentTree, NodeId, Order, ThreadConfig, ThreadView,
};
use threadsync_mock_server::{MockServer, MockStore, Seed, SeedThread, SeedUser};
use tokio::sync::Mutex;

pub struct World {
    pub content: ContentRef,
    pub owner: Author,
    pub other: Author,
    pub owner_store: MockStore,
    pub other_store: MockStore,
}

pub fn author(name: &str) -> Author {
    Author {
        id: UserId(Uuid::new_v4()),
        display_name: String::from(name),
        avatar_url: None,
        color: String::from("#123456"),
    }
}

/// One thread owned by `owner`, with `comments` already in it
pub fn world(content: ContentRef, comments: Vec<threadsync_client::api::Comment>) -> World {
    let (owner, other) = (author("owner"), author("other"));
    let (owner_tok, other_tok) = (AuthToken(Uuid::new_v4()), AuthToken(Uuid::new_v4()));
    let server = MockServer::from_seed(Seed {
        users: vec![
            SeedUser {
                author: owner.clone(),
                token: owner_tok,
            },
            SeedUser {
                author: other.clone(),
                token: other_tok,
            },
        ],
        threads: vec![SeedThread {
            content,
            owner: Some(owner.id),
            comments,
        }],
    });
    let owner_store = MockStore::new(Arc::new(Mutex::new(server)), owner_tok);
    let other_store = owner_store.as_user(other_tok);
    World {
        content,
        owner,
        other,
        owner_store,
        other_store,
    }
}

impl World {
    pub fn owner_view(&self, page_size: usize) -> ThreadView<MockStore> {
        view(&self.owner_store, &self.owner, self.content, page_size)
    }

    pub fn other_view(&self, page_size: usize) -> ThreadView<MockStore> {
        view(&self.other_store, &self.other, self.content, page_size)
    }

    /// Tree as a brand new view sees it after loading every page
    pub async fn fresh_tree(&self) -> CommentTree {
        let v = self.owner_view(7);
        v.load_first_page(Order::oldest_first())
            .await
            .expect("loading first page");
        while v.has_more() {
            v.load_next_page().await.expect("loading next page");
        }
        let tree = v.tree();
        v.close();
        tree
    }
}

pub fn view(
    store: &MockStore,
    viewer: &Author,
    content: ContentRef,
    page_size: usize,
) -> ThreadView<MockStore> {
    let mut config = ThreadConfig::new(viewer.clone());
    config.page_size = page_size;
    ThreadView::new(store.clone(), content, config)
}

/// Lets spawned feed tasks drain what the mock server relayed
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct Summary {
    pub parent: Option<NodeId>,
    pub text: String,
    pub edited: bool,
    pub deleted: bool,
    pub solution: bool,
    pub votes: i64,
    pub quote: Option<QuoteSnapshot>,
}

/// Everything two converged views must agree on, whatever their order
pub fn summarize(tree: &CommentTree) -> BTreeMap<NodeId, Summary> {
    fn walk(
        c: &threadsync_client::Comment,
        parent: Option<NodeId>,
        out: &mut BTreeMap<NodeId, Summary>,
    ) {
        out.insert(
            c.id,
            Summary {
                parent,
                text: c.text.clone(),
                edited: c.is_edited(),
                deleted: c.is_deleted(),
                solution: c.is_solution,
                votes: c.vote_total,
                quote: c.replied_to.clone(),
            },
        );
        for r in c.replies.iter() {
            walk(r, Some(c.id), out);
        }
    }
    let mut out = BTreeMap::new();
    for c in tree.roots().iter() {
        walk(c, None, &mut out);
    }
    out
}
