use chrono::{Duration, Utc};
use threadsync_client::{
    api::{self, CommentId, ContentRef, Uuid},
    CommentTree, Error, NodeId, Order, SolutionState,
};

mod common;
use common::*;

fn seeded(author: &api::Author, text: &str, minutes_ago: i64) -> api::Comment {
    api::Comment {
        id: CommentId(Uuid::new_v4()),
        author: author.clone(),
        text: String::from(text),
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        edited_at: None,
        deleted: None,
        replied_to: None,
        is_solution: false,
        vote_total: 0,
        replies: Vec::new(),
    }
}

fn texts(tree: &CommentTree) -> Vec<String> {
    tree.roots().iter().map(|c| c.text.clone()).collect()
}

fn find(tree: &CommentTree, id: CommentId) -> threadsync_client::Comment {
    tree.find_by_id(NodeId::Stored(id))
        .unwrap_or_else(|| panic!("{id} is not in the tree"))
        .clone()
}

#[tokio::test]
async fn overlapping_pages_keep_one_copy() {
    let someone = author("someone");
    let comments = (1..=5)
        .map(|i| seeded(&someone, &format!("c{i}"), 60 - i))
        .collect();
    let w = world(ContentRef::thread(Uuid::new_v4()), comments);
    let v = w.owner_view(3);

    assert_eq!(v.load_first_page(Order::newest_first()).await, Ok(3));
    assert_eq!(texts(&v.tree()), ["c5", "c4", "c3"]);
    assert_eq!(v.total(), 5);
    assert!(v.has_more());

    // unseen by `v`, this shifts its next page by one item
    let other = w.other_view(3);
    other.post_comment(String::from("c6")).await.unwrap();

    assert_eq!(v.load_next_page().await, Ok(2));
    assert_eq!(texts(&v.tree()), ["c5", "c4", "c3", "c2", "c1"]);
    assert_eq!(v.tree().node_count(), 5);
    assert!(!v.has_more());
    assert_eq!(v.load_next_page().await, Ok(0));
}

#[tokio::test]
async fn concurrent_page_loads_share_one_request() {
    let someone = author("someone");
    let comments = (1..=6)
        .map(|i| seeded(&someone, &format!("c{i}"), 60 - i))
        .collect();
    let w = world(ContentRef::thread(Uuid::new_v4()), comments);
    let v = w.owner_view(2);
    v.load_first_page(Order::oldest_first()).await.unwrap();

    let guard = w.owner_store.pause().await;
    let mut a = Box::pin(v.load_next_page());
    let mut b = Box::pin(v.load_next_page());
    assert!(futures::poll!(&mut a).is_pending());
    assert!(futures::poll!(&mut b).is_pending());
    assert!(v.is_loading());
    drop(guard);

    assert_eq!(a.await, Ok(2));
    assert_eq!(b.await, Ok(2));
    assert!(!v.is_loading());
    assert_eq!(texts(&v.tree()), ["c1", "c2", "c3", "c4"]);
}

#[tokio::test]
async fn failures_restore_the_exact_tree() {
    let w = world(ContentRef::thread(Uuid::new_v4()), Vec::new());
    let v = w.other_view(10);
    v.load_first_page(Order::oldest_first()).await.unwrap();
    let parent = v.post_comment(String::from("parent")).await.unwrap();
    let child = v
        .reply(NodeId::Stored(parent), None, String::from("child"))
        .await
        .unwrap();
    let before = v.tree();

    w.other_store.set_offline(true);
    let parent = NodeId::Stored(parent);
    let transient = |res: Result<_, Error>| matches!(res, Err(Error::Transient(_)));
    assert!(transient(v.delete(parent, true).await));
    assert_eq!(v.tree(), before);
    assert!(transient(v.edit(parent, String::from("changed"), true).await.map(|_| ())));
    assert_eq!(v.tree(), before);
    assert!(transient(v.post_comment(String::from("lost")).await.map(|_| ())));
    assert_eq!(v.tree(), before);

    let guard = w.other_store.pause().await;
    let mut reply = Box::pin(v.reply(NodeId::Stored(child), Some(parent), String::from("lost")));
    assert!(futures::poll!(&mut reply).is_pending());
    let optimistic = v.tree();
    assert_eq!(optimistic.node_count(), before.node_count() + 1);
    assert!(optimistic.iter().any(|c| c.id.is_temporary()));
    drop(guard);
    assert!(transient(reply.await.map(|_| ())));
    assert_eq!(v.tree(), before);
    assert!(!v.is_pending(parent));

    w.other_store.set_offline(false);
    v.delete(parent, true).await.unwrap();
    assert!(find(&v.tree(), child).deleted.is_none());
    assert_eq!(summarize(&v.tree()), summarize(&w.fresh_tree().await));
}

#[tokio::test]
async fn quotes_outlive_edits_and_deletion() {
    let w = world(ContentRef::article(Uuid::new_v4()), Vec::new());
    let v = w.other_view(10);
    v.load_first_page(Order::oldest_first()).await.unwrap();
    let root = v.post_comment(String::from("root")).await.unwrap();
    let quoted = v
        .reply(NodeId::Stored(root), None, String::from("original words"))
        .await
        .unwrap();
    let quoting = v
        .reply(
            NodeId::Stored(root),
            Some(NodeId::Stored(quoted)),
            String::from("as they said"),
        )
        .await
        .unwrap();

    v.edit(NodeId::Stored(quoted), String::from("rewritten"), true)
        .await
        .unwrap();
    let q = find(&v.tree(), quoting).replied_to.unwrap();
    assert_eq!(q.id, quoted);
    assert_eq!(q.text, "original words");
    assert!(!q.is_deleted);
    assert_eq!(find(&v.tree(), quoted).text, "rewritten");

    v.delete(NodeId::Stored(quoted), true).await.unwrap();
    let q = find(&v.tree(), quoting).replied_to.unwrap();
    assert_eq!(q.text, "original words");
    assert!(q.is_deleted);

    assert_eq!(summarize(&v.tree()), summarize(&w.fresh_tree().await));
    assert_eq!(
        v.reply(NodeId::Stored(root), Some(NodeId::Stored(quoted)), String::from("no"))
            .await,
        Err(Error::Validation(threadsync_client::ValidationError::Deleted(
            NodeId::Stored(quoted)
        )))
    );
}

#[tokio::test]
async fn solution_moves_without_ever_doubling() {
    let w = world(ContentRef::thread(Uuid::new_v4()), Vec::new());
    let asker = w.other_view(10);
    asker.load_first_page(Order::oldest_first()).await.unwrap();
    let question = asker.post_comment(String::from("how?")).await.unwrap();
    let mut replies = Vec::new();
    for text in ["like this", "no, like that"] {
        let r = asker
            .reply(NodeId::Stored(question), None, String::from(text))
            .await
            .unwrap();
        replies.push(NodeId::Stored(r));
    }
    let (r1, r2) = (replies[0], replies[1]);

    let owner = w.owner_view(10);
    owner.load_first_page(Order::oldest_first()).await.unwrap();
    owner.mark_solution(r1, true).await.unwrap();
    assert_eq!(owner.solution(), SolutionState::SolutionAt(r1));

    let guard = w.owner_store.pause().await;
    let mut moving = Box::pin(owner.mark_solution(r2, true));
    assert!(futures::poll!(&mut moving).is_pending());
    let tree = owner.tree();
    assert_eq!(tree.iter().filter(|c| c.is_solution).count(), 1);
    assert_eq!(owner.solution(), SolutionState::SolutionAt(r2));
    drop(guard);
    moving.await.unwrap();

    let fresh = w.fresh_tree().await;
    assert_eq!(SolutionState::of(&fresh), SolutionState::SolutionAt(r2));
    assert_eq!(summarize(&owner.tree()), summarize(&fresh));

    assert_eq!(asker.mark_solution(r1, false).await, Err(Error::Unauthorized));
    owner.unmark_solution(r2, true).await.unwrap();
    assert_eq!(SolutionState::of(&w.fresh_tree().await), SolutionState::NoSolution);
}

#[tokio::test]
async fn pushes_reach_every_viewer() {
    let w = world(ContentRef::thread(Uuid::new_v4()), Vec::new());
    let (a, b) = (w.owner_view(10), w.other_view(10));
    for v in [&a, &b] {
        v.load_first_page(Order::newest_first()).await.unwrap();
    }
    let feeds = (a.start_feed().await.unwrap(), b.start_feed().await.unwrap());

    let c = b.post_comment(String::from("hello")).await.unwrap();
    settle().await;
    let r = a
        .reply(NodeId::Stored(c), Some(NodeId::Stored(c)), String::from("hi"))
        .await
        .unwrap();
    settle().await;
    assert_eq!(a.tree().node_count(), 2);
    assert_eq!(b.tree().node_count(), 2);
    assert_eq!(a.total(), 1);

    w.owner_store
        .server()
        .lock()
        .await
        .set_votes(r, 3)
        .unwrap();
    b.edit(NodeId::Stored(c), String::from("hello there"), true)
        .await
        .unwrap();
    a.delete(NodeId::Stored(c), true).await.unwrap();
    settle().await;

    let fresh = summarize(&w.fresh_tree().await);
    assert_eq!(summarize(&a.tree()), fresh);
    assert_eq!(summarize(&b.tree()), fresh);
    assert_eq!(find(&b.tree(), r).vote_total, 3);
    assert!(find(&b.tree(), c).is_deleted());
    assert!(find(&b.tree(), r).replied_to.unwrap().is_deleted);

    feeds.0.stop().await;
    b.post_comment(String::from("unseen")).await.unwrap();
    settle().await;
    assert_eq!(a.tree().node_count(), 2);
    assert_eq!(b.tree().node_count(), 3);
    b.close();
    feeds.1.finished().await;
    assert!(b.tree().is_empty());
}
