use std::panic::AssertUnwindSafe;

use threadsync_client::{
    api::{ContentRef, Uuid},
    Error, NodeId, Order, ThreadView,
};
use threadsync_mock_server::MockStore;

mod common;
use common::*;

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            if std::env::var("RUST_LOG").is_ok() {
                let _ = tracing_subscriber::fmt::try_init();
            }
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum Op {
    Post {
        by_owner: bool,
    },
    Reply {
        by_owner: bool,
        parent: u8,
        quote: Option<u8>,
    },
    Edit {
        by_owner: bool,
        target: u8,
    },
    Delete {
        by_owner: bool,
        target: u8,
    },
    Solve {
        target: u8,
        set: bool,
    },
    Vote {
        target: u8,
        total: i8,
    },
    Offline(bool),
}

fn pick(view: &ThreadView<MockStore>, n: u8) -> Option<NodeId> {
    let ids = view.tree().iter().map(|c| c.id).collect::<Vec<_>>();
    match ids.is_empty() {
        true => None,
        false => Some(ids[n as usize % ids.len()]),
    }
}

async fn run(ops: Vec<Op>) {
    let w = world(ContentRef::thread(Uuid::new_v4()), Vec::new());
    let (owner, other) = (w.owner_view(4), w.other_view(4));
    for v in [&owner, &other] {
        v.load_first_page(Order::newest_first())
            .await
            .expect("loading empty thread");
    }
    let _feeds = (
        owner.start_feed().await.expect("subscribing owner"),
        other.start_feed().await.expect("subscribing other"),
    );

    for (i, op) in ops.into_iter().enumerate() {
        let by_owner = match op {
            Op::Post { by_owner }
            | Op::Reply { by_owner, .. }
            | Op::Edit { by_owner, .. }
            | Op::Delete { by_owner, .. } => by_owner,
            _ => true,
        };
        let (v, viewer) = match by_owner {
            true => (&owner, &w.owner),
            false => (&other, &w.other),
        };
        let before = v.tree();
        let is_author = |id: NodeId| before.find_by_id(id).map(|c| c.author.id) == Some(viewer.id);
        let res: Result<(), Error> = match op {
            Op::Post { .. } => v.post_comment(format!("post {i}")).await.map(|_| ()),
            Op::Reply { parent, quote, .. } => {
                let Some(parent) = pick(v, parent) else { continue };
                let quote = quote.and_then(|q| pick(v, q));
                v.reply(parent, quote, format!("reply {i}")).await.map(|_| ())
            }
            Op::Edit { target, .. } => {
                let Some(id) = pick(v, target) else { continue };
                v.edit(id, format!("edit {i}"), is_author(id)).await
            }
            Op::Delete { target, .. } => {
                let Some(id) = pick(v, target) else { continue };
                v.delete(id, by_owner || is_author(id)).await
            }
            Op::Solve { target, set } => {
                let Some(id) = pick(v, target) else { continue };
                match set {
                    true => v.mark_solution(id, true).await,
                    false => v.unmark_solution(id, true).await,
                }
            }
            Op::Vote { target, total } => {
                let Some(id) = pick(v, target).and_then(|id| id.stored()) else { continue };
                w.owner_store
                    .server()
                    .lock()
                    .await
                    .set_votes(id, i64::from(total))
                    .expect("voting on a stored comment");
                Ok(())
            }
            Op::Offline(offline) => {
                w.owner_store.set_offline(offline);
                Ok(())
            }
        };
        if let Err(err) = res {
            assert_eq!(v.tree(), before, "{err} left traces in the tree");
        }
        assert!(v.tree().iter().filter(|c| c.is_solution).count() <= 1);
        settle().await;
    }

    w.owner_store.set_offline(false);
    settle().await;
    let fresh = summarize(&w.fresh_tree().await);
    assert_eq!(summarize(&owner.tree()), fresh);
    assert_eq!(summarize(&other.tree()), fresh);
}

do_tokio_test!(views_converge_with_the_store, Vec<Op>, run);
