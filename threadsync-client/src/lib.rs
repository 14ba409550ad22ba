mod comment;
pub use comment::{Comment, NodeId};

mod error;
pub use error::{Error, ValidationError};

mod feed;
pub use feed::FeedHandle;

mod http_store;
pub use http_store::HttpStore;

mod merge;

mod mutation;

mod pager;
pub use pager::{Order, Pager};

mod quote;
pub use quote::capture_quote;

mod solution;
pub use solution::SolutionState;

mod store;
pub use store::Store;

mod thread;
pub use thread::{ThreadConfig, ThreadView};

mod tree;
pub use tree::{CommentTree, Position};

pub mod api {
    pub use threadsync_api::*;
}
