use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use threadsync_client::{
    api::{
        self, AuthToken, CommentId, CommentPage, ContentRef, EditComment, FeedEvent, ListComments,
        NewComment, NewReply, SetSolution,
    },
    Error, Store,
};
use tokio::sync::{Mutex, OwnedRwLockWriteGuard, RwLock};

use crate::MockServer;

/// `Store` backed by a shared `MockServer`, acting as one user
///
/// Every call first waits for the pause gate, then fails with a transient
/// error if the store is offline. Stores made with `as_user` share the server,
/// the gate and the offline switch.
#[derive(Clone)]
pub struct MockStore {
    server: Arc<Mutex<MockServer>>,
    token: AuthToken,
    offline: Arc<AtomicBool>,
    gate: Arc<RwLock<()>>,
}

impl MockStore {
    pub fn new(server: Arc<Mutex<MockServer>>, token: AuthToken) -> MockStore {
        MockStore {
            server,
            token,
            offline: Arc::new(AtomicBool::new(false)),
            gate: Arc::new(RwLock::new(())),
        }
    }

    pub fn as_user(&self, token: AuthToken) -> MockStore {
        MockStore {
            token,
            ..self.clone()
        }
    }

    pub fn server(&self) -> &Arc<Mutex<MockServer>> {
        &self.server
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Holds every call until the returned guard is dropped
    pub async fn pause(&self) -> OwnedRwLockWriteGuard<()> {
        self.gate.clone().write_owned().await
    }

    async fn enter(&self) -> Result<(), Error> {
        drop(self.gate.read().await);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Transient(String::from("mock store is offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MockStore {
    async fn fetch_page(&self, q: &ListComments) -> Result<CommentPage, Error> {
        self.enter().await?;
        Ok(self.server.lock().await.list_comments(self.token, q)?)
    }

    async fn create_comment(&self, c: &NewComment) -> Result<api::Comment, Error> {
        self.enter().await?;
        Ok(self
            .server
            .lock()
            .await
            .create_comment(self.token, c.clone())?)
    }

    async fn create_reply(&self, r: &NewReply) -> Result<api::Comment, Error> {
        self.enter().await?;
        Ok(self.server.lock().await.create_reply(self.token, r.clone())?)
    }

    async fn edit_comment(&self, e: &EditComment) -> Result<(), Error> {
        self.enter().await?;
        Ok(self.server.lock().await.edit_comment(self.token, e.clone())?)
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.enter().await?;
        Ok(self.server.lock().await.delete_comment(self.token, id)?)
    }

    async fn set_solution(&self, s: &SetSolution) -> Result<(), Error> {
        self.enter().await?;
        Ok(self.server.lock().await.set_solution(self.token, *s)?)
    }

    async fn subscribe(&self, content: &ContentRef) -> Result<BoxStream<'static, FeedEvent>, Error> {
        self.enter().await?;
        let feed = self.server.lock().await.subscribe(self.token, *content)?;
        Ok(futures::stream::unfold(feed, |mut feed| async move {
            feed.recv().await.map(|evt| (evt, feed))
        })
        .boxed())
    }
}
