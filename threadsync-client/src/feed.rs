use futures::{channel::oneshot, stream::BoxStream, FutureExt, StreamExt};
use tokio::task::JoinHandle;

use crate::{api::FeedEvent, Error, Store, ThreadView};

/// Running push subscription of a thread view
///
/// The subscription ends when the handle is stopped or dropped, when the view
/// is closed, or when the store hangs up.
pub struct FeedHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl FeedHandle {
    /// Stops the subscription and waits until no more pushes get merged
    pub async fn stop(mut self) {
        self.cancel.take();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(%err, "feed task did not shut down cleanly");
            }
        }
    }

    /// Waits for the store to hang up or the view to close
    pub async fn finished(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(%err, "feed task did not shut down cleanly");
            }
        }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        // dropping the sender wakes the task up
        self.cancel.take();
    }
}

impl<S: Store + 'static> ThreadView<S> {
    /// Subscribes to the store's pushes for this view's content item
    pub async fn start_feed(&self) -> Result<FeedHandle, Error> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        let events = self.inner.store.subscribe(&self.inner.content).await?;
        tracing::debug!(content = %self.inner.content, "connected to push feed");
        Ok(self.attach_feed(events))
    }

    /// Merges every event of `events` into this view until stopped
    pub fn attach_feed(&self, events: BoxStream<'static, FeedEvent>) -> FeedHandle {
        let (cancel, cancelled) = oneshot::channel::<()>();
        let mut shutdown = self.inner.shutdown.subscribe();
        let view = self.clone();
        let task = tokio::spawn(async move {
            let mut events = events.fuse();
            let mut cancelled = cancelled.fuse();
            loop {
                if *shutdown.borrow() {
                    break;
                }
                let closed = shutdown.changed().fuse();
                futures::pin_mut!(closed);
                futures::select! {
                    _ = cancelled => break,
                    _ = closed => continue,
                    evt = events.next() => match evt {
                        Some(evt) => {
                            view.merge(evt);
                        }
                        None => {
                            tracing::debug!(content = %view.inner.content, "push feed ended");
                            break;
                        }
                    },
                }
            }
        });
        FeedHandle {
            cancel: Some(cancel),
            task: Some(task),
        }
    }
}
