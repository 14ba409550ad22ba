use std::collections::HashMap;

use chrono::Utc;
use threadsync_client::api::{
    self, AuthToken, Author, CommentId, CommentPage, ContentRef, Deletion, EditComment, Error,
    FeedEvent, FeedMessage, ListComments, NewComment, NewReply, OrderType, SetSolution, SortBy,
    UserId, Uuid,
};
use tokio::sync::mpsc;

mod seed;
pub use seed::{Seed, SeedThread, SeedUser};

mod store;
pub use store::MockStore;

/// In-memory reference store
pub struct MockServer {
    users: HashMap<UserId, Author>,
    sessions: HashMap<AuthToken, UserId>,
    threads: HashMap<ContentRef, Thread>,
    feeds: HashMap<ContentRef, Vec<mpsc::UnboundedSender<FeedEvent>>>,
}

#[derive(Debug, Default)]
struct Thread {
    /// Forum threads have an owner who picks the solution, articles may not
    owner: Option<UserId>,

    /// Top-level comments in creation order
    comments: Vec<api::Comment>,
}

impl Thread {
    fn find(&self, id: CommentId) -> Option<&api::Comment> {
        self.comments.iter().find_map(|c| c.find(id))
    }

    fn find_mut(&mut self, id: CommentId) -> Option<&mut api::Comment> {
        self.comments.iter_mut().find_map(|c| c.find_mut(id))
    }

    fn for_each_mut(&mut self, mut f: impl FnMut(&mut api::Comment)) {
        for c in self.comments.iter_mut() {
            c.for_each_mut(&mut f);
        }
    }
}

impl MockServer {
    pub fn new() -> MockServer {
        MockServer {
            users: HashMap::new(),
            sessions: HashMap::new(),
            threads: HashMap::new(),
            feeds: HashMap::new(),
        }
    }

    pub fn from_seed(seed: Seed) -> MockServer {
        let mut s = MockServer::new();
        for u in seed.users {
            s.add_user(u.author, u.token);
        }
        for t in seed.threads {
            s.add_thread(t.content, t.owner);
            if let Some(thread) = s.threads.get_mut(&t.content) {
                thread.comments = t.comments;
            }
        }
        s
    }

    pub fn add_user(&mut self, author: Author, token: AuthToken) {
        self.sessions.insert(token, author.id);
        self.users.insert(author.id, author);
    }

    pub fn add_thread(&mut self, content: ContentRef, owner: Option<UserId>) {
        self.threads.entry(content).or_default().owner = owner;
    }

    /// Return the current number of comments of `content`, at any depth
    pub fn test_num_comments(&self, content: &ContentRef) -> usize {
        self.threads.get(content).map_or(0, |t| {
            t.comments.iter().map(|c| 1 + c.reply_count()).sum()
        })
    }

    pub fn test_get_comment(&self, id: CommentId) -> Option<&api::Comment> {
        self.threads.values().find_map(|t| t.find(id))
    }

    fn resolve(&self, tok: AuthToken) -> Result<&Author, Error> {
        self.sessions
            .get(&tok)
            .and_then(|uid| self.users.get(uid))
            .ok_or(Error::PermissionDenied)
    }

    /// Thread holding comment `id`
    fn locate(&self, id: CommentId) -> Result<ContentRef, Error> {
        self.threads
            .iter()
            .find(|(_, t)| t.find(id).is_some())
            .map(|(content, _)| *content)
            .ok_or(Error::NotFound(id))
    }

    fn relay(&mut self, content: ContentRef, message: FeedMessage) {
        if let Some(feeds) = self.feeds.get_mut(&content) {
            let evt = FeedEvent { content, message };
            let before = feeds.len();
            feeds.retain(|f| f.send(evt.clone()).is_ok());
            if feeds.len() < before {
                tracing::debug!(%content, dropped = before - feeds.len(), "pruned closed feeds");
            }
        }
    }

    pub fn whoami(&self, tok: AuthToken) -> Result<Author, Error> {
        self.resolve(tok).cloned()
    }

    pub fn list_comments(&self, tok: AuthToken, q: &ListComments) -> Result<CommentPage, Error> {
        self.resolve(tok)?;
        let mut comments = self
            .threads
            .get(&q.content())
            .map(|t| t.comments.clone())
            .unwrap_or_default();
        comments.sort_by(|a, b| {
            let by_key = match q.sort_by {
                SortBy::CreatedAt => a.created_at.cmp(&b.created_at),
                SortBy::Replies => a.reply_count().cmp(&b.reply_count()),
                SortBy::Votes => a.vote_total.cmp(&b.vote_total),
            };
            let ord = by_key.then_with(|| a.id.cmp(&b.id));
            match q.order {
                OrderType::Asc => ord,
                OrderType::Desc => ord.reverse(),
            }
        });
        let total = comments.len();
        let comments = comments
            .into_iter()
            .skip(q.offset)
            .take(q.limit)
            .collect();
        Ok(CommentPage {
            success: true,
            comments,
            total,
        })
    }

    pub fn create_comment(&mut self, tok: AuthToken, c: NewComment) -> Result<api::Comment, Error> {
        c.validate()?;
        let author = self.resolve(tok)?.clone();
        let content = c.content();
        let comment = new_comment(author, c.text, None);
        self.threads
            .entry(content)
            .or_default()
            .comments
            .push(comment.clone());
        self.relay(content, FeedMessage::NewComment(comment.clone()));
        Ok(comment)
    }

    pub fn create_reply(&mut self, tok: AuthToken, r: NewReply) -> Result<api::Comment, Error> {
        r.validate()?;
        let author = self.resolve(tok)?.clone();
        let content = self.locate(r.parent_id)?;
        let thread = self
            .threads
            .get_mut(&content)
            .ok_or(Error::NotFound(r.parent_id))?;
        let mut replied_to = r.replied_to;
        if let Some(q) = replied_to.as_mut() {
            let quoted = thread.find(q.id).ok_or(Error::NotFound(q.id))?;
            q.is_deleted = quoted.is_deleted();
        }
        let parent = thread
            .find_mut(r.parent_id)
            .ok_or(Error::NotFound(r.parent_id))?;
        if parent.is_deleted() {
            return Err(Error::CommentDeleted(r.parent_id));
        }
        let comment = new_comment(author, r.text, replied_to);
        parent.replies.push(comment.clone());
        self.relay(
            content,
            FeedMessage::NewReply {
                parent_id: r.parent_id,
                comment: comment.clone(),
            },
        );
        Ok(comment)
    }

    pub fn edit_comment(&mut self, tok: AuthToken, e: EditComment) -> Result<(), Error> {
        e.validate()?;
        let user = self.resolve(tok)?.id;
        let content = self.locate(e.comment_id)?;
        let comment = self
            .threads
            .get_mut(&content)
            .and_then(|t| t.find_mut(e.comment_id))
            .ok_or(Error::NotFound(e.comment_id))?;
        if comment.author.id != user {
            return Err(Error::PermissionDenied);
        }
        if comment.is_deleted() {
            return Err(Error::CommentDeleted(e.comment_id));
        }
        let edited_at = Utc::now().max(comment.created_at);
        comment.text = e.text.clone();
        comment.edited_at = Some(edited_at);
        self.relay(
            content,
            FeedMessage::CommentEdited {
                comment_id: e.comment_id,
                text: e.text,
                edited_at,
            },
        );
        Ok(())
    }

    /// Tombstones `id`, for its author or the owner of its thread
    pub fn delete_comment(&mut self, tok: AuthToken, id: CommentId) -> Result<(), Error> {
        let user = self.resolve(tok)?.id;
        let content = self.locate(id)?;
        let thread = self.threads.get_mut(&content).ok_or(Error::NotFound(id))?;
        let owner = thread.owner;
        let comment = thread.find_mut(id).ok_or(Error::NotFound(id))?;
        if comment.author.id != user && owner != Some(user) {
            return Err(Error::PermissionDenied);
        }
        if comment.is_deleted() {
            return Ok(());
        }
        let deletion = Deletion {
            at: Utc::now(),
            by: user,
        };
        comment.deleted = Some(deletion.clone());
        thread.for_each_mut(|c| {
            if let Some(q) = c.replied_to.as_mut().filter(|q| q.id == id) {
                q.is_deleted = true;
            }
        });
        self.relay(
            content,
            FeedMessage::CommentDeleted {
                comment_id: id,
                deleted_at: deletion.at,
                deleted_by: deletion.by,
            },
        );
        Ok(())
    }

    /// Sets or clears the solution flag, clearing it on every other post of
    /// the thread when set
    pub fn set_solution(&mut self, tok: AuthToken, s: SetSolution) -> Result<(), Error> {
        let user = self.resolve(tok)?.id;
        let content = ContentRef::thread(s.hilo_id.0);
        if !self.threads.contains_key(&content) {
            return match self.threads.contains_key(&ContentRef::article(s.hilo_id.0)) {
                true => Err(Error::NotAForumThread),
                false => Err(Error::NotFound(s.comment_id)),
            };
        }
        let thread = self
            .threads
            .get_mut(&content)
            .ok_or(Error::NotFound(s.comment_id))?;
        if thread.owner != Some(user) {
            return Err(Error::PermissionDenied);
        }
        let comment = thread
            .find(s.comment_id)
            .ok_or(Error::NotFound(s.comment_id))?;
        if comment.is_deleted() {
            return Err(Error::CommentDeleted(s.comment_id));
        }
        thread.for_each_mut(|c| {
            if c.id == s.comment_id {
                c.is_solution = s.is_solution;
            } else if s.is_solution {
                c.is_solution = false;
            }
        });
        self.relay(
            content,
            FeedMessage::SolutionChanged {
                comment_id: s.comment_id,
                is_solution: s.is_solution,
            },
        );
        Ok(())
    }

    /// Votes are cast outside of this engine, this only records the outcome
    pub fn set_votes(&mut self, id: CommentId, vote_total: i64) -> Result<(), Error> {
        let content = self.locate(id)?;
        let comment = self
            .threads
            .get_mut(&content)
            .and_then(|t| t.find_mut(id))
            .ok_or(Error::NotFound(id))?;
        comment.vote_total = vote_total;
        self.relay(
            content,
            FeedMessage::VoteChanged {
                comment_id: id,
                vote_total,
            },
        );
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        tok: AuthToken,
        content: ContentRef,
    ) -> Result<mpsc::UnboundedReceiver<FeedEvent>, Error> {
        self.resolve(tok)?;
        let (sender, receiver) = mpsc::unbounded_channel();
        tracing::debug!(%content, "new feed subscriber");
        self.feeds.entry(content).or_default().push(sender);
        Ok(receiver)
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new()
    }
}

fn new_comment(
    author: Author,
    text: String,
    replied_to: Option<api::QuoteSnapshot>,
) -> api::Comment {
    api::Comment {
        id: CommentId(Uuid::new_v4()),
        author,
        text,
        created_at: Utc::now(),
        edited_at: None,
        deleted: None,
        replied_to,
        is_solution: false,
        vote_total: 0,
        replies: Vec::new(),
    }
}
