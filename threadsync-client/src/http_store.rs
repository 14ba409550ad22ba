use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt};
use reqwest::{RequestBuilder, Response, StatusCode};

use crate::{
    api::{
        self, AuthToken, Author, CommentId, CommentPage, ContentRef, DeleteComment, EditComment,
        FeedEvent, ListComments, NewComment, NewReply, SetSolution, Success,
    },
    Error, Store,
};

/// `Store` talking to a threadsync server over HTTP
#[derive(Clone)]
pub struct HttpStore {
    client: reqwest::Client,
    host: String,
    token: AuthToken,
}

impl HttpStore {
    pub fn new(host: String, token: AuthToken) -> HttpStore {
        HttpStore {
            client: reqwest::Client::new(),
            host: String::from(host.trim_end_matches('/')),
            token,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Profile of the user the token belongs to
    pub async fn whoami(&self) -> Result<Author, Error> {
        let resp = self.send(self.client.get(self.url("whoami"))).await?;
        Ok(resp.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.host, path)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, Error> {
        let resp = req.bearer_auth(self.token.0).send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.bytes().await?;
        match api::Error::parse(&body) {
            Ok(err) => Err(Error::from(err)),
            Err(_) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                Err(Error::Unauthorized)
            }
            Err(err) => Err(Error::Transient(format!(
                "unexpected {} response: {:#}",
                status, err
            ))),
        }
    }

    async fn send_ok(&self, req: RequestBuilder) -> Result<(), Error> {
        let res: Success = self.send(req).await?.json().await?;
        match res.success {
            true => Ok(()),
            false => Err(Error::Remote(api::Error::Unknown(String::from(
                "store reported failure",
            )))),
        }
    }
}

#[async_trait]
impl Store for HttpStore {
    async fn fetch_page(&self, q: &ListComments) -> Result<CommentPage, Error> {
        let page: CommentPage = self
            .send(self.client.get(self.url("comments")).query(q))
            .await?
            .json()
            .await?;
        if !page.success {
            return Err(Error::Remote(api::Error::Unknown(String::from(
                "store failed listing comments",
            ))));
        }
        Ok(page)
    }

    async fn create_comment(&self, c: &NewComment) -> Result<api::Comment, Error> {
        let resp = self
            .send(self.client.post(self.url("comments")).json(c))
            .await?;
        Ok(resp.json().await?)
    }

    async fn create_reply(&self, r: &NewReply) -> Result<api::Comment, Error> {
        let resp = self
            .send(self.client.post(self.url("comments/reply")).json(r))
            .await?;
        Ok(resp.json().await?)
    }

    async fn edit_comment(&self, e: &EditComment) -> Result<(), Error> {
        self.send_ok(self.client.put(self.url("comments/edit")).json(e))
            .await
    }

    async fn delete_comment(&self, id: CommentId) -> Result<(), Error> {
        self.send_ok(
            self.client
                .delete(self.url("comments/delete"))
                .query(&DeleteComment { id }),
        )
        .await
    }

    async fn set_solution(&self, s: &SetSolution) -> Result<(), Error> {
        self.send_ok(self.client.put(self.url("comments/solution")).json(s))
            .await
    }

    async fn subscribe(&self, content: &ContentRef) -> Result<BoxStream<'static, FeedEvent>, Error> {
        let resp = self
            .send(self.client.get(self.url("comments/feed")).query(content))
            .await?;
        Ok(feed_lines(resp.bytes_stream().boxed())
            .filter_map(|line| async move {
                match serde_json::from_slice::<FeedEvent>(&line) {
                    Ok(evt) => Some(evt),
                    Err(err) => {
                        tracing::warn!(%err, "ignoring malformed feed line");
                        None
                    }
                }
            })
            .boxed())
    }
}

/// Splits a newline-delimited body into its non-blank lines
fn feed_lines<B>(body: BoxStream<'static, reqwest::Result<B>>) -> BoxStream<'static, Vec<u8>>
where
    B: AsRef<[u8]> + Send + 'static,
{
    futures::stream::unfold((body, Vec::new()), |(mut body, mut buf)| async move {
        loop {
            if let Some(pos) = buf.iter().position(|b| *b == b'\n') {
                let line = buf.drain(..=pos).collect::<Vec<u8>>();
                if line.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                return Some((line, (body, buf)));
            }
            match body.next().await {
                Some(Ok(chunk)) => buf.extend_from_slice(chunk.as_ref()),
                Some(Err(err)) => {
                    tracing::warn!(%err, "push feed connection failed");
                    return None;
                }
                None => return None,
            }
        }
    })
    .boxed()
}
