use std::convert::Infallible;

use axum::{
    body::StreamBody,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use futures::StreamExt;
use threadsync_api::{
    Author, Comment, CommentPage, ContentRef, DeleteComment, EditComment, ListComments,
    NewComment, NewReply, SetSolution, Success,
};

use crate::{extractors::*, Error};

pub async fn whoami(Auth(user): Auth) -> Json<Author> {
    Json(user)
}

pub async fn list_comments(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Query(q): Query<ListComments>,
) -> Result<Json<CommentPage>, Error> {
    Ok(Json(server.lock().await.list_comments(token, &q)?))
}

pub async fn create_comment(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Json(data): Json<NewComment>,
) -> Result<Json<Comment>, Error> {
    Ok(Json(server.lock().await.create_comment(token, data)?))
}

pub async fn create_reply(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Json(data): Json<NewReply>,
) -> Result<Json<Comment>, Error> {
    Ok(Json(server.lock().await.create_reply(token, data)?))
}

pub async fn edit_comment(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Json(data): Json<EditComment>,
) -> Result<Json<Success>, Error> {
    server.lock().await.edit_comment(token, data)?;
    Ok(Json(Success::ok()))
}

pub async fn delete_comment(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Query(DeleteComment { id }): Query<DeleteComment>,
) -> Result<Json<Success>, Error> {
    server.lock().await.delete_comment(token, id)?;
    Ok(Json(Success::ok()))
}

pub async fn set_solution(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Json(data): Json<SetSolution>,
) -> Result<Json<Success>, Error> {
    server.lock().await.set_solution(token, data)?;
    Ok(Json(Success::ok()))
}

/// Push feed of one content item, one JSON `FeedEvent` per line
pub async fn comment_feed(
    Bearer(token): Bearer,
    State(server): State<SharedServer>,
    Query(content): Query<ContentRef>,
) -> Result<impl IntoResponse, Error> {
    let feed = server.lock().await.subscribe(token, content)?;
    tracing::info!(%content, "push feed connected");
    let lines = futures::stream::unfold(feed, |mut feed| async move {
        feed.recv().await.map(|evt| (evt, feed))
    })
    .filter_map(|evt| async move {
        match serde_json::to_vec(&evt) {
            Ok(mut line) => {
                line.push(b'\n');
                Some(Ok::<_, Infallible>(line))
            }
            Err(err) => {
                tracing::error!(?err, ?evt, "failed serializing feed event to json");
                None
            }
        }
    });
    Ok((
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        StreamBody::new(lines),
    ))
}
