use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

use anyhow::Context;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use threadsync_mock_server::{MockServer, Seed};

mod error;
mod extractors;
mod handlers;

use error::Error;
use extractors::AppState;

#[derive(structopt::StructOpt)]
struct Opt {
    /// Address to listen on
    #[structopt(long, env = "THREADSYNC_LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    /// JSON seed file, as written by generate-test-data
    #[structopt(long, env = "THREADSYNC_SEED", parse(from_os_str))]
    seed: Option<PathBuf>,
}

fn load_seed(path: &Path) -> anyhow::Result<MockServer> {
    let data =
        std::fs::read(path).with_context(|| format!("reading seed file {:?}", path))?;
    let seed: Seed = serde_json::from_slice(&data)
        .with_context(|| format!("parsing seed file {:?}", path))?;
    tracing::info!(
        users = seed.users.len(),
        threads = seed.threads.len(),
        "loaded seed data"
    );
    Ok(MockServer::from_seed(seed))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/whoami", get(handlers::whoami))
        .route(
            "/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/comments/reply", post(handlers::create_reply))
        .route("/comments/edit", put(handlers::edit_comment))
        .route("/comments/delete", delete(handlers::delete_comment))
        .route("/comments/solution", put(handlers::set_solution))
        .route("/comments/feed", get(handlers::comment_feed))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = <Opt as structopt::StructOpt>::from_args();

    let server = match &opt.seed {
        Some(path) => load_seed(path)?,
        None => MockServer::new(),
    };

    let app = app(AppState::new(server));

    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
