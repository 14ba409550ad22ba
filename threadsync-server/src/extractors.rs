use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{self, request},
};
use threadsync_api::{AuthToken, Author, Uuid};
use threadsync_mock_server::MockServer;
use tokio::sync::Mutex;

use crate::Error;

pub type SharedServer = Arc<Mutex<MockServer>>;

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub server: SharedServer,
}

impl AppState {
    pub fn new(server: MockServer) -> AppState {
        AppState {
            server: Arc::new(Mutex::new(server)),
        }
    }
}

/// Bearer token of the request, not checked against the sessions yet
pub struct Bearer(pub AuthToken);

#[async_trait]
impl<S: Sync> FromRequestParts<S> for Bearer {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, _state: &S) -> Result<Bearer, Error> {
        match req.headers.get(http::header::AUTHORIZATION) {
            None => Err(Error::permission_denied()),
            Some(auth) => {
                let auth = auth.to_str().map_err(|_| Error::permission_denied())?;
                let mut auth = auth.split(' ');
                if !auth
                    .next()
                    .ok_or(Error::permission_denied())?
                    .eq_ignore_ascii_case("bearer")
                {
                    return Err(Error::permission_denied());
                }
                let token = auth.next().ok_or(Error::permission_denied())?;
                if auth.next().is_some() {
                    return Err(Error::permission_denied());
                }
                let token = Uuid::try_from(token).map_err(|_| Error::permission_denied())?;
                Ok(Bearer(AuthToken(token)))
            }
        }
    }
}

pub struct Auth(pub Author);

#[async_trait]
impl FromRequestParts<AppState> for Auth {
    type Rejection = Error;

    async fn from_request_parts(req: &mut request::Parts, state: &AppState) -> Result<Auth, Error> {
        let token = Bearer::from_request_parts(req, state).await?.0;
        Ok(Auth(state.server.lock().await.whoami(token)?))
    }
}
