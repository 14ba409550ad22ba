use threadsync_client::api::{self, AuthToken, Author, ContentRef, UserId};

/// Initial contents of a reference store, as written by `generate-test-data`
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct Seed {
    pub users: Vec<SeedUser>,
    pub threads: Vec<SeedThread>,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SeedUser {
    pub author: Author,
    pub token: AuthToken,
}

#[derive(Clone, Debug, serde::Deserialize, serde::Serialize)]
pub struct SeedThread {
    pub content: ContentRef,

    #[serde(default)]
    pub owner: Option<UserId>,

    #[serde(default)]
    pub comments: Vec<api::Comment>,
}
