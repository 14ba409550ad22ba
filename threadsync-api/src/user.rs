use uuid::Uuid;

use crate::STUB_UUID;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn stub() -> UserId {
        UserId(STUB_UUID)
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }
}

/// Author enrichment attached by the store to every comment it returns
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Author {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,

    /// Display accent, not security-relevant
    pub color: String,
}

impl Author {
    pub fn stub() -> Author {
        Author {
            id: UserId::stub(),
            display_name: String::from("stub"),
            avatar_url: None,
            color: String::from("#000000"),
        }
    }
}
