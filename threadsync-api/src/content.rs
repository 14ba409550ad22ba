use std::fmt;

use uuid::Uuid;

use crate::STUB_UUID;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Article,

    /// Forum thread, the only content type that supports solutions
    Thread,
}

impl ContentType {
    pub fn supports_solution(&self) -> bool {
        matches!(self, ContentType::Thread)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentType::Article => write!(f, "article"),
            ContentType::Thread => write!(f, "thread"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct ContentId(pub Uuid);

/// Key of a thread container: the content item the comments hang off
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct ContentRef {
    pub content_type: ContentType,
    pub content_id: ContentId,
}

impl ContentRef {
    pub fn stub() -> ContentRef {
        ContentRef {
            content_type: ContentType::Thread,
            content_id: ContentId(STUB_UUID),
        }
    }

    pub fn article(id: Uuid) -> ContentRef {
        ContentRef {
            content_type: ContentType::Article,
            content_id: ContentId(id),
        }
    }

    pub fn thread(id: Uuid) -> ContentRef {
        ContentRef {
            content_type: ContentType::Thread,
            content_id: ContentId(id),
        }
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.content_type, self.content_id.0)
    }
}
