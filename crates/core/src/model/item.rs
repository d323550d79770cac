use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::config::{CONFERENCE_PER_QUESTION_SECS, DEFAULT_PER_QUESTION_SECS};
use crate::model::ids::ContentId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentRefError {
    #[error("unknown content kind: {0}")]
    UnknownKind(String),

    #[error("expected <kind>:<id>, got {0}")]
    Malformed(String),

    #[error("invalid content id: {0}")]
    InvalidId(String),
}

//
// ─── CONTENT KIND ──────────────────────────────────────────────────────────────
//

/// The kinds of portal content a quiz can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContentKind {
    Webinar,
    Conference,
    Workshop,
    Program,
    Elearning,
}

impl ContentKind {
    pub const ALL: [ContentKind; 5] = [
        ContentKind::Webinar,
        ContentKind::Conference,
        ContentKind::Workshop,
        ContentKind::Program,
        ContentKind::Elearning,
    ];

    /// Stable lowercase name, used in storage and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Webinar => "webinar",
            ContentKind::Conference => "conference",
            ContentKind::Workshop => "workshop",
            ContentKind::Program => "program",
            ContentKind::Elearning => "elearning",
        }
    }

    /// Per-question limit used when the catalog does not configure one.
    ///
    /// Conference quizzes historically ran with a longer fallback.
    #[must_use]
    pub fn fallback_question_secs(self) -> i64 {
        match self {
            ContentKind::Conference => CONFERENCE_PER_QUESTION_SECS,
            _ => DEFAULT_PER_QUESTION_SECS,
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ContentRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or(ContentRefError::UnknownKind(normalized))
    }
}

//
// ─── CONTENT REF ───────────────────────────────────────────────────────────────
//

/// Points at one content item; quizzes are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: ContentId,
}

impl ContentRef {
    #[must_use]
    pub fn new(kind: ContentKind, id: ContentId) -> Self {
        Self { kind, id }
    }

    #[must_use]
    pub fn conference(id: u64) -> Self {
        Self::new(ContentKind::Conference, ContentId::new(id))
    }

    #[must_use]
    pub fn webinar(id: u64) -> Self {
        Self::new(ContentKind::Webinar, ContentId::new(id))
    }

    #[must_use]
    pub fn workshop(id: u64) -> Self {
        Self::new(ContentKind::Workshop, ContentId::new(id))
    }

    #[must_use]
    pub fn program(id: u64) -> Self {
        Self::new(ContentKind::Program, ContentId::new(id))
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for ContentRef {
    type Err = ContentRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| ContentRefError::Malformed(s.to_string()))?;
        let kind: ContentKind = kind.parse()?;
        let id: ContentId = id
            .trim()
            .parse()
            .map_err(|_| ContentRefError::InvalidId(id.to_string()))?;
        Ok(Self { kind, id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kind_and_id() {
        let parsed: ContentRef = "Conference:3".parse().unwrap();
        assert_eq!(parsed, ContentRef::conference(3));
        assert_eq!(parsed.to_string(), "conference:3");
    }

    #[test]
    fn rejects_unknown_kind_and_missing_separator() {
        assert!(matches!(
            "podcast:1".parse::<ContentRef>(),
            Err(ContentRefError::UnknownKind(_))
        ));
        assert!(matches!(
            "webinar".parse::<ContentRef>(),
            Err(ContentRefError::Malformed(_))
        ));
        assert!(matches!(
            "webinar:x".parse::<ContentRef>(),
            Err(ContentRefError::InvalidId(_))
        ));
    }

    #[test]
    fn conference_uses_longer_fallback() {
        assert_eq!(ContentKind::Conference.fallback_question_secs(), 150);
        assert_eq!(ContentKind::Workshop.fallback_question_secs(), 30);
    }
}
