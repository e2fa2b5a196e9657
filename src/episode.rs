// src/episode.rs
use serde::{Deserialize, Serialize};
use std::fmt;

// === EPISODE STRUCTURES ===
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeID(String);

impl std::fmt::Display for EpisodeID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EpisodeID {
    pub fn new(s: &str) -> Self {
        EpisodeID(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A normalized episode, ready for display and playback.
///
/// The display strings (`duration_as_string`, `published_at`) are computed once by
/// [`crate::episode_factory::EpisodeFactory`] and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(rename = "id")]
    id: EpisodeID,
    #[serde(rename = "title")]
    title: String,
    #[serde(rename = "members")]
    members: String,
    #[serde(rename = "thumbnail")]
    thumbnail: String,
    #[serde(rename = "duration")]
    duration: u64,
    #[serde(rename = "durationAsString")]
    duration_as_string: String,
    #[serde(rename = "url")]
    url: String,
    #[serde(rename = "publishedAt")]
    published_at: String,
    #[serde(rename = "description")]
    description: Option<String>,
}

impl Episode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: EpisodeID,
        title: String,
        members: String,
        thumbnail: String,
        duration: u64,
        duration_as_string: String,
        url: String,
        published_at: String,
        description: Option<String>,
    ) -> Self {
        Self {
            id,
            title,
            members,
            thumbnail,
            duration,
            duration_as_string,
            url,
            published_at,
            description,
        }
    }

    pub fn id(&self) -> &EpisodeID {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn members(&self) -> &str {
        &self.members
    }

    pub fn thumbnail(&self) -> &str {
        &self.thumbnail
    }

    /// Length in whole seconds.
    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn duration_as_string(&self) -> &str {
        &self.duration_as_string
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn published_at(&self) -> &str {
        &self.published_at
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title       : {}", self.title)?;
        writeln!(f, "Members     : {}", self.members)?;
        writeln!(f, "Published   : {}", self.published_at)?;
        writeln!(f, "Duration    : {}", self.duration_as_string)?;
        write!(f, "Audio URL   : {}", self.url)
    }
}
