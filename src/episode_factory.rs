// src/episode_factory.rs
use crate::episode::{Episode, EpisodeID};
use crate::errors::FeedError;
use chrono::{DateTime, Locale, NaiveDate, NaiveDateTime};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

pub const DEFAULT_LATEST_COUNT: usize = 2;

const PUBLISHED_AT_FORMAT: &str = "%-d %b %y";
const DISPLAY_LOCALE: Locale = Locale::pt_BR;

/// An episode as the API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEpisode {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub members: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub description: Option<String>,
    pub published_at: String,
    pub file: RawEpisodeFile,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEpisodeFile {
    pub url: String,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    // Number or numeric string, depending on who wrote the feed.
    pub duration: Value,
}

/// The feed split the way the home screen shows it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeFeed {
    pub latest: Vec<Episode>,
    pub all: Vec<Episode>,
}

impl EpisodeFeed {
    /// Splits `episodes` after the first `latest_count` entries.
    pub fn partition(mut episodes: Vec<Episode>, latest_count: usize) -> Self {
        let split_at = latest_count.min(episodes.len());
        let all = episodes.split_off(split_at);
        Self { latest: episodes, all }
    }

    /// Latest followed by all: the queue handed to the player.
    pub fn playback_list(&self) -> Vec<Episode> {
        self.latest.iter().chain(self.all.iter()).cloned().collect()
    }

    pub fn latest_index(&self, row: usize) -> usize {
        row
    }

    pub fn all_index(&self, row: usize) -> usize {
        row + self.latest.len()
    }

    pub fn len(&self) -> usize {
        self.latest.len() + self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty() && self.all.is_empty()
    }
}

/// `HH:MM:SS`, hours are not wrapped at 24.
pub fn convert_duration_to_time_string(duration: u64) -> String {
    let hours = duration / 3600;
    let minutes = (duration % 3600) / 60;
    let seconds = duration % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Accepts `3600`, `3600.7` and `"3600"`. Fractions are truncated.
pub fn parse_duration(value: &Value) -> Result<u64, String> {
    let seconds: f64 = match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| format!("unrepresentable duration {}", n))?,
        Value::String(s) => {
            s.trim().parse::<f64>().map_err(|_| format!("non-numeric duration '{}'", s))?
        }
        other => return Err(format!("unexpected duration value {}", other)),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(format!("invalid duration {}", seconds));
    }
    Ok(seconds.trunc() as u64)
}

/// Formats an API timestamp as `d MMM yy` in Brazilian Portuguese, e.g. `8 jan 21`.
pub fn format_published_at(published_at: &str) -> Result<String, String> {
    let raw = published_at.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.format_localized(PUBLISHED_AT_FORMAT, DISPLAY_LOCALE).to_string());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc().format_localized(PUBLISHED_AT_FORMAT, DISPLAY_LOCALE).to_string());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or("invalid midnight")?;
        return Ok(midnight
            .and_utc()
            .format_localized(PUBLISHED_AT_FORMAT, DISPLAY_LOCALE)
            .to_string());
    }
    Err(format!("unrecognized date '{}'", published_at))
}

pub struct EpisodeFactory {
    latest_count: usize,
}

impl Default for EpisodeFactory {
    fn default() -> Self {
        Self { latest_count: DEFAULT_LATEST_COUNT }
    }
}

impl EpisodeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    // Builder methods
    pub fn with_latest_count(mut self, count: usize) -> Self {
        self.latest_count = count;
        self
    }

    pub fn create_episode(&self, raw: RawEpisode) -> Result<Episode, FeedError> {
        let invalid = |reason: String| FeedError::InvalidRecord { id: raw.id.clone(), reason };

        let duration = parse_duration(&raw.file.duration).map_err(invalid)?;
        let published_at = format_published_at(&raw.published_at).map_err(invalid)?;
        if let Some(mime) = raw.file.mime_type.as_deref() {
            if !mime.starts_with("audio/") {
                warn!("EpisodeFactory: episode '{}' has non-audio type '{}'", raw.id, mime);
            }
        }

        Ok(Episode::new(
            EpisodeID::new(&raw.id),
            raw.title,
            raw.members,
            raw.thumbnail,
            duration,
            convert_duration_to_time_string(duration),
            raw.file.url,
            published_at,
            raw.description,
        ))
    }

    /// Normalizes every record, keeping API order, then partitions.
    pub fn create_feed(&self, raw_episodes: Vec<RawEpisode>) -> Result<EpisodeFeed, FeedError> {
        let episodes = raw_episodes
            .into_iter()
            .map(|raw| self.create_episode(raw))
            .collect::<Result<Vec<Episode>, FeedError>>()?;

        debug!(
            "EpisodeFactory: normalized {} episodes, {} latest",
            episodes.len(),
            self.latest_count.min(episodes.len())
        );
        Ok(EpisodeFeed::partition(episodes, self.latest_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::test_support::sample_episode;
    use serde_json::json;

    fn raw_episode(id: &str, published_at: &str, duration: Value) -> RawEpisode {
        serde_json::from_value(json!({
            "id": id,
            "title": format!("Episode {}", id),
            "members": "Diego e Richard",
            "published_at": published_at,
            "thumbnail": "https://example.com/thumb.jpg",
            "description": "<p>Show notes</p>",
            "file": {
                "url": format!("https://example.com/{}.m4a", id),
                "type": "audio/x-m4a",
                "duration": duration
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_convert_duration_to_time_string() {
        assert_eq!(convert_duration_to_time_string(0), "00:00:00");
        assert_eq!(convert_duration_to_time_string(3725), "01:02:05");
        assert_eq!(convert_duration_to_time_string(90_000), "25:00:00");
    }

    #[test]
    fn test_parse_duration_variants() {
        assert_eq!(parse_duration(&json!(3981)), Ok(3981));
        assert_eq!(parse_duration(&json!("3981")), Ok(3981));
        assert_eq!(parse_duration(&json!(12.9)), Ok(12));
        assert!(parse_duration(&json!(-1)).is_err());
        assert!(parse_duration(&json!("abc")).is_err());
        assert!(parse_duration(&json!(null)).is_err());
    }

    #[test]
    fn test_format_published_at() {
        assert_eq!(format_published_at("2021-01-08 16:00:00").unwrap(), "8 jan 21");
        assert_eq!(format_published_at("2021-02-15T10:00:00-03:00").unwrap(), "15 fev 21");
        assert_eq!(format_published_at("2020-12-03").unwrap(), "3 dez 20");
        assert!(format_published_at("yesterday").is_err());
    }

    #[test]
    fn test_create_episode_normalizes_fields() {
        let episode = EpisodeFactory::new()
            .create_episode(raw_episode("a", "2021-01-22 16:00:00", json!("3981")))
            .unwrap();

        assert_eq!(episode.id().as_str(), "a");
        assert_eq!(episode.duration(), 3981);
        assert_eq!(episode.duration_as_string(), "01:06:21");
        assert_eq!(episode.published_at(), "22 jan 21");
        assert_eq!(episode.url(), "https://example.com/a.m4a");
        assert_eq!(episode.description(), Some("<p>Show notes</p>"));
    }

    #[test]
    fn test_create_episode_rejects_negative_duration() {
        let result = EpisodeFactory::new()
            .create_episode(raw_episode("bad", "2021-01-22 16:00:00", json!(-5)));
        assert!(matches!(result, Err(FeedError::InvalidRecord { id, .. }) if id == "bad"));
    }

    #[test]
    fn test_create_feed_partitions_in_order() {
        let raws = ["a", "b", "c", "d"]
            .iter()
            .map(|id| raw_episode(id, "2021-01-22 16:00:00", json!(60)))
            .collect();
        let feed = EpisodeFactory::new().create_feed(raws).unwrap();

        let ids = |eps: &[Episode]| eps.iter().map(|e| e.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(&feed.latest), vec!["a", "b"]);
        assert_eq!(ids(&feed.all), vec!["c", "d"]);
    }

    #[test]
    fn test_partition_short_feed() {
        let feed = EpisodeFeed::partition(vec![sample_episode("a")], DEFAULT_LATEST_COUNT);
        assert_eq!(feed.latest.len(), 1);
        assert!(feed.all.is_empty());

        let empty = EpisodeFeed::partition(Vec::new(), DEFAULT_LATEST_COUNT);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_playback_indices_line_up_with_playback_list() {
        let feed = EpisodeFeed::partition(
            ["a", "b", "c", "d", "e"].iter().map(|id| sample_episode(id)).collect(),
            DEFAULT_LATEST_COUNT,
        );
        let list = feed.playback_list();

        assert_eq!(list.len(), feed.len());
        assert_eq!(list[feed.latest_index(1)].id().as_str(), "b");
        assert_eq!(list[feed.all_index(0)].id().as_str(), "c");
        assert_eq!(list[feed.all_index(2)].id().as_str(), "e");
    }
}
