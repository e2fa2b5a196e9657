// src/episode_download.rs
use crate::episode_factory::{EpisodeFactory, EpisodeFeed, RawEpisode};
use crate::errors::FeedError;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use url::Url;

pub const DEFAULT_EPISODE_LIMIT: usize = 12;

/// Query the feed is requested with: newest first, `limit` records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    pub limit: usize,
    pub sort: String,
    pub order: String,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_EPISODE_LIMIT,
            sort: "published_at".to_string(),
            order: "desc".to_string(),
        }
    }
}

/// Builds `{api_url}/episodes?_limit=..&_sort=..&_order=..`.
pub fn episodes_url(api_url: &str, query: &FeedQuery) -> Result<Url, FeedError> {
    let mut base = Url::parse(api_url)
        .map_err(|e| FeedError::InvalidUrl(format!("'{}': {}", api_url, e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(FeedError::InvalidUrl(format!(
            "'{}': only http/https supported, got '{}'",
            api_url,
            base.scheme()
        )));
    }

    // Url::join drops the last path segment unless the base ends in '/'.
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base
        .join("episodes")
        .map_err(|e| FeedError::InvalidUrl(format!("'{}': {}", api_url, e)))?;
    url.query_pairs_mut()
        .append_pair("_limit", &query.limit.to_string())
        .append_pair("_sort", &query.sort)
        .append_pair("_order", &query.order);
    Ok(url)
}

// ===== fetcher
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Returns the raw response body.
    async fn fetch(&self, url: &Url) -> Result<String, FeedError>;
}

// ===== Live http fetcher
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self, FeedError> {
        const APP_USER_AGENT: &str = concat!("podcastr/", env!("CARGO_PKG_VERSION"));

        let client: Client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FeedError> {
        info!("HttpFeedFetcher: fetching {}", url);
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FeedError::BadStatus(response.status()));
        }
        Ok(response.text().await?)
    }
}

// ===== Fake http fetcher for testing
pub struct FakeFetcher {
    pub response: String,
}

#[async_trait]
impl FeedFetcher for FakeFetcher {
    async fn fetch(&self, _url: &Url) -> Result<String, FeedError> {
        Ok(self.response.clone())
    }
}

/// Whether the home screen has something to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Loaded(EpisodeFeed),
    Unavailable(String),
}

impl FeedState {
    pub fn feed(&self) -> Option<&EpisodeFeed> {
        match self {
            FeedState::Loaded(feed) => Some(feed),
            FeedState::Unavailable(_) => None,
        }
    }
}

impl From<Result<EpisodeFeed, FeedError>> for FeedState {
    fn from(result: Result<EpisodeFeed, FeedError>) -> Self {
        match result {
            Ok(feed) => FeedState::Loaded(feed),
            Err(e) => FeedState::Unavailable(e.to_string()),
        }
    }
}

pub async fn download_episode_feed(
    api_url: &str,
    query: &FeedQuery,
    fetcher: &(dyn FeedFetcher + Send + Sync),
    factory: &EpisodeFactory,
) -> Result<EpisodeFeed, FeedError> {
    let url = episodes_url(api_url, query)?;
    let content: String = fetcher.fetch(&url).await?;
    debug!("download_episode_feed: content fetched, length: {}", content.len());

    let raw_episodes: Vec<RawEpisode> = serde_json::from_str(&content).map_err(|e| {
        error!("download_episode_feed: malformed response from {}: {}", url, e);
        e
    })?;
    info!("download_episode_feed: {} records from {}", raw_episodes.len(), url);

    factory.create_feed(raw_episodes)
}

/// Like [`download_episode_feed`], but never fails: errors become
/// [`FeedState::Unavailable`].
pub async fn load_feed_state(
    api_url: &str,
    query: &FeedQuery,
    fetcher: &(dyn FeedFetcher + Send + Sync),
    factory: &EpisodeFactory,
) -> FeedState {
    let state: FeedState = download_episode_feed(api_url, query, fetcher, factory).await.into();
    if let FeedState::Unavailable(reason) = &state {
        error!("Feed unavailable: {}", reason);
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_JSON: &str = r#"[
        {
            "id": "a-importancia-da-contribuicao-em-open-source",
            "title": "Faladev #30 | A importância da contribuição em Open Source",
            "members": "Diego Fernandes, João Pedro, Diego Haz e Bruno Lemos",
            "published_at": "2021-01-22 16:00:00",
            "thumbnail": "https://example.com/opensource.jpg",
            "description": "<p>Nesse episódio do Faladev...</p>",
            "file": { "url": "https://example.com/opensource.m4a", "type": "audio/x-m4a", "duration": 3981 }
        },
        {
            "id": "uma-conversa-sobre-programacao-funcional",
            "title": "Uma conversa sobre programação funcional e orientação a objetos",
            "members": "Diego Fernandes e Richard Nixon",
            "published_at": "2021-01-15 16:00:00",
            "thumbnail": "https://example.com/funcional.jpg",
            "file": { "url": "https://example.com/funcional.m4a", "type": "audio/x-m4a", "duration": "2250" }
        },
        {
            "id": "como-virar-lider-desenvolvimento",
            "title": "Como se tornar líder de desenvolvimento",
            "members": "Diego Fernandes e Mayk Brito",
            "published_at": "2021-01-08 16:00:00",
            "thumbnail": "https://example.com/lider.jpg",
            "file": { "url": "https://example.com/lider.m4a", "type": "audio/x-m4a", "duration": 1749 }
        }
    ]"#;

    #[test]
    fn test_episodes_url() {
        let url = episodes_url("http://localhost:3333", &FeedQuery::default()).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:3333/episodes?_limit=12&_sort=published_at&_order=desc"
        );

        let nested = episodes_url("https://api.example.com/v1", &FeedQuery::default()).unwrap();
        assert!(nested.as_str().starts_with("https://api.example.com/v1/episodes?"));
    }

    #[test]
    fn test_episodes_url_rejects_bad_scheme() {
        let result = episodes_url("ftp://example.com", &FeedQuery::default());
        assert!(matches!(result, Err(FeedError::InvalidUrl(_))));
        assert!(episodes_url("not a url", &FeedQuery::default()).is_err());
    }

    #[tokio::test]
    async fn test_download_episode_feed() {
        let fetcher = FakeFetcher { response: FEED_JSON.to_string() };

        let feed = download_episode_feed(
            "http://localhost:3333",
            &FeedQuery::default(),
            &fetcher,
            &EpisodeFactory::new(),
        )
        .await
        .unwrap();

        assert_eq!(feed.latest.len(), 2);
        assert_eq!(feed.all.len(), 1);
        assert_eq!(feed.latest[1].duration(), 2250);
        assert_eq!(feed.latest[1].duration_as_string(), "00:37:30");
        assert_eq!(feed.all[0].published_at(), "8 jan 21");
        assert_eq!(feed.all[0].description(), None);
    }

    // SAD PATHS

    #[tokio::test]
    async fn test_malformed_feed_is_unavailable() {
        let fetcher = FakeFetcher { response: r#"[{"id": "x""#.to_string() };

        let state = load_feed_state(
            "http://localhost:3333",
            &FeedQuery::default(),
            &fetcher,
            &EpisodeFactory::new(),
        )
        .await;

        assert!(matches!(state, FeedState::Unavailable(_)));
        assert!(state.feed().is_none());
    }

    #[tokio::test]
    async fn test_invalid_url_is_unavailable() {
        let fetcher = FakeFetcher { response: FEED_JSON.to_string() };

        let state =
            load_feed_state("::", &FeedQuery::default(), &fetcher, &EpisodeFactory::new()).await;

        match state {
            FeedState::Unavailable(reason) => assert!(reason.contains("Invalid API URL")),
            other => panic!("expected unavailable feed, got {:?}", other),
        }
    }
}
