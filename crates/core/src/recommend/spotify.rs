use crate::config::SpotifyCredentials;
use crate::recommend::{MusicSearch, Recommendation, RecommendationKind, SearchError};
use crate::util::{retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use url::Url;

const LOG_TARGET: &str = "recommend::spotify";
const DEFAULT_OWNER: &str = "Spotify";
/// Tokens this close to expiry are refreshed early.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpotifyEndpoints {
    pub token_url: String,
    pub api_base: String,
}

impl Default for SpotifyEndpoints {
    fn default() -> Self {
        Self {
            token_url: "https://accounts.spotify.com/api/token".to_owned(),
            api_base: "https://api.spotify.com/v1".to_owned(),
        }
    }
}

#[derive(Clone, Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

/// Spotify Web API search using the client-credentials flow.
/// The access token is shared between clones.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    credentials: SpotifyCredentials,
    endpoints: SpotifyEndpoints,
    token: Arc<Mutex<Option<AccessToken>>>,
    retry: RetryConfig,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials, timeout: Duration) -> Result<Self, SearchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            credentials,
            endpoints: SpotifyEndpoints::default(),
            token: Arc::new(Mutex::new(None)),
            retry: RetryConfig::default(),
        })
    }

    pub fn with_endpoints(mut self, endpoints: SpotifyEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn access_token(&self) -> Result<String, SearchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }
        let token = self.fetch_token().await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    async fn fetch_token(&self) -> Result<AccessToken, SearchError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("client_id", &self.credentials.client_id)
            .append_pair("client_secret", self.credentials.client_secret.expose())
            .finish();

        let response = self
            .client
            .post(&self.endpoints.token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SearchError::Auth(status.as_u16(), text));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("token response: {e}")))?;
        tracing::debug!(target: LOG_TARGET, expires_in = token.expires_in, "obtained access token");
        Ok(AccessToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }

    async fn search_once(&self, query: &str, limit: usize) -> Result<Vec<Recommendation>, SearchError> {
        let token = self.access_token().await?;
        let mut url = Url::parse(&format!(
            "{}/search",
            self.endpoints.api_base.trim_end_matches('/')
        ))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", "playlist,track")
            .append_pair("limit", &limit.to_string());

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.token.lock().await.take();
            let text = response.text().await.unwrap_or_default();
            return Err(SearchError::Auth(status.as_u16(), text));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SearchError::HttpStatus(status.as_u16(), text));
        }

        let page: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("search response: {e}")))?;
        Ok(into_recommendations(page, limit))
    }
}

impl MusicSearch for SpotifyClient {
    fn search(
        &self,
        query: String,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Recommendation>, SearchError>> {
        async move {
            let result = retry_with_backoff(
                &self.retry,
                || self.search_once(&query, limit),
                SearchError::is_retryable,
            )
            .await;
            match result {
                // A revoked token was dropped by `search_once`; try once more with a new one.
                Err(SearchError::Auth(401, _)) => self.search_once(&query, limit).await,
                other => other,
            }
        }
        .boxed()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    playlists: Option<Page<PlaylistItem>>,
    #[serde(default)]
    tracks: Option<Page<TrackItem>>,
}

#[derive(Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<Option<T>>,
}

#[derive(Deserialize, Default)]
struct ExternalUrls {
    #[serde(default)]
    spotify: Option<String>,
}

#[derive(Deserialize)]
struct Image {
    url: String,
}

#[derive(Deserialize)]
struct Owner {
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct PlaylistItem {
    name: String,
    #[serde(default)]
    owner: Option<Owner>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    images: Option<Vec<Image>>,
}

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct Album {
    #[serde(default)]
    images: Option<Vec<Image>>,
}

#[derive(Deserialize)]
struct TrackItem {
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    external_urls: ExternalUrls,
    #[serde(default)]
    album: Option<Album>,
}

fn first_image(images: Option<Vec<Image>>) -> Option<String> {
    images?.into_iter().next().map(|i| i.url)
}

/// Playlists first, then tracks. Items without a link are skipped.
fn into_recommendations(page: SearchResponse, limit: usize) -> Vec<Recommendation> {
    let playlists = page
        .playlists
        .map(|p| p.items)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            Some(Recommendation {
                url: item.external_urls.spotify?,
                artist: item
                    .owner
                    .and_then(|o| o.display_name)
                    .unwrap_or_else(|| DEFAULT_OWNER.to_owned()),
                name: item.name,
                kind: RecommendationKind::Playlist,
                image: first_image(item.images),
            })
        });

    let tracks = page
        .tracks
        .map(|p| p.items)
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .filter_map(|item| {
            Some(Recommendation {
                url: item.external_urls.spotify?,
                artist: item
                    .artists
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
                name: item.name,
                kind: RecommendationKind::Track,
                image: first_image(item.album.and_then(|a| a.images)),
            })
        });

    playlists.chain(tracks).take(limit).collect()
}
