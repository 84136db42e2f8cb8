mod descriptor;
mod fallback;
mod offline;
mod recommender;
mod spotify;

use crate::util::is_http_retryable;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use descriptor::{describe, describe_label, EmotionDescriptor, EnergyLevel, Valence};
pub use fallback::{fallback_recommendations, FALLBACK_ARTIST, FALLBACK_URL};
pub use offline::OfflineSearch;
pub use recommender::{Recommender, MAX_RECOMMENDATIONS, RESULTS_PER_GENRE, SEARCHED_GENRES};
pub use spotify::{SpotifyClient, SpotifyEndpoints};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Playlist,
    Track,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub name: String,
    pub artist: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: RecommendationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum SearchError {
    #[error("music search credentials are not configured")]
    MissingCredentials,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("authentication rejected ({0}): {1}")]
    Auth(u16, String),

    #[error("http error {0}: {1}")]
    HttpStatus(u16, String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SearchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            SearchError::Auth(s, _) | SearchError::HttpStatus(s, _) => Some(*s),
            SearchError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Timeouts, connection failures and retryable statuses.
    pub fn is_retryable(&self) -> bool {
        match self {
            SearchError::Network(e) if e.is_timeout() || e.is_connect() => true,
            _ => self.status().is_some_and(is_http_retryable),
        }
    }
}

/// Remote catalog lookup. `limit` caps the number of items returned.
pub trait MusicSearch: Send + Sync {
    fn search(
        &self,
        query: String,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Recommendation>, SearchError>>;
}

impl<T: MusicSearch + ?Sized> MusicSearch for Arc<T> {
    fn search(
        &self,
        query: String,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Recommendation>, SearchError>> {
        (**self).search(query, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SearchError::HttpStatus(503, String::new()).is_retryable());
        assert!(SearchError::HttpStatus(429, String::new()).is_retryable());
        assert!(!SearchError::HttpStatus(404, String::new()).is_retryable());
        assert!(!SearchError::Auth(401, String::new()).is_retryable());
        assert!(!SearchError::MissingCredentials.is_retryable());
    }

    #[test]
    fn track_recommendation_carries_image() {
        let r = Recommendation {
            name: "Song".to_owned(),
            artist: "A, B".to_owned(),
            url: "https://open.spotify.com/track/x".to_owned(),
            kind: RecommendationKind::Track,
            image: Some("https://i.scdn.co/image/x".to_owned()),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type"], "track");
        assert_eq!(json["image"], "https://i.scdn.co/image/x");
    }
}
