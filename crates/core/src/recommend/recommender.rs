use crate::emotion::Emotion;
use crate::recommend::{describe, fallback_recommendations, MusicSearch, Recommendation, SearchError};

const LOG_TARGET: &str = "recommend";

pub const MAX_RECOMMENDATIONS: usize = 10;
/// Only the first genres of a descriptor are queried.
pub const SEARCHED_GENRES: usize = 2;
pub const RESULTS_PER_GENRE: usize = 5;

/// Turns an emotion into a short list of playlists and tracks.
///
/// Searches `genre:<genre> <mood>` for the leading genres of the emotion's
/// descriptor. Whenever search produces nothing the static catalog is used,
/// so the list is never empty.
#[derive(Clone, Debug)]
pub struct Recommender<S> {
    search: S,
}

impl<S: MusicSearch> Recommender<S> {
    pub fn new(search: S) -> Self {
        Self { search }
    }

    pub async fn recommend(&self, emotion: Emotion) -> Vec<Recommendation> {
        let descriptor = describe(emotion);
        let mut results = Vec::new();

        for genre in descriptor.genres.iter().take(SEARCHED_GENRES) {
            let query = format!("genre:{genre} {}", descriptor.mood);
            match self.search.search(query.clone(), RESULTS_PER_GENRE).await {
                Ok(items) => results.extend(items),
                Err(SearchError::MissingCredentials) => break,
                Err(e) => {
                    tracing::warn!(target: LOG_TARGET, %query, error = %e, "search failed; skipping genre");
                }
            }
            if results.len() >= MAX_RECOMMENDATIONS {
                break;
            }
        }

        if results.is_empty() {
            tracing::debug!(target: LOG_TARGET, %emotion, "using static playlists");
            return fallback_recommendations(emotion);
        }
        results.truncate(MAX_RECOMMENDATIONS);
        results
    }

    /// Unknown labels are recommended for as neutral.
    pub async fn recommend_label(&self, label: &str) -> (Emotion, Vec<Recommendation>) {
        let emotion = Emotion::from_label(label);
        (emotion, self.recommend(emotion).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::{OfflineSearch, RecommendationKind};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn track(name: &str) -> Recommendation {
        Recommendation {
            name: name.to_owned(),
            artist: "Artist".to_owned(),
            url: format!("https://open.spotify.com/track/{name}"),
            kind: RecommendationKind::Track,
            image: None,
        }
    }

    /// Returns `per_call` items for every query and records the queries.
    #[derive(Default)]
    struct StubSearch {
        per_call: usize,
        fail: bool,
        queries: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl MusicSearch for StubSearch {
        fn search(
            &self,
            query: String,
            _limit: usize,
        ) -> BoxFuture<'_, Result<Vec<Recommendation>, SearchError>> {
            async move {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                self.queries.lock().unwrap().push(query);
                if self.fail {
                    return Err(SearchError::HttpStatus(500, "boom".to_owned()));
                }
                Ok((0..self.per_call).map(|i| track(&format!("{n}-{i}"))).collect())
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn queries_first_two_genres_with_mood() {
        let stub = Arc::new(StubSearch {
            per_call: 3,
            ..Default::default()
        });
        let recs = Recommender::new(stub.clone()).recommend(Emotion::Happy).await;
        assert_eq!(recs.len(), 6);
        assert_eq!(
            *stub.queries.lock().unwrap(),
            vec!["genre:pop upbeat".to_owned(), "genre:dance upbeat".to_owned()]
        );
    }

    #[tokio::test]
    async fn failing_search_falls_back() {
        let stub = Arc::new(StubSearch {
            fail: true,
            ..Default::default()
        });
        let recs = Recommender::new(stub.clone()).recommend(Emotion::Sad).await;
        assert_eq!(recs, fallback_recommendations(Emotion::Sad));
        assert_eq!(stub.calls.load(Ordering::SeqCst), SEARCHED_GENRES);
    }

    #[tokio::test]
    async fn empty_search_falls_back() {
        let stub = Arc::new(StubSearch::default());
        let recs = Recommender::new(stub).recommend(Emotion::Calm).await;
        assert_eq!(recs, fallback_recommendations(Emotion::Calm));
    }

    #[tokio::test]
    async fn offline_search_falls_back_without_second_query() {
        let recs = Recommender::new(OfflineSearch::new())
            .recommend(Emotion::Energetic)
            .await;
        assert_eq!(recs.len(), 5);
        assert_eq!(recs[0].name, "High Energy Workout");
    }

    #[tokio::test]
    async fn results_are_capped() {
        let stub = Arc::new(StubSearch {
            per_call: 7,
            ..Default::default()
        });
        let recs = Recommender::new(stub).recommend(Emotion::Neutral).await;
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
    }

    #[tokio::test]
    async fn full_first_page_skips_second_genre() {
        let stub = Arc::new(StubSearch {
            per_call: 10,
            ..Default::default()
        });
        let recs = Recommender::new(stub.clone()).recommend(Emotion::Stressed).await;
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_label_recommends_neutral() {
        let (emotion, recs) = Recommender::new(OfflineSearch::new())
            .recommend_label("bewildered")
            .await;
        assert_eq!(emotion, Emotion::Neutral);
        assert_eq!(recs, fallback_recommendations(Emotion::Neutral));
    }
}
