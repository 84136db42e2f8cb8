use crate::recommend::{MusicSearch, Recommendation, SearchError};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Stand-in used when no search credentials are configured.
/// Every query fails, which sends the recommender to the static catalog.
#[derive(Clone, Debug, Default)]
pub struct OfflineSearch;

impl OfflineSearch {
    pub fn new() -> Self {
        Self
    }
}

impl MusicSearch for OfflineSearch {
    fn search(
        &self,
        _query: String,
        _limit: usize,
    ) -> BoxFuture<'_, Result<Vec<Recommendation>, SearchError>> {
        async { Err(SearchError::MissingCredentials) }.boxed()
    }
}
