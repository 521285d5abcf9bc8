//! In-memory catalog for exercising the retrieval pipeline without a network

use crate::metadata_retrieval::{
    EpisodeCatalog, MetadataRetrievalError, SearchQuery, SeasonRef, ShowIdentity,
};
use std::sync::Mutex;

/// A request received by [`FakeCatalog`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CatalogCall {
    Search(String, String),
    ShowSeasons(u64),
    SeasonEpisodes(u64, u32),
}

/// Catalog serving one canned show listing and recording every request
#[derive(Debug, Default)]
pub(crate) struct FakeCatalog {
    shows: Vec<ShowIdentity>,
    seasons: Vec<(SeasonRef, Vec<String>)>,
    fail_search: bool,
    fail_show_detail: bool,
    failing_season: Option<u32>,
    calls: Mutex<Vec<CatalogCall>>,
}

impl FakeCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds a search candidate; candidates are returned in insertion order
    pub(crate) fn with_show(mut self, id: u64, name: &str) -> Self {
        self.shows.push(ShowIdentity {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Adds a season of the (single) show
    pub(crate) fn with_season(mut self, season_number: u32, name: &str, episodes: &[&str]) -> Self {
        self.seasons.push((
            SeasonRef {
                season_number,
                name: name.to_string(),
            },
            episodes.iter().map(|e| e.to_string()).collect(),
        ));
        self
    }

    pub(crate) fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub(crate) fn failing_show_detail(mut self) -> Self {
        self.fail_show_detail = true;
        self
    }

    pub(crate) fn failing_season(mut self, season_number: u32) -> Self {
        self.failing_season = Some(season_number);
        self
    }

    pub(crate) fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn server_error(endpoint: String) -> MetadataRetrievalError {
        MetadataRetrievalError::HttpStatus {
            endpoint,
            status: 500,
        }
    }
}

impl EpisodeCatalog for FakeCatalog {
    fn search(&self, query: &SearchQuery) -> Result<Vec<ShowIdentity>, MetadataRetrievalError> {
        self.record(CatalogCall::Search(
            query.title().to_string(),
            query.language().to_string(),
        ));
        if self.fail_search {
            return Err(MetadataRetrievalError::RequestError(
                "connection refused".to_string(),
            ));
        }
        Ok(self.shows.clone())
    }

    fn show_seasons(
        &self,
        show_id: u64,
        _language: &str,
    ) -> Result<Vec<SeasonRef>, MetadataRetrievalError> {
        self.record(CatalogCall::ShowSeasons(show_id));
        if self.fail_show_detail {
            return Err(Self::server_error(format!("tv/{show_id}")));
        }
        Ok(self.seasons.iter().map(|(season, _)| season.clone()).collect())
    }

    fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
        _language: &str,
    ) -> Result<Vec<String>, MetadataRetrievalError> {
        self.record(CatalogCall::SeasonEpisodes(show_id, season_number));
        if self.failing_season == Some(season_number) {
            return Err(Self::server_error(format!(
                "tv/{show_id}/season/{season_number}"
            )));
        }
        Ok(self
            .seasons
            .iter()
            .find(|(season, _)| season.season_number == season_number)
            .map(|(_, episodes)| episodes.clone())
            .unwrap_or_default())
    }
}
