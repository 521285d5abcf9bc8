/// TMDB API response types for deserialization.
///
/// These structures mirror the parts of the TMDB v3 JSON responses the
/// retrieval pipeline reads. Absent lists deserialize as `None` and are
/// treated as empty by the provider.
use serde::Deserialize;

/// The response from the `search/tv` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSearchResponse {
    /// Matching shows, most relevant first
    pub results: Option<Vec<TmdbShow>>,
}

/// A single candidate show in a search response.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbShow {
    /// TMDB's numeric show id
    pub id: u64,
    /// Localized show name
    pub name: Option<String>,
}

/// The response from the `tv/{id}` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbShowDetail {
    pub seasons: Option<Vec<TmdbSeason>>,
}

/// A season entry on a show detail record.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSeason {
    /// Season number (0 for specials)
    pub season_number: u32,
    pub name: Option<String>,
}

/// The response from the `tv/{id}/season/{n}` endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbSeasonDetail {
    pub episodes: Option<Vec<TmdbEpisode>>,
}

/// A single episode from a season detail response.
#[derive(Debug, Deserialize)]
pub(super) struct TmdbEpisode {
    /// Episode title (may be null for episodes without a title)
    pub name: Option<String>,
}
