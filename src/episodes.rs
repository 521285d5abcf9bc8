//! Episode aggregation module
//!
//! This module runs the dependent lookup chain for one show: search for the
//! title, take the first match, list its seasons, then fetch the episode
//! titles of every season in the order the provider lists them.

use crate::metadata_retrieval::{EpisodeCatalog, MetadataRetrievalError, SearchQuery, ShowIdentity};
use std::fmt;
use tracing::{error, info};

/// Separator between season number and season name in a season label
const LABEL_SEPARATOR: &str = " — ";

/// The episode titles of one season
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonSummary {
    /// The season number (0 is used for specials)
    pub season_number: u32,
    /// The season's display name
    pub name: String,
    /// Episode titles in the provider's order
    pub episodes: Vec<String>,
}

impl SeasonSummary {
    /// The heading line of this season, e.g. `Season 1 — Season 1:`
    pub fn label(&self) -> String {
        format!("Season {}{}{}:", self.season_number, LABEL_SEPARATOR, self.name)
    }

    /// Splits a heading line back into season number and name
    pub(crate) fn parse_label(line: &str) -> Option<(u32, String)> {
        let rest = line.strip_prefix("Season ")?;
        let (number, name) = rest.split_once(LABEL_SEPARATOR)?;
        let name = name.strip_suffix(':')?;

        Some((number.parse().ok()?, name.to_string()))
    }
}

impl fmt::Display for SeasonSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        for episode in &self.episodes {
            write!(f, "\n{episode}")?;
        }
        Ok(())
    }
}

/// Everything one lookup produced for one show
///
/// Either every season of the show was retrieved, or the result is empty.
/// A new lookup replaces a result; results are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    show: Option<ShowIdentity>,
    seasons: Vec<SeasonSummary>,
}

impl FetchResult {
    /// A result with no show and no seasons
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(show: ShowIdentity, seasons: Vec<SeasonSummary>) -> Self {
        Self {
            show: Some(show),
            seasons,
        }
    }

    /// The show the seasons belong to, if one was found
    pub fn show(&self) -> Option<&ShowIdentity> {
        self.show.as_ref()
    }

    pub fn seasons(&self) -> &[SeasonSummary] {
        &self.seasons
    }

    /// True when there are no seasons to show or export
    pub fn is_empty(&self) -> bool {
        self.seasons.is_empty()
    }

    /// Total number of episodes across all seasons
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

/// Progress event emitted while a lookup runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Searching for the show title
    Searching { title: String, language: String },

    /// The search matched nothing; the lookup ends here
    NoMatch { title: String },

    /// The first search candidate was picked
    ShowFound { show: ShowIdentity },

    /// The show's seasons were listed
    SeasonsListed { count: usize },

    /// Fetching the episodes of one season
    FetchingSeason {
        index: usize,
        total: usize,
        season_number: u32,
    },

    /// The episodes of one season arrived
    SeasonFetched {
        season_number: u32,
        episode_count: usize,
    },

    /// Lookup complete
    Complete {
        season_count: usize,
        episode_count: usize,
    },
}

/// Looks up all episodes of a show, reporting progress along the way
///
/// The first search candidate is taken as the show. Seasons are returned in
/// the order the show's detail record lists them, each with its episodes in
/// the provider's order.
///
/// A search without candidates is a normal outcome and yields an empty
/// result. Any failed request ends the lookup with that error; seasons
/// fetched before the failure are discarded.
pub fn try_fetch_all_episodes<C, F>(
    catalog: &C,
    query: &SearchQuery,
    mut progress_callback: F,
) -> Result<FetchResult, MetadataRetrievalError>
where
    C: EpisodeCatalog + ?Sized,
    F: FnMut(ProgressEvent),
{
    info!(
        "Searching for show: {} in language: {}",
        query.title(),
        query.language()
    );
    progress_callback(ProgressEvent::Searching {
        title: query.title().to_string(),
        language: query.language().to_string(),
    });

    let Some(show) = catalog.search(query)?.into_iter().next() else {
        info!("No results found for: {}", query.title());
        progress_callback(ProgressEvent::NoMatch {
            title: query.title().to_string(),
        });
        return Ok(FetchResult::empty());
    };

    info!("Found show: {} (ID: {})", show.name, show.id);
    progress_callback(ProgressEvent::ShowFound { show: show.clone() });

    let season_refs = catalog.show_seasons(show.id, query.language())?;
    let total = season_refs.len();
    info!("Found {total} seasons for show ID: {}", show.id);
    progress_callback(ProgressEvent::SeasonsListed { count: total });

    let mut seasons = Vec::with_capacity(total);
    for (index, season_ref) in season_refs.into_iter().enumerate() {
        progress_callback(ProgressEvent::FetchingSeason {
            index,
            total,
            season_number: season_ref.season_number,
        });

        let episodes =
            catalog.season_episodes(show.id, season_ref.season_number, query.language())?;
        progress_callback(ProgressEvent::SeasonFetched {
            season_number: season_ref.season_number,
            episode_count: episodes.len(),
        });

        seasons.push(SeasonSummary {
            season_number: season_ref.season_number,
            name: season_ref.name,
            episodes,
        });
    }

    let result = FetchResult::new(show, seasons);
    progress_callback(ProgressEvent::Complete {
        season_count: result.seasons().len(),
        episode_count: result.episode_count(),
    });

    Ok(result)
}

/// Looks up all episodes of a show; never fails
///
/// Errors are logged and turned into an empty result, see
/// [`try_fetch_all_episodes`].
pub fn fetch_all_episodes<C>(catalog: &C, query: &SearchQuery) -> FetchResult
where
    C: EpisodeCatalog + ?Sized,
{
    try_fetch_all_episodes(catalog, query, |_| {}).unwrap_or_else(|e| {
        error!("Lookup of '{}' failed, discarding results: {e}", query.title());
        FetchResult::empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CatalogCall, FakeCatalog};

    fn query(title: &str) -> SearchQuery {
        SearchQuery::new(title, "en-US").unwrap()
    }

    #[test]
    fn test_breaking_bad_scenario() {
        let catalog = FakeCatalog::new()
            .with_show(1396, "Breaking Bad")
            .with_season(1, "Season 1", &["Pilot", "Cat's in the Bag..."]);

        let result = fetch_all_episodes(&catalog, &query("Breaking Bad"));

        assert_eq!(result.show().map(|s| s.id), Some(1396));
        assert_eq!(
            result.seasons(),
            &[SeasonSummary {
                season_number: 1,
                name: "Season 1".to_string(),
                episodes: vec!["Pilot".to_string(), "Cat's in the Bag...".to_string()],
            }]
        );
        assert_eq!(
            catalog.calls(),
            vec![
                CatalogCall::Search("Breaking Bad".to_string(), "en-US".to_string()),
                CatalogCall::ShowSeasons(1396),
                CatalogCall::SeasonEpisodes(1396, 1),
            ]
        );
    }

    #[test]
    fn test_no_match_stops_after_search() {
        let catalog = FakeCatalog::new();

        let result = fetch_all_episodes(&catalog, &query("NoSuchShow123"));

        assert!(result.is_empty());
        assert!(result.show().is_none());
        assert_eq!(
            catalog.calls(),
            vec![CatalogCall::Search(
                "NoSuchShow123".to_string(),
                "en-US".to_string()
            )]
        );
    }

    #[test]
    fn test_only_first_candidate_is_used() {
        let catalog = FakeCatalog::new()
            .with_show(1, "Dark")
            .with_show(2, "Dark Matter")
            .with_season(1, "Season 1", &["Secrets"]);

        let result = fetch_all_episodes(&catalog, &query("Dark"));

        assert_eq!(result.show().map(|s| s.name.as_str()), Some("Dark"));
        assert!(!catalog.calls().contains(&CatalogCall::ShowSeasons(2)));
    }

    #[test]
    fn test_seasons_and_episodes_keep_provider_order() {
        let catalog = FakeCatalog::new()
            .with_show(7, "Show")
            .with_season(0, "Specials", &["Behind the Scenes"])
            .with_season(2, "Second", &["C", "A", "B"])
            .with_season(1, "First", &["Z", "Y"]);

        let result = fetch_all_episodes(&catalog, &query("Show"));

        let numbers: Vec<u32> = result.seasons().iter().map(|s| s.season_number).collect();
        assert_eq!(numbers, vec![0, 2, 1]);
        let counts: Vec<usize> = result.seasons().iter().map(|s| s.episodes.len()).collect();
        assert_eq!(counts, vec![1, 3, 2]);
        assert_eq!(result.seasons()[1].episodes, vec!["C", "A", "B"]);
        assert_eq!(result.episode_count(), 6);
    }

    #[test]
    fn test_show_without_seasons_is_empty() {
        let catalog = FakeCatalog::new().with_show(9, "Pilot Only");

        let result = fetch_all_episodes(&catalog, &query("Pilot Only"));

        assert!(result.is_empty());
        assert_eq!(result.show().map(|s| s.id), Some(9));
    }

    #[test]
    fn test_search_failure_yields_empty_result() {
        let catalog = FakeCatalog::new().with_show(1, "Dark").failing_search();

        assert!(fetch_all_episodes(&catalog, &query("Dark")).is_empty());
        assert_eq!(catalog.calls().len(), 1);
    }

    #[test]
    fn test_show_detail_failure_yields_empty_result() {
        let catalog = FakeCatalog::new()
            .with_show(1, "Dark")
            .with_season(1, "Season 1", &["Secrets"])
            .failing_show_detail();

        assert!(fetch_all_episodes(&catalog, &query("Dark")).is_empty());
        assert_eq!(catalog.calls().len(), 2);
    }

    // A failed season request discards the seasons fetched before it and
    // skips the remaining ones.
    #[test]
    fn test_season_failure_discards_everything() {
        let catalog = FakeCatalog::new()
            .with_show(1, "Dark")
            .with_season(1, "Season 1", &["Secrets", "Lies"])
            .with_season(2, "Season 2", &["Beginnings and Endings"])
            .with_season(3, "Season 3", &["Deja-vu"])
            .failing_season(2);

        let err = try_fetch_all_episodes(&catalog, &query("Dark"), |_| {}).unwrap_err();
        assert!(matches!(err, MetadataRetrievalError::HttpStatus { status: 500, .. }));

        assert!(fetch_all_episodes(&catalog, &query("Dark")).is_empty());
        assert!(!catalog.calls().contains(&CatalogCall::SeasonEpisodes(1, 3)));
    }

    #[test]
    fn test_progress_events_in_order() {
        let catalog = FakeCatalog::new()
            .with_show(1396, "Breaking Bad")
            .with_season(1, "Season 1", &["Pilot", "Cat's in the Bag..."]);
        let mut events = Vec::new();

        try_fetch_all_episodes(&catalog, &query("Breaking Bad"), |e| events.push(e)).unwrap();

        assert_eq!(
            events,
            vec![
                ProgressEvent::Searching {
                    title: "Breaking Bad".to_string(),
                    language: "en-US".to_string()
                },
                ProgressEvent::ShowFound {
                    show: ShowIdentity {
                        id: 1396,
                        name: "Breaking Bad".to_string()
                    }
                },
                ProgressEvent::SeasonsListed { count: 1 },
                ProgressEvent::FetchingSeason {
                    index: 0,
                    total: 1,
                    season_number: 1
                },
                ProgressEvent::SeasonFetched {
                    season_number: 1,
                    episode_count: 2
                },
                ProgressEvent::Complete {
                    season_count: 1,
                    episode_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_label_round_trip() {
        let season = SeasonSummary {
            season_number: 12,
            name: "Part 2: The Return:".to_string(),
            episodes: vec![],
        };

        assert_eq!(season.label(), "Season 12 — Part 2: The Return::");
        assert_eq!(
            SeasonSummary::parse_label(&season.label()),
            Some((12, "Part 2: The Return:".to_string()))
        );
    }

    #[test]
    fn test_parse_label_rejects_other_lines() {
        assert_eq!(SeasonSummary::parse_label("Pilot"), None);
        assert_eq!(SeasonSummary::parse_label("Season one — Pilot:"), None);
        assert_eq!(SeasonSummary::parse_label("Season 1 — Pilot"), None);
    }

    #[test]
    fn test_display_lists_episodes_under_label() {
        let season = SeasonSummary {
            season_number: 1,
            name: "Season 1".to_string(),
            episodes: vec!["Pilot".to_string(), "Cat's in the Bag...".to_string()],
        };

        assert_eq!(
            season.to_string(),
            "Season 1 — Season 1:\nPilot\nCat's in the Bag..."
        );
    }
}
