/// Data structures and traits for TV series metadata retrieval.
///
/// This module provides the request and response records exchanged with a
/// metadata service (search query, show identity, season listing), as well as
/// the trait a metadata provider implements to serve the retrieval pipeline.
mod tmdb;
mod tmdb_types;

pub use tmdb::{TMDB_BASE_URL, TmdbConfig, TmdbProvider};

use thiserror::Error;

/// Errors that can occur during metadata retrieval operations.
#[derive(Debug, Error)]
pub enum MetadataRetrievalError {
    /// Request to the metadata provider failed before a response arrived
    #[error("Request failed: {0}")]
    RequestError(String),

    /// The provider answered with a non-success status code
    #[error("HTTP {status} from {endpoint}")]
    HttpStatus { endpoint: String, status: u16 },

    /// The provider rejected the API key
    #[error("API key was rejected by the metadata service")]
    Unauthorized,

    /// Failed to parse the provider's JSON response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),
}

/// Errors raised when building a search query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Show title must not be empty")]
    EmptyTitle,

    #[error("Language tag must not be empty")]
    EmptyLanguage,
}

/// Language tags offered by the lookup tool, with their display names.
///
/// Any other IETF-style tag is passed through to the provider unchanged.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("zh-CN", "简体中文"),
    ("en-US", "English"),
    ("es-ES", "Español"),
    ("fr-FR", "Français"),
];

/// Language used when the caller does not ask for one.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// A single show lookup: the title to search for and the language the
/// provider should localize its answer into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    title: String,
    language: String,
}

impl SearchQuery {
    /// Builds a query, trimming surrounding whitespace from both parts.
    pub fn new(title: &str, language: &str) -> Result<Self, QueryError> {
        let title = title.trim();
        let language = language.trim();

        if title.is_empty() {
            return Err(QueryError::EmptyTitle);
        }
        if language.is_empty() {
            return Err(QueryError::EmptyLanguage);
        }

        Ok(Self {
            title: title.to_string(),
            language: language.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

/// A show as identified by the metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowIdentity {
    /// The provider's numeric identifier for the show
    pub id: u64,
    /// The show's display name in the requested language
    pub name: String,
}

/// A season as listed on a show's detail record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonRef {
    /// The season number (0 is used for specials)
    pub season_number: u32,
    /// The season's display name
    pub name: String,
}

/// Trait for metadata providers that can serve the episode retrieval pipeline.
///
/// Each method is a single request against the provider. Implementations do
/// not retry and do not cache; a failed request is reported to the caller,
/// which decides what to make of it.
pub trait EpisodeCatalog {
    /// Searches for shows matching the query's title.
    ///
    /// Candidates are returned in the provider's relevance order. An empty
    /// vector means nothing matched and is not an error.
    fn search(&self, query: &SearchQuery) -> Result<Vec<ShowIdentity>, MetadataRetrievalError>;

    /// Lists the seasons of a show in the order the provider returns them.
    fn show_seasons(
        &self,
        show_id: u64,
        language: &str,
    ) -> Result<Vec<SeasonRef>, MetadataRetrievalError>;

    /// Lists the episode titles of one season in the provider's order.
    fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
        language: &str,
    ) -> Result<Vec<String>, MetadataRetrievalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_trims_input() {
        let query = SearchQuery::new("  Breaking Bad ", " en-US").unwrap();
        assert_eq!(query.title(), "Breaking Bad");
        assert_eq!(query.language(), "en-US");
    }

    #[test]
    fn test_search_query_rejects_blank_parts() {
        assert_eq!(SearchQuery::new("   ", "en-US"), Err(QueryError::EmptyTitle));
        assert_eq!(SearchQuery::new("Dark", ""), Err(QueryError::EmptyLanguage));
    }

    #[test]
    fn test_default_language_is_offered() {
        assert!(
            SUPPORTED_LANGUAGES
                .iter()
                .any(|(tag, _)| *tag == DEFAULT_LANGUAGE)
        );
    }
}
