/// TMDB metadata provider implementation.
use super::tmdb_types::{TmdbSearchResponse, TmdbSeasonDetail, TmdbShowDetail};
use super::{EpisodeCatalog, MetadataRetrievalError, SearchQuery, SeasonRef, ShowIdentity};
use crate::credentials::Credential;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

/// Base URL of version 3 of the TMDB API
pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Placeholder used for seasons and episodes the provider left untitled
const UNTITLED: &str = "Unknown";

/// Connection settings for the TMDB provider.
#[derive(Debug, Clone)]
pub struct TmdbConfig {
    /// Base URL all endpoint paths are appended to
    pub base_url: String,
    /// Per-request timeout; `None` waits for the transport indefinitely
    pub timeout: Option<Duration>,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            base_url: TMDB_BASE_URL.to_string(),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

/// Metadata provider for the TMDB API.
///
/// Every request is a single authenticated GET carrying the API key and the
/// requested language as query parameters. Nothing is retried or cached.
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    credential: Credential,
}

impl TmdbProvider {
    /// Creates a provider talking to the public TMDB API.
    pub fn new(credential: Credential) -> Result<Self, MetadataRetrievalError> {
        Self::with_config(credential, TmdbConfig::default())
    }

    /// Creates a provider with explicit connection settings.
    pub fn with_config(
        credential: Credential,
        config: TmdbConfig,
    ) -> Result<Self, MetadataRetrievalError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| MetadataRetrievalError::RequestError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// Performs a GET against `path` and decodes the JSON body.
    ///
    /// Error messages never include the request URL, since it carries the
    /// API key.
    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, MetadataRetrievalError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(endpoint = path, ?params, "GET");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.credential.expose())])
            .query(params)
            .send()
            .map_err(|e| {
                let e = e.without_url();
                warn!(endpoint = path, "Network error: {e}");
                MetadataRetrievalError::RequestError(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!(endpoint = path, "API key rejected");
            return Err(MetadataRetrievalError::Unauthorized);
        }

        if !status.is_success() {
            warn!(endpoint = path, status = status.as_u16(), "Request unsuccessful");
            return Err(MetadataRetrievalError::HttpStatus {
                endpoint: path.to_string(),
                status: status.as_u16(),
            });
        }

        response.json().map_err(|e| {
            let e = e.without_url();
            warn!(endpoint = path, "Undecodable response: {e}");
            MetadataRetrievalError::ParseError(e.to_string())
        })
    }

    /// Normalizes a provider name for line-oriented display.
    ///
    /// Line breaks become spaces and a missing or blank name becomes
    /// `Unknown`.
    fn display_name(name: Option<String>) -> String {
        let name = name.unwrap_or_default().replace(['\r', '\n'], " ");
        let trimmed = name.trim();

        if trimmed.is_empty() {
            UNTITLED.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

impl EpisodeCatalog for TmdbProvider {
    fn search(&self, query: &SearchQuery) -> Result<Vec<ShowIdentity>, MetadataRetrievalError> {
        let response: TmdbSearchResponse = self.get_json(
            "search/tv",
            &[("query", query.title()), ("language", query.language())],
        )?;

        Ok(response
            .results
            .unwrap_or_default()
            .into_iter()
            .map(|show| ShowIdentity {
                id: show.id,
                name: Self::display_name(show.name),
            })
            .collect())
    }

    fn show_seasons(
        &self,
        show_id: u64,
        language: &str,
    ) -> Result<Vec<SeasonRef>, MetadataRetrievalError> {
        let detail: TmdbShowDetail =
            self.get_json(&format!("tv/{show_id}"), &[("language", language)])?;

        Ok(detail
            .seasons
            .unwrap_or_default()
            .into_iter()
            .map(|season| SeasonRef {
                season_number: season.season_number,
                name: Self::display_name(season.name),
            })
            .collect())
    }

    fn season_episodes(
        &self,
        show_id: u64,
        season_number: u32,
        language: &str,
    ) -> Result<Vec<String>, MetadataRetrievalError> {
        let detail: TmdbSeasonDetail = self.get_json(
            &format!("tv/{show_id}/season/{season_number}"),
            &[("language", language)],
        )?;

        Ok(detail
            .episodes
            .unwrap_or_default()
            .into_iter()
            .map(|episode| Self::display_name(episode.name))
            .collect())
    }
}
