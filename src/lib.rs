//! Episode Lister - Look up every episode title of a tv series
//!
//! This library provides the retrieval pipeline behind the `episode_lister`
//! tool: it searches TMDB for a show, lists its seasons, collects the episode
//! titles of each season, and renders or exports the result as text. Lookups
//! run on background threads and report progress and their outcome back to
//! the thread that started them over channels.

mod atomic_file;
mod credentials;
mod episodes;
mod export;
mod metadata_retrieval;
mod runner;

#[cfg(test)]
mod test_support;

// Re-export error types
pub use credentials::CredentialError;
pub use export::ExportError;
pub use metadata_retrieval::{MetadataRetrievalError, QueryError};

// Re-export retrieval types
pub use metadata_retrieval::{
    DEFAULT_LANGUAGE, EpisodeCatalog, SUPPORTED_LANGUAGES, SearchQuery, SeasonRef, ShowIdentity,
    TMDB_BASE_URL, TmdbConfig, TmdbProvider,
};

pub use credentials::{
    Credential, CredentialPrompt, CredentialStore, KEY_FILE_NAME, TerminalPrompt,
};
pub use episodes::{
    FetchResult, ProgressEvent, SeasonSummary, fetch_all_episodes, try_fetch_all_episodes,
};
pub use export::{export_to_file, parse_export, render_text, resolve_export_path, sanitize_filename};
pub use runner::{FetchHandle, FetchId, FetchOutcome, FetchRunner, FetchState};

use thiserror::Error;

/// Top-level error type for Episode Lister operations
#[derive(Debug, Error)]
pub enum EpisodeListerError {
    /// The show title or language was unusable
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    /// Error during metadata retrieval
    #[error("Metadata retrieval error: {0}")]
    MetadataRetrieval(#[from] MetadataRetrievalError),

    /// Error while locating or storing the API key
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    /// Error while exporting the episode listing
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}
