use crate::atomic_file::write_atomically;
use crate::episodes::{FetchResult, SeasonSummary};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// File name used when the show name sanitizes to nothing
const FALLBACK_FILE_NAME: &str = "episodes";

/// Errors that can occur while exporting or reading back an episode listing
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("There are no episodes to export")]
    NothingToExport,

    #[error("Line {line_number} is not a season heading: {line}")]
    MalformedLabel { line_number: usize, line: String },
}

/// Sanitizes a string for use in filenames by replacing problematic characters
///
/// Replaces characters that are invalid or problematic in filenames across platforms:
/// - Path separators: / \
/// - Reserved characters: : * ? " < > |
/// - Control characters
/// - Trim leading/trailing whitespace and dots
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    // Trim whitespace and dots from start/end
    sanitized.trim_matches(|c: char| c.is_whitespace() || c == '.').to_string()
}

/// Renders a listing as text
///
/// One block per season: the season heading followed by one episode title per
/// line. Blocks are separated by a blank line and the text ends with a
/// newline. An empty listing renders as an empty string.
pub fn render_text(result: &FetchResult) -> String {
    let mut text = result
        .seasons()
        .iter()
        .map(SeasonSummary::to_string)
        .collect::<Vec<_>>()
        .join("\n\n");

    if !text.is_empty() {
        text.push('\n');
    }
    text
}

/// Reads seasons back from text produced by [`render_text`]
///
/// Runs of blank lines are treated like a single separator. Windows line
/// endings are accepted.
pub fn parse_export(text: &str) -> Result<Vec<SeasonSummary>, ExportError> {
    let mut seasons = Vec::new();
    let mut current: Option<SeasonSummary> = None;

    for (index, line) in text.lines().enumerate() {
        if line.is_empty() {
            seasons.extend(current.take());
            continue;
        }

        match current.as_mut() {
            Some(season) => season.episodes.push(line.to_string()),
            None => {
                let (season_number, name) =
                    SeasonSummary::parse_label(line).ok_or_else(|| ExportError::MalformedLabel {
                        line_number: index + 1,
                        line: line.to_string(),
                    })?;
                current = Some(SeasonSummary {
                    season_number,
                    name,
                    episodes: Vec::new(),
                });
            }
        }
    }
    seasons.extend(current);

    Ok(seasons)
}

/// Determines the file an export to `target` writes
///
/// An existing directory gets a file named after the show inside it; any
/// other path is used as is.
pub fn resolve_export_path(target: &Path, show_name: &str) -> PathBuf {
    if !target.is_dir() {
        return target.to_path_buf();
    }

    let stem = sanitize_filename(show_name);
    let stem = if stem.is_empty() {
        FALLBACK_FILE_NAME
    } else {
        stem.as_str()
    };
    target.join(format!("{stem}.txt"))
}

/// Writes a listing to `target` and returns the path written
///
/// The file is replaced atomically. Exporting an empty listing is refused.
pub fn export_to_file(result: &FetchResult, target: &Path) -> Result<PathBuf, ExportError> {
    if result.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    let show_name = result
        .show()
        .map(|show| show.name.as_str())
        .unwrap_or(FALLBACK_FILE_NAME);
    let path = resolve_export_path(target, show_name);

    info!("Exporting episodes to: {}", path.display());
    write_atomically(&path, &render_text(result))?;
    info!("Export completed successfully");

    Ok(path)
}
