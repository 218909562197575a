// Game-log CSV loading.
//
// Reads team schedule-and-results exports (one file per team-season or one
// combined file) into raw entries for the ingestor. Every column is read as
// text, so only structurally broken rows (wrong field count, bad UTF-8) are
// skipped here; value-level checks happen in `pythag_core::record`.

use std::io::Read;
use std::path::Path;

use pythag_core::record::RawGameEntry;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum GameLogError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

fn load_entries_from_reader<R: Read>(rdr: R) -> Result<Vec<RawGameEntry>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(rdr);
    // Without a readable header row no column can be mapped.
    reader.headers()?;
    let mut entries = Vec::new();
    for result in reader.deserialize::<RawGameEntry>() {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!("skipping malformed game log row: {}", e),
        }
    }
    Ok(entries)
}

/// Load raw entries from one CSV file.
pub fn load_game_log(path: &Path) -> Result<Vec<RawGameEntry>, GameLogError> {
    let file = std::fs::File::open(path).map_err(|e| GameLogError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    load_entries_from_reader(file).map_err(|e| GameLogError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Load and concatenate every listed file. Paths are resolved against
/// `base_dir` unless absolute.
pub fn load_all(base_dir: &Path, paths: &[String]) -> Result<Vec<RawGameEntry>, GameLogError> {
    let mut entries = Vec::new();
    for path in paths {
        let resolved = base_dir.join(path);
        let loaded = load_game_log(&resolved)?;
        info!("loaded {} game log rows from {}", loaded.len(), resolved.display());
        entries.extend(loaded);
    }

    if entries.is_empty() {
        return Err(GameLogError::Validation(
            "game log files produced zero rows".into(),
        ));
    }
    Ok(entries)
}
