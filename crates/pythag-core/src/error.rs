// Error kinds shared by the ingest, fit, and prediction stages.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PythagError {
    /// A single game entry could not be normalized. Recoverable per record.
    #[error("malformed record (game {game_number} of {team} {season}): {reason}")]
    MalformedRecord {
        team: String,
        season: u16,
        game_number: u32,
        reason: String,
    },

    /// The regression cannot be solved. Fatal to the whole fit.
    #[error("insufficient data for exponent fit ({valid_rows} valid rows): {reason}")]
    InsufficientData { valid_rows: usize, reason: String },

    /// Both runs and runs allowed are zero. Fatal to one prediction only.
    #[error("undefined prediction for {team} {season}: no runs scored or allowed")]
    UndefinedPrediction { team: String, season: u16 },
}
