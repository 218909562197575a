// Export of analysis tables (CSV) and the fit result (JSON).
//
// Files are flat tables meant for spreadsheets or a charting step; nothing
// here is read back.

use std::fs::File;
use std::path::{Path, PathBuf};

use pythag_core::estimate::PythagoreanModel;
use pythag_core::season::TeamSeasonSummary;
use serde::Serialize;
use tracing::info;

use crate::pipeline::{FitStatus, PipelineReport};

pub const SUMMARIES_FILE: &str = "summaries.csv";
pub const PREDICTIONS_FILE: &str = "predictions.csv";
pub const ONE_RUN_FILE: &str = "one_run.csv";
pub const FIT_FILE: &str = "fit.json";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error writing {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("JSON error writing {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Summary row with the validity tag spread into flat columns.
#[derive(Serialize)]
struct SummaryRow<'a> {
    team: &'a str,
    season: u16,
    runs: u32,
    runs_allowed: u32,
    wins: u32,
    losses: u32,
    total_games: u32,
    win_pct: f64,
    log_win_loss: Option<f64>,
    log_run_ratio: Option<f64>,
    fit_eligible: bool,
}

impl<'a> From<&'a TeamSeasonSummary> for SummaryRow<'a> {
    fn from(s: &'a TeamSeasonSummary) -> Self {
        SummaryRow {
            team: &s.team,
            season: s.season,
            runs: s.runs,
            runs_allowed: s.runs_allowed,
            wins: s.wins,
            losses: s.losses,
            total_games: s.total_games,
            win_pct: s.win_pct,
            log_win_loss: s.log_ratios.map(|r| r.win_loss),
            log_run_ratio: s.log_ratios.map(|r| r.run_ratio),
            fit_eligible: s.is_fit_eligible(),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum FitRecord<'a> {
    Fitted {
        team: &'a str,
        model: &'a PythagoreanModel,
        prediction_mean_abs_residual: Option<f64>,
        prediction_failures: usize,
    },
    Failed {
        team: &'a str,
        reason: &'a str,
    },
}

fn write_csv<T: Serialize>(
    path: &Path,
    rows: impl IntoIterator<Item = T>,
) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        writer.serialize(row).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_summaries_csv(path: &Path, summaries: &[TeamSeasonSummary]) -> Result<(), ExportError> {
    write_csv(path, summaries.iter().map(SummaryRow::from))
}

fn write_fit_json(path: &Path, report: &PipelineReport) -> Result<(), ExportError> {
    let record = match &report.fit {
        FitStatus::Fitted { model, predictions } => FitRecord::Fitted {
            team: &report.team,
            model,
            prediction_mean_abs_residual: predictions.mean_abs_residual(),
            prediction_failures: predictions.failures.len(),
        },
        FitStatus::Failed { reason } => FitRecord::Failed {
            team: &report.team,
            reason,
        },
    };
    let file = File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(file, &record).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write every table for a report into `dir`, creating it if needed.
/// `predictions.csv` is only written when the fit succeeded.
pub fn write_report(dir: &Path, report: &PipelineReport) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();

    let summaries_path = dir.join(SUMMARIES_FILE);
    write_summaries_csv(&summaries_path, &report.summaries)?;
    written.push(summaries_path);

    if let Some(batch) = report.predictions() {
        let path = dir.join(PREDICTIONS_FILE);
        write_csv(&path, &batch.predictions)?;
        written.push(path);
    }

    let one_run_path = dir.join(ONE_RUN_FILE);
    write_csv(&one_run_path, &report.one_run)?;
    written.push(one_run_path);

    let fit_path = dir.join(FIT_FILE);
    write_fit_json(&fit_path, report)?;
    written.push(fit_path);

    info!("wrote {} files to {}", written.len(), dir.display());
    Ok(written)
}
