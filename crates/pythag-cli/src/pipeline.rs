// End-to-end analysis run: ingest -> aggregate -> fit -> predict, plus the
// one-run breakdown for the configured team.

use pythag_core::estimate::{fit_exponent, PythagoreanModel};
use pythag_core::one_run::{one_run_records, OneRunGameRecord};
use pythag_core::predict::{predict_batch, PredictionBatch, PredictionResult};
use pythag_core::record::{ingest, RawGameEntry};
use pythag_core::season::{aggregate, TeamSeasonSummary};
use tracing::{error, info, warn};

use crate::config::Config;

/// Outcome of the exponent fit.
///
/// A failed fit carries no exponent at all, so it can never be mistaken for
/// a fit that merely has a large error.
#[derive(Debug, Clone)]
pub enum FitStatus {
    Fitted {
        model: PythagoreanModel,
        predictions: PredictionBatch,
    },
    Failed {
        reason: String,
    },
}

/// Counts from the ingest stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestCounts {
    pub accepted: usize,
    pub rejected: usize,
    pub filtered: usize,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub team: String,
    pub ingest: IngestCounts,
    pub summaries: Vec<TeamSeasonSummary>,
    pub fit: FitStatus,
    pub one_run: Vec<OneRunGameRecord>,
}

impl PipelineReport {
    pub fn model(&self) -> Option<&PythagoreanModel> {
        match &self.fit {
            FitStatus::Fitted { model, .. } => Some(model),
            FitStatus::Failed { .. } => None,
        }
    }

    pub fn predictions(&self) -> Option<&PredictionBatch> {
        match &self.fit {
            FitStatus::Fitted { predictions, .. } => Some(predictions),
            FitStatus::Failed { .. } => None,
        }
    }

    /// The configured team's predictions, ordered by season. Empty when the
    /// fit failed.
    pub fn team_predictions(&self) -> Vec<&PredictionResult> {
        self.predictions()
            .map(|batch| batch.for_team(&self.team))
            .unwrap_or_default()
    }
}

/// Run the full analysis over raw entries.
///
/// Rejected entries are logged and skipped. A fit failure is captured in
/// `FitStatus::Failed`; the one-run breakdown is produced either way.
pub fn run(entries: &[RawGameEntry], config: &Config) -> PipelineReport {
    let report = ingest(entries, config.fit.max_game_number);
    let counts = IngestCounts {
        accepted: report.records.len(),
        rejected: report.rejected.len(),
        filtered: report.filtered,
    };
    info!(
        "ingested {} games ({} rejected, {} filtered)",
        counts.accepted, counts.rejected, counts.filtered
    );

    let summaries = aggregate(&report.records);
    info!("aggregated {} team-seasons", summaries.len());

    let team = config.analysis.team.trim().to_string();
    let one_run = one_run_records(&report.records, &team);
    if one_run.is_empty() {
        warn!("no game records found for team {}", team);
    }

    let fit = match fit_exponent(&summaries) {
        Ok(model) => {
            let predictions = predict_batch(&model, &summaries);
            FitStatus::Fitted { model, predictions }
        }
        Err(e) => {
            error!("exponent fit failed: {}", e);
            FitStatus::Failed {
                reason: e.to_string(),
            }
        }
    };

    PipelineReport {
        team,
        ingest: counts,
        summaries,
        fit,
        one_run,
    }
}
