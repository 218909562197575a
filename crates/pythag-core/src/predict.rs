// Win prediction from a fitted exponent, with residuals.

use serde::Serialize;
use tracing::warn;

use crate::error::PythagError;
use crate::estimate::PythagoreanModel;
use crate::season::TeamSeasonSummary;

/// Estimated vs actual wins for one team-season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub team: String,
    pub season: u16,
    pub estimated_win_pct: f64,
    pub estimated_wins: i64,
    pub actual_wins: i64,
    /// `actual_wins - estimated_wins`
    pub residual: i64,
}

/// Pythagorean win percentage `R^k / (R^k + RA^k)`.
///
/// Evaluated as `1 / (1 + (RA/R)^k)`, which depends only on the run ratio.
/// A team that allowed no runs is assigned 1.0; one that scored none, 0.0.
pub fn pythagorean_win_pct(runs: u32, runs_allowed: u32, exponent: f64) -> Option<f64> {
    match (runs, runs_allowed) {
        (0, 0) => None,
        (_, 0) => Some(1.0),
        (0, _) => Some(0.0),
        (r, ra) => Some(1.0 / (1.0 + (f64::from(ra) / f64::from(r)).powf(exponent))),
    }
}

/// Convert a win percentage into a whole-game estimate.
///
/// Rounds half to even, so 67.5 -> 68 and 66.5 -> 66.
pub fn estimate_wins(win_pct: f64, total_games: u32) -> i64 {
    (win_pct * f64::from(total_games)).round_ties_even() as i64
}

/// Predict one team-season using the model's exponent.
pub fn predict(
    model: &PythagoreanModel,
    summary: &TeamSeasonSummary,
) -> Result<PredictionResult, PythagError> {
    predict_with_exponent(model.exponent, summary)
}

/// Predict one team-season with an explicit exponent. The summary does not
/// need defined log-ratios.
pub fn predict_with_exponent(
    exponent: f64,
    summary: &TeamSeasonSummary,
) -> Result<PredictionResult, PythagError> {
    let estimated_win_pct = pythagorean_win_pct(summary.runs, summary.runs_allowed, exponent)
        .ok_or_else(|| PythagError::UndefinedPrediction {
            team: summary.team.clone(),
            season: summary.season,
        })?;
    let estimated_wins = estimate_wins(estimated_win_pct, summary.total_games);
    let actual_wins = i64::from(summary.wins);
    Ok(PredictionResult {
        team: summary.team.clone(),
        season: summary.season,
        estimated_win_pct,
        estimated_wins,
        actual_wins,
        residual: actual_wins - estimated_wins,
    })
}

/// Mean of `|actual - estimated|` over the set, or `None` when it is empty.
pub fn mean_absolute_residual(predictions: &[PredictionResult]) -> Option<f64> {
    if predictions.is_empty() {
        return None;
    }
    let total: i64 = predictions.iter().map(|p| p.residual.abs()).sum();
    Some(total as f64 / predictions.len() as f64)
}

// ---------------------------------------------------------------------------
// Batch prediction
// ---------------------------------------------------------------------------

/// Predictions for many team-seasons. A row that cannot be predicted is
/// recorded in `failures` and does not stop the rest.
#[derive(Debug, Clone, Default)]
pub struct PredictionBatch {
    pub predictions: Vec<PredictionResult>,
    pub failures: Vec<PythagError>,
}

impl PredictionBatch {
    /// Headline error statistic over the successful predictions.
    pub fn mean_abs_residual(&self) -> Option<f64> {
        mean_absolute_residual(&self.predictions)
    }

    /// One team's predictions, ordered by season.
    pub fn for_team(&self, team: &str) -> Vec<&PredictionResult> {
        let mut rows: Vec<&PredictionResult> =
            self.predictions.iter().filter(|p| p.team == team).collect();
        rows.sort_by_key(|p| p.season);
        rows
    }
}

pub fn predict_batch(model: &PythagoreanModel, summaries: &[TeamSeasonSummary]) -> PredictionBatch {
    let mut batch = PredictionBatch::default();
    for summary in summaries {
        match predict(model, summary) {
            Ok(p) => batch.predictions.push(p),
            Err(e) => {
                warn!("skipping prediction: {}", e);
                batch.failures.push(e);
            }
        }
    }
    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::FitDiagnostics;

    fn model(exponent: f64) -> PythagoreanModel {
        PythagoreanModel {
            exponent,
            mean_abs_error: 0.0,
            diagnostics: FitDiagnostics {
                rows_used: 0,
                rows_excluded: 0,
                sum_xx: 0.0,
                sum_xy: 0.0,
                r_squared: 0.0,
                classic_mean_abs_error: 0.0,
            },
            rows: Vec::new(),
        }
    }

    #[test]
    fn white_sox_2018_at_k_1_71() {
        // 706 runs scored, 715 allowed over a 140-game window.
        let summary = TeamSeasonSummary::from_totals("CHW", 2018, 706, 715, 62, 78);
        assert_eq!(summary.total_games, 140);
        let p = predict(&model(1.71), &summary).unwrap();
        assert!((p.estimated_win_pct - 0.494).abs() < 0.001, "got {}", p.estimated_win_pct);
        assert_eq!(p.estimated_wins, 69);
        assert_eq!(p.actual_wins, 62);
        assert_eq!(p.residual, -7);
    }

    #[test]
    fn win_pct_matches_power_form() {
        let k = 1.83;
        let (r, ra) = (750u32, 680u32);
        let direct = f64::from(r).powf(k) / (f64::from(r).powf(k) + f64::from(ra).powf(k));
        let pct = pythagorean_win_pct(r, ra, k).unwrap();
        assert!((pct - direct).abs() < 1e-12);
    }

    #[test]
    fn win_pct_is_scale_consistent() {
        let k = 1.71;
        let base = pythagorean_win_pct(700, 650, k).unwrap();
        for c in [2u32, 3, 10, 1000] {
            let scaled = pythagorean_win_pct(700 * c, 650 * c, k).unwrap();
            assert!((base - scaled).abs() < 1e-12, "scale {c}: {base} vs {scaled}");
        }
    }

    #[test]
    fn zero_run_edges() {
        assert_eq!(pythagorean_win_pct(12, 0, 1.71), Some(1.0));
        assert_eq!(pythagorean_win_pct(0, 12, 1.71), Some(0.0));
        assert_eq!(pythagorean_win_pct(0, 0, 1.71), None);
    }

    #[test]
    fn both_zero_is_undefined_prediction() {
        let summary = TeamSeasonSummary::from_totals("XXX", 2020, 0, 0, 0, 0);
        match predict(&model(2.0), &summary).unwrap_err() {
            PythagError::UndefinedPrediction { team, season } => {
                assert_eq!(team, "XXX");
                assert_eq!(season, 2020);
            }
            other => panic!("expected UndefinedPrediction, got: {other}"),
        }
    }

    #[test]
    fn rows_without_log_ratios_still_predict() {
        // Undefeated: excluded from fitting, but prediction only needs runs.
        let summary = TeamSeasonSummary::from_totals("NYY", 2019, 30, 0, 4, 0);
        assert!(!summary.is_fit_eligible());
        let p = predict(&model(1.71), &summary).unwrap();
        assert_eq!(p.estimated_win_pct, 1.0);
        assert_eq!(p.estimated_wins, 4);
        assert_eq!(p.residual, 0);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(estimate_wins(0.5, 135), 68);
        assert_eq!(estimate_wins(0.5, 133), 66);
        assert_eq!(estimate_wins(0.5, 161), 80);
        assert_eq!(estimate_wins(0.26, 100), 26);
    }

    #[test]
    fn mean_absolute_residual_three_row_fixture() {
        // k = 2, 100 games each:
        //   500/500 -> .500 -> 50 est, 52 actual, residual  2
        //   600/400 -> .692 -> 69 est, 68 actual, residual -1
        //   400/600 -> .308 -> 31 est, 31 actual, residual  0
        // MAE = (2 + 1 + 0) / 3 = 1.0
        let summaries = vec![
            TeamSeasonSummary::from_totals("AAA", 2021, 500, 500, 52, 48),
            TeamSeasonSummary::from_totals("BBB", 2021, 600, 400, 68, 32),
            TeamSeasonSummary::from_totals("CCC", 2021, 400, 600, 31, 69),
        ];
        let batch = predict_batch(&model(2.0), &summaries);
        let residuals: Vec<i64> = batch.predictions.iter().map(|p| p.residual).collect();
        assert_eq!(residuals, vec![2, -1, 0]);
        assert_eq!(batch.mean_abs_residual(), Some(1.0));
    }

    #[test]
    fn mean_absolute_residual_empty_is_none() {
        assert_eq!(mean_absolute_residual(&[]), None);
    }

    #[test]
    fn batch_continues_past_undefined_rows() {
        let summaries = vec![
            TeamSeasonSummary::from_totals("AAA", 2021, 0, 0, 0, 0),
            TeamSeasonSummary::from_totals("BBB", 2021, 600, 400, 68, 32),
        ];
        let batch = predict_batch(&model(2.0), &summaries);
        assert_eq!(batch.predictions.len(), 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.predictions[0].team, "BBB");
    }

    #[test]
    fn for_team_orders_by_season() {
        let summaries = vec![
            TeamSeasonSummary::from_totals("CHW", 2017, 686, 706, 78, 84),
            TeamSeasonSummary::from_totals("BOS", 2016, 878, 694, 97, 65),
            TeamSeasonSummary::from_totals("CHW", 2014, 660, 686, 73, 89),
        ];
        let batch = predict_batch(&model(1.71), &summaries);
        let seasons: Vec<u16> = batch.for_team("CHW").iter().map(|p| p.season).collect();
        assert_eq!(seasons, vec![2014, 2017]);
    }
}
