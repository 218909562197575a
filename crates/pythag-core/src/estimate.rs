// Exponent estimation: zero-intercept least squares on log-ratios.
//
// The Pythagorean form W/L = (R/RA)^k becomes, after taking logs,
//
//     ln(W/L) = k * ln(R/RA)
//
// a one-parameter regression through the origin (equal runs and runs
// allowed means an expected W/L of 1). With x = ln(R/RA), y = ln(W/L):
//
//     k = Σ(x·y) / Σ(x²)

use serde::Serialize;
use tracing::info;

use crate::error::PythagError;
use crate::predict::{mean_absolute_residual, predict_with_exponent};
use crate::season::{fit_eligible, TeamSeasonSummary};

/// Bill James' original exponent, reported alongside the fit for comparison.
pub const CLASSIC_EXPONENT: f64 = 2.0;

/// Below this, Σx² is treated as zero (no run-ratio variance to fit on).
const SUM_SQUARES_EPSILON: f64 = 1e-12;

/// Minimum number of fit-eligible rows.
const MIN_FIT_ROWS: usize = 2;

/// Goodness-of-fit figures for a single fit run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitDiagnostics {
    pub rows_used: usize,
    /// Rows supplied but excluded for undefined log-ratios.
    pub rows_excluded: usize,
    pub sum_xx: f64,
    pub sum_xy: f64,
    /// Uncentered R² of the through-origin regression.
    pub r_squared: f64,
    /// Mean absolute win error on the same rows using `CLASSIC_EXPONENT`.
    pub classic_mean_abs_error: f64,
}

/// Result of one league-wide fit. Immutable once built; refit to update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PythagoreanModel {
    pub exponent: f64,
    /// Mean absolute difference between estimated and actual wins over `rows`.
    pub mean_abs_error: f64,
    pub diagnostics: FitDiagnostics,
    /// The fit-eligible rows the exponent was estimated from.
    #[serde(skip)]
    pub rows: Vec<TeamSeasonSummary>,
}

/// Fit a single league-wide exponent.
///
/// Rows without defined log-ratios are skipped. Fails with `InsufficientData`
/// when fewer than two rows remain or when every remaining row has
/// runs == runs allowed; no fallback exponent is returned in either case.
pub fn fit_exponent(summaries: &[TeamSeasonSummary]) -> Result<PythagoreanModel, PythagError> {
    let rows: Vec<TeamSeasonSummary> = fit_eligible(summaries).into_iter().cloned().collect();
    let rows_excluded = summaries.len() - rows.len();

    if rows.len() < MIN_FIT_ROWS {
        return Err(PythagError::InsufficientData {
            valid_rows: rows.len(),
            reason: format!("at least {MIN_FIT_ROWS} team-seasons with defined log-ratios are required"),
        });
    }

    let (mut sum_xx, mut sum_xy, mut sum_yy) = (0.0, 0.0, 0.0);
    for ratios in rows.iter().filter_map(|r| r.log_ratios) {
        let (x, y) = (ratios.run_ratio, ratios.win_loss);
        sum_xx += x * x;
        sum_xy += x * y;
        sum_yy += y * y;
    }

    if sum_xx < SUM_SQUARES_EPSILON {
        return Err(PythagError::InsufficientData {
            valid_rows: rows.len(),
            reason: "no variance in runs/runs-allowed ratio (every row has R == RA)".into(),
        });
    }

    let exponent = sum_xy / sum_xx;

    // y·y - 2k·x·y + k²·x·x summed, with k = Σxy/Σxx, reduces to Σyy - k·Σxy.
    let residual_ss = (sum_yy - exponent * sum_xy).max(0.0);
    let r_squared = if sum_yy > 0.0 {
        1.0 - residual_ss / sum_yy
    } else {
        1.0
    };

    let mean_abs_error = mean_abs_error_at(exponent, &rows)?;
    let classic_mean_abs_error = mean_abs_error_at(CLASSIC_EXPONENT, &rows)?;

    info!(
        "fitted exponent k = {:.4} on {} team-seasons ({} excluded), MAE {:.3} wins (k = 2: {:.3})",
        exponent,
        rows.len(),
        rows_excluded,
        mean_abs_error,
        classic_mean_abs_error
    );

    Ok(PythagoreanModel {
        exponent,
        mean_abs_error,
        diagnostics: FitDiagnostics {
            rows_used: rows.len(),
            rows_excluded,
            sum_xx,
            sum_xy,
            r_squared,
            classic_mean_abs_error,
        },
        rows,
    })
}

fn mean_abs_error_at(exponent: f64, rows: &[TeamSeasonSummary]) -> Result<f64, PythagError> {
    let predictions = rows
        .iter()
        .map(|row| predict_with_exponent(exponent, row))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(mean_absolute_residual(&predictions).unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Five American League clubs, 2014-2018. The White Sox rows are actual
    /// season totals; the other clubs start from real season totals with some
    /// win-loss records altered.
    fn league() -> Vec<TeamSeasonSummary> {
        let rows: &[(&str, u16, u32, u32, u32, u32)] = &[
            ("CHW", 2014, 660, 686, 73, 89),
            ("CHW", 2015, 676, 716, 76, 86),
            ("CHW", 2016, 686, 748, 78, 84),
            ("CHW", 2017, 686, 706, 78, 84),
            ("CHW", 2018, 706, 715, 62, 73),
            ("BOS", 2014, 634, 715, 73, 89),
            ("BOS", 2015, 748, 753, 81, 81),
            ("BOS", 2016, 878, 694, 97, 65),
            ("BOS", 2017, 785, 668, 92, 70),
            ("BOS", 2018, 876, 647, 102, 60),
            ("HOU", 2014, 629, 723, 71, 91),
            ("HOU", 2015, 729, 618, 92, 70),
            ("HOU", 2016, 724, 701, 83, 79),
            ("HOU", 2017, 896, 700, 98, 64),
            ("HOU", 2018, 797, 534, 108, 54),
            ("KCR", 2014, 651, 624, 84, 78),
            ("KCR", 2015, 724, 641, 89, 73),
            ("KCR", 2016, 675, 712, 77, 85),
            ("KCR", 2017, 702, 791, 73, 89),
            ("KCR", 2018, 638, 833, 63, 99),
            ("SEA", 2014, 634, 554, 90, 72),
            ("SEA", 2015, 656, 726, 74, 88),
            ("SEA", 2016, 768, 707, 87, 75),
            ("SEA", 2017, 750, 772, 79, 83),
            ("SEA", 2018, 677, 711, 78, 84),
        ];
        rows.iter()
            .map(|&(team, season, r, ra, w, l)| TeamSeasonSummary::from_totals(team, season, r, ra, w, l))
            .collect()
    }

    #[test]
    fn league_fit_lands_near_1_71() {
        let model = fit_exponent(&league()).unwrap();
        assert!(
            (model.exponent - 1.71).abs() < 0.1,
            "expected k near 1.71, got {}",
            model.exponent
        );
        assert_eq!(model.diagnostics.rows_used, 25);
        assert_eq!(model.diagnostics.rows_excluded, 0);
        assert_eq!(model.rows.len(), 25);
        assert!(model.diagnostics.r_squared > 0.5 && model.diagnostics.r_squared <= 1.0);
        assert!(model.mean_abs_error >= 0.0);
    }

    #[test]
    fn exponent_matches_closed_form() {
        let rows = league();
        let (mut sxx, mut sxy) = (0.0, 0.0);
        for r in &rows {
            let x = (f64::from(r.runs) / f64::from(r.runs_allowed)).ln();
            let y = (f64::from(r.wins) / f64::from(r.losses)).ln();
            sxx += x * x;
            sxy += x * y;
        }
        let model = fit_exponent(&rows).unwrap();
        assert!((model.exponent - sxy / sxx).abs() < 1e-12);
    }

    #[test]
    fn refit_is_deterministic() {
        let rows = league();
        let first = fit_exponent(&rows).unwrap();
        let second = fit_exponent(&rows).unwrap();
        assert_eq!(first.exponent.to_bits(), second.exponent.to_bits());
        assert_eq!(first, second);
    }

    #[test]
    fn exact_power_law_recovers_exponent() {
        // W/L = (R/RA)^2 exactly: 800/400 -> 4:1, 300/600 -> 1:4.
        let rows = vec![
            TeamSeasonSummary::from_totals("AAA", 2020, 800, 400, 128, 32),
            TeamSeasonSummary::from_totals("BBB", 2020, 300, 600, 32, 128),
        ];
        let model = fit_exponent(&rows).unwrap();
        assert!((model.exponent - 2.0).abs() < 1e-12);
        assert!((model.diagnostics.r_squared - 1.0).abs() < 1e-12);
        assert!(model.mean_abs_error.abs() < 1e-12);
    }

    #[test]
    fn single_valid_row_is_insufficient() {
        let rows = vec![
            TeamSeasonSummary::from_totals("CHW", 2014, 660, 686, 73, 89),
            // undefeated: excluded from the fit
            TeamSeasonSummary::from_totals("NYY", 2014, 50, 10, 10, 0),
        ];
        match fit_exponent(&rows).unwrap_err() {
            PythagError::InsufficientData { valid_rows, .. } => assert_eq!(valid_rows, 1),
            other => panic!("expected InsufficientData, got: {other}"),
        }
    }

    #[test]
    fn empty_input_is_insufficient() {
        assert!(matches!(
            fit_exponent(&[]),
            Err(PythagError::InsufficientData { valid_rows: 0, .. })
        ));
    }

    #[test]
    fn no_run_ratio_variance_is_insufficient() {
        let rows = vec![
            TeamSeasonSummary::from_totals("AAA", 2020, 700, 700, 85, 77),
            TeamSeasonSummary::from_totals("BBB", 2020, 650, 650, 77, 85),
            TeamSeasonSummary::from_totals("CCC", 2020, 600, 600, 81, 81),
        ];
        match fit_exponent(&rows).unwrap_err() {
            PythagError::InsufficientData { valid_rows, reason } => {
                assert_eq!(valid_rows, 3);
                assert!(reason.contains("variance"));
            }
            other => panic!("expected InsufficientData, got: {other}"),
        }
    }

    #[test]
    fn excluded_rows_are_counted() {
        let mut rows = league();
        rows.push(TeamSeasonSummary::from_totals("NYY", 2019, 40, 0, 5, 0));
        let model = fit_exponent(&rows).unwrap();
        assert_eq!(model.diagnostics.rows_used, 25);
        assert_eq!(model.diagnostics.rows_excluded, 1);
    }
}
