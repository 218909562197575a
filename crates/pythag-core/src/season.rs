// Season aggregation: one summary row per (team, season).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::{GameLogRecord, Outcome};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Natural-log ratios used as regression input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LogRatios {
    /// `ln(wins / losses)`
    pub win_loss: f64,
    /// `ln(runs / runs_allowed)`
    pub run_ratio: f64,
}

/// Season totals for one team.
///
/// `log_ratios` doubles as the fit-validity tag: it is `None` when either
/// ratio is undefined (a zero numerator or denominator), and such rows are
/// kept for display but excluded from the exponent fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSeasonSummary {
    pub team: String,
    pub season: u16,
    pub runs: u32,
    pub runs_allowed: u32,
    pub wins: u32,
    pub losses: u32,
    pub total_games: u32,
    pub win_pct: f64,
    pub log_ratios: Option<LogRatios>,
}

impl TeamSeasonSummary {
    /// Build a summary from season totals, deriving games, win pct, and the
    /// log-ratios.
    pub fn from_totals(
        team: impl Into<String>,
        season: u16,
        runs: u32,
        runs_allowed: u32,
        wins: u32,
        losses: u32,
    ) -> Self {
        let total_games = wins + losses;
        let win_pct = if total_games == 0 {
            0.0
        } else {
            f64::from(wins) / f64::from(total_games)
        };
        TeamSeasonSummary {
            team: team.into(),
            season,
            runs,
            runs_allowed,
            wins,
            losses,
            total_games,
            win_pct,
            log_ratios: log_ratios(runs, runs_allowed, wins, losses),
        }
    }

    /// Whether this row can be used as regression input.
    pub fn is_fit_eligible(&self) -> bool {
        self.log_ratios.is_some()
    }
}

fn log_ratios(runs: u32, runs_allowed: u32, wins: u32, losses: u32) -> Option<LogRatios> {
    if runs == 0 || runs_allowed == 0 || wins == 0 || losses == 0 {
        return None;
    }
    let win_loss = (f64::from(wins) / f64::from(losses)).ln();
    let run_ratio = (f64::from(runs) / f64::from(runs_allowed)).ln();
    (win_loss.is_finite() && run_ratio.is_finite()).then_some(LogRatios {
        win_loss,
        run_ratio,
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Running totals for one (team, season). Sums saturate at `u32::MAX`
/// rather than overflow.
#[derive(Default)]
struct SeasonTotals {
    runs: u32,
    runs_allowed: u32,
    wins: u32,
    losses: u32,
}

impl SeasonTotals {
    fn add(&mut self, record: &GameLogRecord) {
        self.runs = self.runs.saturating_add(record.runs);
        self.runs_allowed = self.runs_allowed.saturating_add(record.runs_allowed);
        match record.outcome {
            Outcome::Win => self.wins = self.wins.saturating_add(1),
            Outcome::Loss => self.losses = self.losses.saturating_add(1),
        }
    }
}

/// Group records by (team, season) and total them.
///
/// Output is ordered by team, then season.
pub fn aggregate(records: &[GameLogRecord]) -> Vec<TeamSeasonSummary> {
    let mut groups: BTreeMap<(&str, u16), SeasonTotals> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.team.as_str(), record.season))
            .or_default()
            .add(record);
    }

    groups
        .into_iter()
        .map(|((team, season), t)| {
            TeamSeasonSummary::from_totals(team, season, t.runs, t.runs_allowed, t.wins, t.losses)
        })
        .collect()
}

/// Rows usable as regression input.
pub fn fit_eligible(summaries: &[TeamSeasonSummary]) -> Vec<&TeamSeasonSummary> {
    summaries.iter().filter(|s| s.is_fit_eligible()).collect()
}
