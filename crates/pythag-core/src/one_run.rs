// One-run game breakdown for a single team, by season.
//
// Independent of the fitted model: teams that outperform their Pythagorean
// estimate often do it by winning close games, so this is read alongside
// the residuals.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::GameLogRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OneRunGameRecord {
    pub team: String,
    pub season: u16,
    pub wins: u32,
    pub losses: u32,
    /// "W-L", e.g. "24-19".
    pub record: String,
}

impl OneRunGameRecord {
    fn new(team: &str, season: u16, wins: u32, losses: u32) -> Self {
        OneRunGameRecord {
            team: team.to_string(),
            season,
            wins,
            losses,
            record: format!("{wins}-{losses}"),
        }
    }

    /// Winning percentage in one-run games, if any were played.
    pub fn win_pct(&self) -> Option<f64> {
        let games = self.wins + self.losses;
        (games > 0).then(|| f64::from(self.wins) / f64::from(games))
    }
}

/// Tally `team`'s one-run wins (margin +1) and losses (margin -1) per season.
///
/// Every season the team appears in gets a row, including "0-0" seasons.
/// Rows are ordered by season.
pub fn one_run_records(records: &[GameLogRecord], team: &str) -> Vec<OneRunGameRecord> {
    let mut seasons: BTreeMap<u16, (u32, u32)> = BTreeMap::new();
    for record in records.iter().filter(|r| r.team == team) {
        let tally = seasons.entry(record.season).or_default();
        match record.margin() {
            1 => tally.0 += 1,
            -1 => tally.1 += 1,
            _ => {}
        }
    }

    seasons
        .into_iter()
        .map(|(season, (wins, losses))| OneRunGameRecord::new(team, season, wins, losses))
        .collect()
}
