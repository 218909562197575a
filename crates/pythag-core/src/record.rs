// Game log ingestion: normalizes raw per-game entries into `GameLogRecord`s.
//
// Raw entries follow the baseball-reference team schedule shape (one row
// per game from one team's perspective). Runs columns arrive as text and
// are coerced here.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PythagError;

/// Highest in-season game number kept. Rows past the 162-game schedule are
/// upstream artifacts (phantom or duplicated makeup games) and are dropped.
pub const MAX_GAME_NUMBER: u32 = 162;

/// Innings in a regulation game.
const REGULATION_INNINGS: u8 = 9;

/// Largest run value accepted for a single game.
const MAX_GAME_RUNS: u32 = u16::MAX as u32;

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// One game-result entry as supplied by the external game-log provider.
///
/// Field names map to the provider's column headers; snake_case aliases are
/// accepted for hand-written fixtures. Every column is kept as text so that a
/// bad value is rejected per record by `normalize_entry` instead of being
/// lost at the CSV layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGameEntry {
    #[serde(rename = "Gm#", alias = "game_number")]
    pub game_number: String,
    #[serde(rename = "Date", alias = "date", default)]
    pub date: String,
    #[serde(rename = "Tm", alias = "team")]
    pub team: String,
    #[serde(rename = "Home_Away", alias = "home_away", default)]
    pub home_away: String,
    #[serde(rename = "Opp", alias = "opponent", default)]
    pub opponent: String,
    #[serde(rename = "W/L", alias = "result")]
    pub result: String,
    #[serde(rename = "R", alias = "runs", default)]
    pub runs: String,
    #[serde(rename = "RA", alias = "runs_allowed", default)]
    pub runs_allowed: String,
    #[serde(rename = "Inn", alias = "innings", default)]
    pub innings: String,
    #[serde(rename = "W-L", alias = "record", default)]
    pub record: String,
    #[serde(rename = "GB", alias = "games_behind", default)]
    pub games_behind: String,
    #[serde(rename = "Year", alias = "season")]
    pub season: String,
}

// ---------------------------------------------------------------------------
// Normalized record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Loss,
}

/// One game from one team's perspective, after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameLogRecord {
    pub team: String,
    pub season: u16,
    pub game_number: u32,
    pub runs: u32,
    pub runs_allowed: u32,
    pub outcome: Outcome,
    pub date: Option<NaiveDate>,
    pub home: bool,
    pub opponent: String,
    pub walk_off: bool,
    /// Set only when the game went past regulation.
    pub extra_innings: Option<u8>,
}

impl GameLogRecord {
    /// Run margin from this team's perspective (`runs - runs_allowed`).
    pub fn margin(&self) -> i64 {
        i64::from(self.runs) - i64::from(self.runs_allowed)
    }
}

/// Result of ingesting a batch of raw entries.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Normalized records, in input order.
    pub records: Vec<GameLogRecord>,
    /// Entries that failed normalization, keyed by their input index.
    pub rejected: Vec<(usize, PythagError)>,
    /// Entries dropped silently (past the schedule, or not yet played).
    pub filtered: usize,
}

impl IngestReport {
    /// Abort on the first rejected entry instead of skipping it.
    pub fn into_strict(self) -> Result<Vec<GameLogRecord>, PythagError> {
        match self.rejected.into_iter().next() {
            Some((_, err)) => Err(err),
            None => Ok(self.records),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize a single raw entry.
///
/// Returns `Ok(None)` for rows that are filtered silently: game numbers past
/// `max_game_number`, and games with no runs recorded (not yet played).
/// A season or game number that cannot be read is reported as 0 in the
/// resulting `MalformedRecord`.
pub fn normalize_entry(
    raw: &RawGameEntry,
    max_game_number: u32,
) -> Result<Option<GameLogRecord>, PythagError> {
    let team = raw.team.trim();
    let parsed_season = raw.season.trim().parse::<u16>().ok();
    let parsed_game = raw.game_number.trim().parse::<u32>().ok();
    let malformed = |reason: String| PythagError::MalformedRecord {
        team: team.to_string(),
        season: parsed_season.unwrap_or(0),
        game_number: parsed_game.unwrap_or(0),
        reason,
    };

    if team.is_empty() {
        return Err(malformed("missing team identifier".into()));
    }
    let Some(season) = parsed_season else {
        return Err(malformed(format!("season '{}' is not a year", raw.season.trim())));
    };
    let game_number = match parsed_game {
        Some(0) => return Err(malformed("game number must start at 1".into())),
        Some(n) => n,
        None => {
            return Err(malformed(format!(
                "game number '{}' is not a whole number",
                raw.game_number.trim()
            )))
        }
    };
    if game_number > max_game_number {
        debug!(
            "dropping {} {} game {}: past the {}-game schedule",
            team, season, game_number, max_game_number
        );
        return Ok(None);
    }

    let runs = coerce_runs(&raw.runs).map_err(|e| malformed(format!("runs: {e}")))?;
    let runs_allowed =
        coerce_runs(&raw.runs_allowed).map_err(|e| malformed(format!("runs allowed: {e}")))?;
    let (Some(runs), Some(runs_allowed)) = (runs, runs_allowed) else {
        debug!("dropping {} {} game {}: no score recorded", team, season, game_number);
        return Ok(None);
    };

    let result = raw.result.trim();
    let outcome = match result.chars().next() {
        Some('W') => Outcome::Win,
        Some('L') => Outcome::Loss,
        _ => return Err(malformed(format!("unrecognized result marker '{result}'"))),
    };

    Ok(Some(GameLogRecord {
        team: team.to_string(),
        season,
        game_number,
        runs,
        runs_allowed,
        outcome,
        date: parse_game_date(&raw.date, season),
        home: !is_away_marker(&raw.home_away),
        opponent: raw.opponent.trim().to_string(),
        walk_off: result.ends_with("-wo"),
        extra_innings: raw
            .innings
            .trim()
            .parse::<u8>()
            .ok()
            .filter(|&inn| inn > REGULATION_INNINGS),
    }))
}

/// Normalize a batch of raw entries. Rejections are collected, not fatal.
pub fn ingest(entries: &[RawGameEntry], max_game_number: u32) -> IngestReport {
    let mut report = IngestReport::default();
    for (index, raw) in entries.iter().enumerate() {
        match normalize_entry(raw, max_game_number) {
            Ok(Some(record)) => report.records.push(record),
            Ok(None) => report.filtered += 1,
            Err(e) => {
                warn!("rejecting game log entry {}: {}", index, e);
                report.rejected.push((index, e));
            }
        }
    }
    report
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Coerce a runs column to a whole number.
///
/// `Ok(None)` means the value is missing. Integral floats ("5.0") are accepted
/// since some exports write every numeric column as float. Values above
/// `MAX_GAME_RUNS` are rejected so season totals cannot overflow.
fn coerce_runs(text: &str) -> Result<Option<u32>, String> {
    let text = text.trim();
    if text.is_empty() || text == "-" || text.eq_ignore_ascii_case("nan") || text == "NA" {
        return Ok(None);
    }
    let value: f64 = text
        .parse()
        .map_err(|_| format!("'{text}' is not numeric"))?;
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
        return Err(format!("'{text}' is not a valid run total"));
    }
    if value > f64::from(MAX_GAME_RUNS) {
        return Err(format!("'{text}' is not a plausible single-game run total"));
    }
    Ok(Some(value as u32))
}

fn is_away_marker(text: &str) -> bool {
    let text = text.trim();
    text == "@" || text.eq_ignore_ascii_case("away")
}

/// Parse the provider's date column.
///
/// Accepts ISO dates and the schedule form "Sunday, Apr 3" (optionally with a
/// doubleheader suffix such as " (1)"), which omits the year.
fn parse_game_date(text: &str, season: u16) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    let day = text.split_once(", ").map_or(text, |(_, rest)| rest);
    let day = day.split(" (").next().unwrap_or(day).trim();
    NaiveDate::parse_from_str(&format!("{day} {season}"), "%b %d %Y").ok()
}
