//! Game-level market context.

use serde::{Deserialize, Serialize};

/// Immutable market context for one matchup. All lines are optional; the
/// environment model falls back to unadjusted priors when one is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameContext {
    pub home_team: String,
    pub away_team: String,
    /// Over/under line for the game.
    pub total: Option<f64>,
    /// Point spread, positive when the home team is favored.
    pub spread: Option<f64>,
    /// Home moneyline (negative when home is favored). Consulted for the
    /// play-mix nudge only when the spread is absent.
    pub moneyline: Option<f64>,
    /// Market-implied team totals, (home, away).
    pub implied_home_total: Option<f64>,
    pub implied_away_total: Option<f64>,
}

impl GameContext {
    pub fn new(home_team: impl Into<String>, away_team: impl Into<String>) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            total: None,
            spread: None,
            moneyline: None,
            implied_home_total: None,
            implied_away_total: None,
        }
    }

    pub fn with_market(mut self, total: f64, spread: f64) -> Self {
        self.total = Some(total);
        self.spread = Some(spread);
        self
    }

    /// Signed home-favoritism in spread points. Falls back to a fixed
    /// ±3 point equivalent derived from the moneyline sign when no spread
    /// is posted.
    pub fn home_edge(&self) -> Option<f64> {
        if let Some(spread) = self.spread {
            return Some(spread);
        }
        self.moneyline.map(|ml| if ml < 0.0 { 3.0 } else { -3.0 })
    }
}
