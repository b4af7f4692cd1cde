//! Roster entity types.
//!
//! `Position` is a closed set: the scoring rules and sampling strategies are
//! fixed inputs of the engine, not a runtime-extensible rule system.

use serde::{Deserialize, Serialize};

/// Fantasy position category. One sampling strategy per tag, selected once
/// per entity at setup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "QB")]
    Qb,
    #[serde(rename = "RB")]
    Rb,
    #[serde(rename = "WR")]
    Wr,
    #[serde(rename = "TE")]
    Te,
    #[serde(rename = "DST")]
    Dst,
}

impl Position {
    pub const ALL: [Position; 5] = [Position::Qb, Position::Rb, Position::Wr, Position::Te, Position::Dst];

    /// True for categories whose per-opportunity output is right-skewed
    /// enough to warrant log-scale efficiency sampling.
    pub fn high_skew(&self) -> bool {
        matches!(self, Position::Wr | Position::Te | Position::Dst)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Position::Qb => "QB",
            Position::Rb => "RB",
            Position::Wr => "WR",
            Position::Te => "TE",
            Position::Dst => "DST",
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validated roster row. Market and site fields are explicit options;
/// downstream metrics must check them before dividing or comparing, so a
/// missing salary can never silently become a zero-valued metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub position: Position,
    pub team: String,
    pub opponent: String,
    /// Site salary in dollars.
    pub salary: Option<f64>,
    /// Projected roster ownership, percent (0-100).
    pub ownership_pct: Option<f64>,
    /// External reference projection (site FPTS). Required when the entity
    /// has no usable prior.
    pub reference_projection: Option<f64>,
}

impl Entity {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        position: Position,
        team: impl Into<String>,
        opponent: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            team: team.into(),
            opponent: opponent.into(),
            salary: None,
            ownership_pct: None,
            reference_projection: None,
        }
    }

    pub fn with_salary(mut self, salary: f64) -> Self {
        self.salary = Some(salary);
        self
    }

    pub fn with_ownership(mut self, pct: f64) -> Self {
        self.ownership_pct = Some(pct);
        self
    }

    pub fn with_reference(mut self, projection: f64) -> Self {
        self.reference_projection = Some(projection);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_serde_uses_site_codes() {
        let json = serde_json::to_string(&Position::Dst).unwrap();
        assert_eq!(json, "\"DST\"");
        let back: Position = serde_json::from_str("\"WR\"").unwrap();
        assert_eq!(back, Position::Wr);
    }

    #[test]
    fn test_builder_leaves_absent_fields_none() {
        let e = Entity::new("KC_QB_MAHOMES", "Patrick Mahomes", Position::Qb, "KC", "LV");
        assert!(e.salary.is_none());
        assert!(e.ownership_pct.is_none());
        assert!(e.reference_projection.is_none());
    }
}
