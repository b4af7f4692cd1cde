//! Shared-latent-factor correlation model.
//!
//! Cross-entity dependence is injected through a small number of standard
//! normal factors drawn once per trial: one per game (entering home-side
//! blends positively and away-side blends negatively, so the effect is
//! zero-sum by construction) and one per team offense (driving the passer
//! and pass-catchers together, and the backfield against them).
//!
//! Each sampled usage/efficiency value is then a blend
//! `own * (1 - |w|) + transform(signed_factor) * |w|`, where the transform
//! maps the factor into the draw's own distribution scale and `w` is the
//! configured strength for the relationship type. Sign is carried by the
//! direction of the transform, never fitted after the fact. Work per trial
//! is O(entities); there is no pairwise covariance matrix to keep positive
//! semi-definite as the slate grows.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError, Stage};
use crate::models::Position;

/// Correlation strength per relationship type. Values are signed blend
/// weights in (-1, 1).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CorrelationWeights {
    /// Passer and same-team pass-catchers move together.
    pub passer_receiver: f64,
    /// Ball-carrier role moves against the team's passing game.
    pub backfield_vs_passing: f64,
    /// Opposing rosters move apart through the shared game factor.
    pub opposing_team: f64,
}

impl Default for CorrelationWeights {
    fn default() -> Self {
        Self { passer_receiver: 0.35, backfield_vs_passing: -0.25, opposing_team: -0.20 }
    }
}

impl CorrelationWeights {
    pub fn validate(&self) -> Result<()> {
        for (name, w) in [
            ("passer_receiver", self.passer_receiver),
            ("backfield_vs_passing", self.backfield_vs_passing),
            ("opposing_team", self.opposing_team),
        ] {
            if !w.is_finite() || w.abs() >= 1.0 {
                return Err(SimError::validation(
                    Stage::ConfigValidation,
                    name,
                    "correlation weight must lie in (-1, 1)",
                ));
            }
        }
        Ok(())
    }

    /// Blend weight against the team-offense factor for one position tag.
    /// DST output is driven by the opposing offense, which is already
    /// captured through the game factor, so it carries no offense weight.
    pub fn offense_weight(&self, position: Position) -> f64 {
        match position {
            Position::Qb | Position::Wr | Position::Te => self.passer_receiver,
            Position::Rb => self.backfield_vs_passing,
            Position::Dst => 0.0,
        }
    }
}

/// Per-trial factor draws for one team side.
#[derive(Debug, Clone, Copy)]
pub struct TeamFactors {
    /// Team-offense factor, standard normal.
    pub offense: f64,
    /// Game factor, already signed for this side (+g home, -g away).
    pub game: f64,
}

/// Blend an independently sampled value with a transformed shared factor.
///
/// `transform` maps a standard normal into the draw's own scale (for a
/// Normal draw, `mu + sigma * z`; for a LogNormal draw, `exp(mu + sigma*z)`).
/// A negative weight flips the factor before transforming, which is what
/// makes the ball-carrier/passing-game relationship inverse.
pub fn blend(own: f64, factor: f64, weight: f64, transform: impl Fn(f64) -> f64) -> f64 {
    let w = weight.abs();
    if w == 0.0 {
        return own;
    }
    let signed = if weight < 0.0 { -factor } else { factor };
    own * (1.0 - w) + transform(signed) * w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_weight_is_identity() {
        let blended = blend(3.5, 1.7, 0.0, |z| 10.0 + z);
        assert_eq!(blended, 3.5);
    }

    #[test]
    fn test_negative_weight_flips_factor_direction() {
        let transform = |z: f64| 10.0 + 2.0 * z;
        let up = blend(10.0, 1.0, 0.3, transform);
        let down = blend(10.0, 1.0, -0.3, transform);
        assert!(up > 10.0);
        assert!(down < 10.0);
        // Same magnitude either side of the independent draw.
        assert!((up - 10.0 + (down - 10.0)).abs() < 1e-12);
    }

    #[test]
    fn test_weight_magnitude_bounds_checked() {
        let weights =
            CorrelationWeights { passer_receiver: 1.0, ..CorrelationWeights::default() };
        assert!(weights.validate().is_err());
        assert!(CorrelationWeights::default().validate().is_ok());
    }

    #[test]
    fn test_offense_weight_by_position() {
        let w = CorrelationWeights::default();
        assert!(w.offense_weight(Position::Wr) > 0.0);
        assert!(w.offense_weight(Position::Rb) < 0.0);
        assert_eq!(w.offense_weight(Position::Dst), 0.0);
    }
}
