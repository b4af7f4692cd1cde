//! Game environment sampling.
//!
//! One draw per team per trial: tempo (plays), pass-mix fraction, and the
//! shared game factor feeding correlated zero-sum adjustments. Market
//! signals adjust the means; missing lines mean unadjusted priors, never an
//! error.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::engine::correlation::TeamFactors;
use crate::models::{GameContext, TeamPrior};

/// Floor on sampled plays; a team cannot run fewer in a real game.
const MIN_TEMPO: f64 = 35.0;
/// Pass-mix is kept inside the range observed across game scripts.
const MIN_PASS_MIX: f64 = 0.35;
const MAX_PASS_MIX: f64 = 0.85;
/// Per-point-of-spread shift in pass mix, and the cap on the total shift.
const SPREAD_MIX_PER_POINT: f64 = 0.005;
const MAX_SPREAD_MIX_SHIFT: f64 = 0.08;
/// Trial-level pass-mix noise around the prior mean.
const MIX_NOISE_STD: f64 = 0.05;

/// Per-trial, per-team environment draw. Created fresh each trial and
/// discarded after scoring.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentDraw {
    /// Sampled plays for this team.
    pub tempo: f64,
    /// Sampled pass-play fraction.
    pub pass_mix: f64,
    /// Shared correlation factors for this side of the game.
    pub factors: TeamFactors,
}

/// Sample both teams' environment draws for one game. The single game shock
/// feeds both sides with opposite sign, so any blend against it is zero-sum
/// across the matchup.
pub fn sample_game_environment<R: Rng>(
    rng: &mut R,
    context: &GameContext,
    home: &TeamPrior,
    away: &TeamPrior,
    reference_total: f64,
) -> (EnvironmentDraw, EnvironmentDraw) {
    // Fixed draw order keeps trial streams reproducible: home tempo, away
    // tempo, home mix noise, away mix noise, game shock, offense factors.
    let home_tempo_z: f64 = StandardNormal.sample(rng);
    let away_tempo_z: f64 = StandardNormal.sample(rng);
    let home_mix_z: f64 = StandardNormal.sample(rng);
    let away_mix_z: f64 = StandardNormal.sample(rng);
    let home_mix_noise = MIX_NOISE_STD * home_mix_z;
    let away_mix_noise = MIX_NOISE_STD * away_mix_z;
    let game_shock: f64 = StandardNormal.sample(rng);
    let home_offense: f64 = StandardNormal.sample(rng);
    let away_offense: f64 = StandardNormal.sample(rng);

    let home_edge = context.home_edge().unwrap_or(0.0);

    let home_draw = EnvironmentDraw {
        tempo: tempo(home, home_tempo_z, total_factor(context, true, reference_total)),
        pass_mix: pass_mix(home, home_mix_noise, home_edge),
        factors: TeamFactors { offense: home_offense, game: game_shock },
    };
    let away_draw = EnvironmentDraw {
        tempo: tempo(away, away_tempo_z, total_factor(context, false, reference_total)),
        pass_mix: pass_mix(away, away_mix_noise, -home_edge),
        factors: TeamFactors { offense: away_offense, game: -game_shock },
    };
    (home_draw, away_draw)
}

/// Tempo scale factor from the market. An implied team total is the more
/// specific signal and takes precedence over the game total; with neither
/// posted the prior stands unadjusted.
fn total_factor(context: &GameContext, is_home: bool, reference: f64) -> f64 {
    let implied = if is_home { context.implied_home_total } else { context.implied_away_total };
    if let Some(team_total) = implied {
        return team_total / (reference / 2.0);
    }
    match context.total {
        Some(total) => total / reference,
        None => 1.0,
    }
}

fn tempo(prior: &TeamPrior, z: f64, total_factor: f64) -> f64 {
    ((prior.tempo_mean + prior.tempo_std * z) * total_factor).max(MIN_TEMPO)
}

/// Pass mix = baseline + adjustment, nudged by the game-script expectation:
/// the favored side leans run, the underdog leans pass, bounded either way.
fn pass_mix(prior: &TeamPrior, noise: f64, edge: f64) -> f64 {
    let script_shift =
        (-edge * SPREAD_MIX_PER_POINT).clamp(-MAX_SPREAD_MIX_SHIFT, MAX_SPREAD_MIX_SHIFT);
    (prior.base_pass_mix + prior.mix_adjustment + script_shift + noise)
        .clamp(MIN_PASS_MIX, MAX_PASS_MIX)
}
