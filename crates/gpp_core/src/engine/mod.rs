//! Simulation engine: validation, trial execution, aggregation.
//!
//! A run moves through a fixed sequence of phases. Validating resolves every
//! roster entity to a sampling plan and fails fast on any structural defect;
//! Running executes trials in parallel over per-trial child RNG streams;
//! Aggregating reduces the trial matrix to per-entity reports. Nothing is
//! returned from a run that aborted part-way.

pub mod correlation;
pub mod environment;
pub mod matrix;
pub mod performance;
pub mod rng;
pub mod scoring;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::RunConfig;
use crate::error::{Result, SimError, Stage};
use crate::metadata::RunMetadata;
use crate::metrics::RunReport;
use crate::models::{Entity, GameContext, PriorStore, TeamPrior};
use self::environment::sample_game_environment;
use self::matrix::TrialMatrix;
use self::performance::{fallback_std, FallbackSampler, PriorSampler, TrialContext};
use self::rng::trial_rng;

/// Run lifecycle phase, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Validating,
    Running,
    Aggregating,
    Done,
}

/// One matchup with both team priors resolved.
struct GamePlan<'a> {
    context: &'a GameContext,
    home: &'a TeamPrior,
    away: &'a TeamPrior,
}

/// Which game, and which side of it, an entity plays in.
#[derive(Clone, Copy)]
struct GameSlot {
    game: usize,
    is_home: bool,
}

/// Sampling strategy resolved for one entity during validation. Prior-backed
/// entities always carry a game slot; the fallback path has no environment
/// dependence and needs none.
enum SamplerPlan {
    Prior { sampler: PriorSampler, slot: GameSlot },
    Fallback(FallbackSampler),
}

/// Everything the Running phase needs, built once during Validating and
/// shared read-only across workers.
struct SlatePlan<'a> {
    games: Vec<GamePlan<'a>>,
    entity_ids: Vec<&'a str>,
    samplers: Vec<SamplerPlan>,
    /// True where the entity took the rookie-fallback path, in roster order.
    fallback: Vec<bool>,
}

/// Full output of one run.
pub struct RunOutput {
    pub matrix: TrialMatrix,
    pub report: RunReport,
    /// Fallback flags in roster order, for callers that join back onto the
    /// matrix columns.
    pub fallback: Vec<bool>,
    pub metadata: RunMetadata,
}

/// Monte Carlo simulator for one slate.
pub struct SlateSimulator {
    config: RunConfig,
}

impl SlateSimulator {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Execute the full pipeline: validate, run every trial, aggregate.
    pub fn run(
        &self,
        entities: &[Entity],
        priors: &PriorStore,
        contexts: &[GameContext],
    ) -> Result<RunOutput> {
        info!(
            "run starting: {} entities, {} games, {} trials, seed {}",
            entities.len(),
            contexts.len(),
            self.config.n_trials,
            self.config.seed
        );

        enter(Phase::Validating);
        let plan = self.plan(entities, priors, contexts)?;
        let rookie_count = plan.fallback.iter().filter(|&&f| f).count();
        if rookie_count > 0 {
            info!("{rookie_count} entities on the reference-projection fallback path");
        }

        enter(Phase::Running);
        let matrix = self.execute(&plan)?;

        enter(Phase::Aggregating);
        let report = RunReport::build(&matrix, entities, &plan.fallback, &self.config)?;
        let metadata = RunMetadata::new(
            &self.config,
            entities,
            priors,
            contexts,
            rookie_count,
            !report.calibrated_positions.is_empty(),
        )?;

        enter(Phase::Done);
        info!("run complete: {} x {} matrix", matrix.n_trials(), matrix.n_entities());
        Ok(RunOutput { matrix, report, fallback: plan.fallback, metadata })
    }

    /// Validate inputs and produce the raw trial matrix without aggregation.
    pub fn run_trials(
        &self,
        entities: &[Entity],
        priors: &PriorStore,
        contexts: &[GameContext],
    ) -> Result<TrialMatrix> {
        let plan = self.plan(entities, priors, contexts)?;
        self.execute(&plan)
    }

    /// Validating phase: resolve the roster against priors and contexts.
    fn plan<'a>(
        &self,
        entities: &'a [Entity],
        priors: &'a PriorStore,
        contexts: &'a [GameContext],
    ) -> Result<SlatePlan<'a>> {
        self.config.validate()?;
        if entities.is_empty() {
            return Err(SimError::validation(
                Stage::RosterValidation,
                "roster",
                "at least one entity is required",
            ));
        }
        let index = priors.index()?;

        let mut games = Vec::with_capacity(contexts.len());
        let mut slots: std::collections::HashMap<&str, GameSlot> = std::collections::HashMap::new();
        for (game, context) in contexts.iter().enumerate() {
            if context.home_team == context.away_team {
                return Err(SimError::validation(
                    Stage::ContextValidation,
                    &context.home_team,
                    "a team cannot play itself",
                ));
            }
            let home = index.team(&context.home_team).ok_or_else(|| {
                SimError::validation(
                    Stage::ContextValidation,
                    &context.home_team,
                    "no team prior for home side",
                )
            })?;
            let away = index.team(&context.away_team).ok_or_else(|| {
                SimError::validation(
                    Stage::ContextValidation,
                    &context.away_team,
                    "no team prior for away side",
                )
            })?;
            for (team, is_home) in [(context.home_team.as_str(), true), (context.away_team.as_str(), false)]
            {
                if slots.insert(team, GameSlot { game, is_home }).is_some() {
                    return Err(SimError::validation(
                        Stage::ContextValidation,
                        team,
                        "team appears in more than one game context",
                    ));
                }
            }
            games.push(GamePlan { context, home, away });
        }

        let mut seen = std::collections::HashSet::new();
        let mut entity_ids = Vec::with_capacity(entities.len());
        let mut samplers = Vec::with_capacity(entities.len());
        let mut fallback = Vec::with_capacity(entities.len());
        for entity in entities {
            if !seen.insert(entity.id.as_str()) {
                return Err(SimError::validation(
                    Stage::RosterValidation,
                    &entity.id,
                    "duplicate entity id",
                ));
            }
            entity_ids.push(entity.id.as_str());

            let plan = match index.entity(&entity.id) {
                Some(prior) => {
                    if prior.position != entity.position {
                        return Err(SimError::validation(
                            Stage::RosterValidation,
                            &entity.id,
                            format!(
                                "position mismatch: roster says {}, prior says {}",
                                entity.position, prior.position
                            ),
                        ));
                    }
                    let slot = *slots.get(entity.team.as_str()).ok_or_else(|| {
                        SimError::validation(
                            Stage::RosterValidation,
                            &entity.id,
                            format!("team '{}' is not in any game context", entity.team),
                        )
                    })?;
                    let game = &games[slot.game];
                    let expected_opp =
                        if slot.is_home { &game.context.away_team } else { &game.context.home_team };
                    if &entity.opponent != expected_opp {
                        return Err(SimError::validation(
                            Stage::RosterValidation,
                            &entity.id,
                            format!(
                                "opponent '{}' does not match game context '{expected_opp}'",
                                entity.opponent
                            ),
                        ));
                    }
                    fallback.push(false);
                    SamplerPlan::Prior {
                        sampler: PriorSampler::new(prior, &self.config.correlation)?,
                        slot,
                    }
                }
                None => {
                    let reference = entity.reference_projection.ok_or_else(|| {
                        SimError::validation(
                            Stage::RosterValidation,
                            &entity.id,
                            "no prior and no reference projection",
                        )
                    })?;
                    if !reference.is_finite() || reference < 0.0 {
                        return Err(SimError::validation(
                            Stage::RosterValidation,
                            &entity.id,
                            "reference projection must be finite and non-negative",
                        ));
                    }
                    debug!("{}: no prior, falling back to reference projection", entity.id);
                    fallback.push(true);
                    SamplerPlan::Fallback(FallbackSampler::new(
                        &entity.id,
                        reference,
                        fallback_std(entity.position),
                    )?)
                }
            };
            samplers.push(plan);
        }

        Ok(SlatePlan { games, entity_ids, samplers, fallback })
    }

    /// Running phase. Each trial derives its own RNG stream from the run
    /// seed and its index, so the matrix is identical however rayon splits
    /// the range across workers.
    fn execute(&self, plan: &SlatePlan<'_>) -> Result<TrialMatrix> {
        let rows = (0..self.config.n_trials)
            .into_par_iter()
            .map(|trial| self.simulate_trial(trial, plan))
            .collect::<Result<Vec<_>>>()?;
        Ok(TrialMatrix::from_rows(rows, plan.samplers.len()))
    }

    fn simulate_trial(&self, trial: usize, plan: &SlatePlan<'_>) -> Result<Vec<f64>> {
        let mut rng = trial_rng(self.config.seed, trial);

        // Game environments first, in context order, then entities in roster
        // order. The draw order is part of the reproducibility contract.
        let mut envs = Vec::with_capacity(plan.games.len());
        for game in &plan.games {
            envs.push(sample_game_environment(
                &mut rng,
                game.context,
                game.home,
                game.away,
                self.config.reference_total,
            ));
        }

        let mut row = Vec::with_capacity(plan.samplers.len());
        for (i, sampler) in plan.samplers.iter().enumerate() {
            let points = match sampler {
                SamplerPlan::Fallback(fallback) => fallback.sample(&mut rng).points,
                SamplerPlan::Prior { sampler, slot } => {
                    let (home_env, away_env) = &envs[slot.game];
                    let game = &plan.games[slot.game];
                    let (env, opp_env, opp_team) = if slot.is_home {
                        (home_env, away_env, game.away)
                    } else {
                        (away_env, home_env, game.home)
                    };
                    sampler.sample(&mut rng, &TrialContext { env, opp_env, opp_team }).points
                }
            };
            if !points.is_finite() {
                return Err(SimError::Numerical {
                    stage: Stage::EntitySampling,
                    entity: plan.entity_ids[i].to_string(),
                    trial,
                });
            }
            row.push(points);
        }
        Ok(row)
    }
}

fn enter(phase: Phase) {
    debug!("phase: {phase:?}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntityPrior, Position};

    fn team_prior(team: &str, tempo: f64) -> TeamPrior {
        TeamPrior {
            team: team.to_string(),
            tempo_mean: tempo,
            tempo_std: 7.0,
            base_pass_mix: 0.58,
            mix_adjustment: 0.0,
            efficiency_mean: 0.35,
        }
    }

    fn qb_prior(id: &str) -> EntityPrior {
        EntityPrior {
            entity_id: id.to_string(),
            position: Position::Qb,
            usage_alpha: 95.0,
            usage_beta: 5.0,
            efficiency_mean: 7.2,
            efficiency_std: 1.2,
            event_shape: 8.0,
            event_rate: 160.0,
        }
    }

    fn wr_prior(id: &str) -> EntityPrior {
        EntityPrior {
            entity_id: id.to_string(),
            position: Position::Wr,
            usage_alpha: 6.0,
            usage_beta: 24.0,
            efficiency_mean: 9.8,
            efficiency_std: 2.8,
            event_shape: 8.0,
            event_rate: 100.0,
        }
    }

    fn slate() -> (Vec<Entity>, PriorStore, Vec<GameContext>) {
        let entities = vec![
            Entity::new("KC_QB", "Home Passer", Position::Qb, "KC", "LV"),
            Entity::new("KC_WR", "Home Receiver", Position::Wr, "KC", "LV"),
            Entity::new("LV_WR", "Away Receiver", Position::Wr, "LV", "KC"),
        ];
        let priors = PriorStore::new(
            vec![team_prior("KC", 65.0), team_prior("LV", 63.0)],
            vec![qb_prior("KC_QB"), wr_prior("KC_WR"), wr_prior("LV_WR")],
        );
        let contexts = vec![GameContext::new("KC", "LV").with_market(47.5, 3.0)];
        (entities, priors, contexts)
    }

    fn pearson(x: &[f64], y: &[f64]) -> f64 {
        let n = x.len() as f64;
        let mx = x.iter().sum::<f64>() / n;
        let my = y.iter().sum::<f64>() / n;
        let mut cov = 0.0;
        let mut vx = 0.0;
        let mut vy = 0.0;
        for (a, b) in x.iter().zip(y) {
            cov += (a - mx) * (b - my);
            vx += (a - mx).powi(2);
            vy += (b - my).powi(2);
        }
        cov / (vx.sqrt() * vy.sqrt())
    }

    #[test]
    fn test_same_seed_same_matrix() {
        let (entities, priors, contexts) = slate();
        let sim = SlateSimulator::new(RunConfig::default().with_trials(2_000).with_seed(7));
        let a = sim.run_trials(&entities, &priors, &contexts).unwrap();
        let b = sim.run_trials(&entities, &priors, &contexts).unwrap();
        for t in 0..a.n_trials() {
            assert_eq!(a.row(t), b.row(t), "trial {t} diverged");
        }
    }

    #[test]
    fn test_worker_count_does_not_change_matrix() {
        let (entities, priors, contexts) = slate();
        let sim = SlateSimulator::new(RunConfig::default().with_trials(2_000).with_seed(7));
        let single = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let many = rayon::ThreadPoolBuilder::new().num_threads(8).build().unwrap();
        let a = single.install(|| sim.run_trials(&entities, &priors, &contexts)).unwrap();
        let b = many.install(|| sim.run_trials(&entities, &priors, &contexts)).unwrap();
        for t in 0..a.n_trials() {
            assert_eq!(a.row(t), b.row(t), "trial {t} depends on worker count");
        }
    }

    #[test]
    fn test_different_seed_different_matrix() {
        let (entities, priors, contexts) = slate();
        let a = SlateSimulator::new(RunConfig::default().with_trials(200).with_seed(7))
            .run_trials(&entities, &priors, &contexts)
            .unwrap();
        let b = SlateSimulator::new(RunConfig::default().with_trials(200).with_seed(8))
            .run_trials(&entities, &priors, &contexts)
            .unwrap();
        let identical = (0..a.n_trials()).filter(|&t| a.row(t) == b.row(t)).count();
        assert_eq!(identical, 0);
    }

    #[test]
    fn test_same_team_passing_game_correlates_positively() {
        let (entities, priors, contexts) = slate();
        let sim = SlateSimulator::new(RunConfig::default().with_trials(40_000).with_seed(3));
        let matrix = sim.run_trials(&entities, &priors, &contexts).unwrap();
        let corr = pearson(&matrix.column(0), &matrix.column(1));
        assert!(corr > 0.15, "QB/WR same-team correlation too weak: {corr}");
    }

    #[test]
    fn test_opposing_receivers_correlate_negatively() {
        let (entities, priors, contexts) = slate();
        let sim = SlateSimulator::new(RunConfig::default().with_trials(40_000).with_seed(3));
        let matrix = sim.run_trials(&entities, &priors, &contexts).unwrap();
        let corr = pearson(&matrix.column(1), &matrix.column(2));
        assert!(corr < -0.005, "opposing receivers should move apart: {corr}");
    }

    #[test]
    fn test_entity_without_prior_or_reference_rejected() {
        let (mut entities, priors, contexts) = slate();
        entities.push(Entity::new("KC_WR_ROOKIE", "Undrafted", Position::Wr, "KC", "LV"));
        let sim = SlateSimulator::new(RunConfig::default().with_trials(10));
        let err = sim.run_trials(&entities, &priors, &contexts).unwrap_err();
        assert!(matches!(err, SimError::Validation { stage: Stage::RosterValidation, .. }));
    }

    #[test]
    fn test_reference_projection_enables_fallback() {
        let (mut entities, priors, contexts) = slate();
        entities.push(
            Entity::new("KC_WR_ROOKIE", "Undrafted", Position::Wr, "KC", "LV")
                .with_reference(8.5),
        );
        let sim = SlateSimulator::new(RunConfig::default().with_trials(4_000).with_seed(5));
        let matrix = sim.run_trials(&entities, &priors, &contexts).unwrap();
        let mean = matrix.column(3).iter().sum::<f64>() / matrix.n_trials() as f64;
        assert!((mean - 8.5).abs() < 0.5, "fallback mean drifted: {mean}");
    }

    #[test]
    fn test_prior_backed_team_must_be_in_a_context() {
        let (mut entities, mut priors, contexts) = slate();
        entities.push(Entity::new("DEN_WR", "Stranded", Position::Wr, "DEN", "NYJ"));
        priors.teams.push(team_prior("DEN", 64.0));
        priors.entities.push(wr_prior("DEN_WR"));
        let sim = SlateSimulator::new(RunConfig::default().with_trials(10));
        assert!(sim.run_trials(&entities, &priors, &contexts).is_err());
    }

    #[test]
    fn test_opponent_mismatch_rejected() {
        let (mut entities, priors, contexts) = slate();
        entities[1].opponent = "DEN".to_string();
        let sim = SlateSimulator::new(RunConfig::default().with_trials(10));
        let err = sim.run_trials(&entities, &priors, &contexts).unwrap_err();
        assert!(matches!(err, SimError::Validation { .. }));
    }

    #[test]
    fn test_duplicate_roster_id_rejected() {
        let (mut entities, priors, contexts) = slate();
        entities.push(entities[0].clone());
        let sim = SlateSimulator::new(RunConfig::default().with_trials(10));
        assert!(sim.run_trials(&entities, &priors, &contexts).is_err());
    }

    #[test]
    fn test_team_in_two_contexts_rejected() {
        let (entities, mut priors, mut contexts) = slate();
        priors.teams.push(team_prior("DEN", 64.0));
        contexts.push(GameContext::new("KC", "DEN"));
        let sim = SlateSimulator::new(RunConfig::default().with_trials(10));
        let err = sim.run_trials(&entities, &priors, &contexts).unwrap_err();
        assert!(matches!(err, SimError::Validation { stage: Stage::ContextValidation, .. }));
    }

    #[test]
    fn test_full_run_reproducible_and_bounded() {
        let entities = vec![
            Entity::new("KC_QB", "Home Passer", Position::Qb, "KC", "LV")
                .with_salary(8000.0)
                .with_ownership(22.0)
                .with_reference(18.0),
            Entity::new("KC_WR", "Home Receiver", Position::Wr, "KC", "LV")
                .with_salary(6200.0)
                .with_ownership(14.0)
                .with_reference(12.0),
            Entity::new("LV_WR", "Away Receiver", Position::Wr, "LV", "KC")
                .with_salary(5000.0)
                .with_ownership(4.0)
                .with_reference(9.0),
            Entity::new("KC_WR_ROOKIE", "Undrafted", Position::Wr, "KC", "LV")
                .with_reference(7.0),
        ];
        let priors = PriorStore::new(
            vec![team_prior("KC", 65.0), team_prior("LV", 63.0)],
            vec![qb_prior("KC_QB"), wr_prior("KC_WR"), wr_prior("LV_WR")],
        );
        let contexts = vec![GameContext::new("KC", "LV").with_market(47.5, 3.0)];

        let sim = SlateSimulator::new(RunConfig::default().with_trials(5_000).with_seed(7));
        let out = sim.run(&entities, &priors, &contexts).unwrap();
        let again = sim.run(&entities, &priors, &contexts).unwrap();

        assert_eq!(out.report.rows.len(), 4);
        assert_eq!(out.metadata.rookie_fallback_count, 1);
        assert_eq!(out.metadata.input_fingerprint, again.metadata.input_fingerprint);
        for (a, b) in out.report.rows.iter().zip(&again.report.rows) {
            assert_eq!(a.summary.mean, b.summary.mean);
            assert_eq!(a.summary.quantiles, b.summary.quantiles);
            assert!(a.boom.score >= 1.0 && a.boom.score <= 100.0);
        }
        let rookie = &out.report.rows[3];
        assert!(rookie.rookie_fallback);
        // Rookie has no salary, so value metrics stay empty.
        assert!(rookie.value.is_none());
        // Three prior-backed entities carry references; the rookie is
        // excluded from diagnostics.
        assert_eq!(out.report.diagnostics.overall.as_ref().unwrap().n, 3);
    }

    #[test]
    fn test_all_points_finite_and_non_negative() {
        let (entities, priors, contexts) = slate();
        let sim = SlateSimulator::new(RunConfig::default().with_trials(5_000).with_seed(11));
        let matrix = sim.run_trials(&entities, &priors, &contexts).unwrap();
        for t in 0..matrix.n_trials() {
            for &v in matrix.row(t) {
                assert!(v.is_finite() && v >= 0.0);
            }
        }
    }
}
