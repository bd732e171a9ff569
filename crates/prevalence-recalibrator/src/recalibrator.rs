//! Odds-space prior correction
//!
//! With `odds(p) = p / (1 - p)`, a probability estimated under prior
//! `pi_train` maps to prior `pi_deploy` by multiplying its odds with
//! `odds(pi_deploy) / odds(pi_train)`.

use risk_core::{PredictionResult, Prior, PriorKind, RiskError, RiskResult, Scorer};
use serde::Serialize;

/// Distance kept from 0 and 1 so odds stay finite.
pub const DEFAULT_EPSILON: f64 = 1e-12;

/// A recalibrated probability plus whether clamping kicked in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdjustedProbability {
    pub value: f64,
    pub clamped: bool,
}

/// Priors and numeric bounds the recalibrator works with.
///
/// Built once by the caller and handed over explicitly; the recalibrator
/// never looks at process state.
#[derive(Debug, Clone, Copy)]
pub struct RecalibrationConfig {
    /// Training prevalence used when a call does not supply one
    pub pi_train: Prior,
    /// Deployment prevalence used when a call does not supply one
    pub default_pi_deploy: Option<Prior>,
    /// Clamp distance from 0 and 1, in (0, 0.5)
    pub epsilon: f64,
}

impl RecalibrationConfig {
    pub fn new(pi_train: Prior) -> Self {
        Self {
            pi_train,
            default_pi_deploy: None,
            epsilon: DEFAULT_EPSILON,
        }
    }

    pub fn with_default_pi_deploy(mut self, pi_deploy: Option<Prior>) -> Self {
        self.default_pi_deploy = pi_deploy;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        if epsilon > 0.0 && epsilon < 0.5 {
            self.epsilon = epsilon;
        } else {
            tracing::warn!(epsilon, "ignoring out-of-range clamp epsilon");
        }
        self
    }
}

/// Stateless prior correction bound to a configuration.
#[derive(Debug, Clone)]
pub struct PrevalenceRecalibrator {
    config: RecalibrationConfig,
}

impl PrevalenceRecalibrator {
    pub fn new(config: RecalibrationConfig) -> Self {
        Self { config }
    }

    /// Recalibrator whose training prior is the one the scorer recorded.
    pub fn for_scorer(scorer: &dyn Scorer) -> Self {
        Self::new(RecalibrationConfig::new(scorer.training_prior()))
    }

    pub fn config(&self) -> &RecalibrationConfig {
        &self.config
    }

    /// Adjust `p_raw` to the deployment prevalence.
    ///
    /// `pi_train` and `pi_deploy` fall back to the configured values when
    /// `None`. With no deployment prior at all the raw probability is passed
    /// through and `used_adjustment` is false.
    pub fn adjust(
        &self,
        p_raw: f64,
        pi_train: Option<f64>,
        pi_deploy: Option<f64>,
    ) -> RiskResult<PredictionResult> {
        let pi_train = match pi_train {
            Some(value) => Prior::new(PriorKind::Train, value)?,
            None => self.config.pi_train,
        };
        let pi_deploy = match pi_deploy {
            Some(value) => Some(Prior::new(PriorKind::Deploy, value)?),
            None => self.config.default_pi_deploy,
        };

        adjust_with_priors(p_raw, pi_train, pi_deploy, self.config.epsilon)
    }
}

/// Adjust `p_raw` from `pi_train` to `pi_deploy` with [`DEFAULT_EPSILON`].
pub fn adjust(p_raw: f64, pi_train: f64, pi_deploy: Option<f64>) -> RiskResult<PredictionResult> {
    let pi_train = Prior::new(PriorKind::Train, pi_train)?;
    let pi_deploy = pi_deploy
        .map(|value| Prior::new(PriorKind::Deploy, value))
        .transpose()?;
    adjust_with_priors(p_raw, pi_train, pi_deploy, DEFAULT_EPSILON)
}

fn adjust_with_priors(
    p_raw: f64,
    pi_train: Prior,
    pi_deploy: Option<Prior>,
    epsilon: f64,
) -> RiskResult<PredictionResult> {
    if !(0.0..=1.0).contains(&p_raw) {
        return Err(RiskError::ScorerContract(format!(
            "raw probability {p_raw} is outside [0, 1]"
        )));
    }

    let Some(pi_deploy) = pi_deploy else {
        return Ok(PredictionResult {
            raw_probability: p_raw,
            adjusted_probability: None,
            used_adjustment: false,
            pi_train: pi_train.value(),
            pi_deploy: None,
            probability_clamped: false,
        });
    };

    let adjusted = adjust_probability(p_raw, pi_train, pi_deploy, epsilon);
    if adjusted.clamped {
        tracing::debug!(
            p_raw,
            pi_train = pi_train.value(),
            pi_deploy = pi_deploy.value(),
            p_adjusted = adjusted.value,
            "probability clamped during prior correction"
        );
    }

    Ok(PredictionResult {
        raw_probability: p_raw,
        adjusted_probability: Some(adjusted.value),
        used_adjustment: true,
        pi_train: pi_train.value(),
        pi_deploy: Some(pi_deploy.value()),
        probability_clamped: adjusted.clamped,
    })
}

/// The bare transform. `p` must already be inside [0, 1].
///
/// Only an exact 0 or 1 is moved inward before taking odds; the result is
/// then kept within `epsilon` of either bound.
pub fn adjust_probability(
    p: f64,
    pi_train: Prior,
    pi_deploy: Prior,
    epsilon: f64,
) -> AdjustedProbability {
    let (p, raw_clamped) = if p == 0.0 || p == 1.0 {
        clamp(p, epsilon)
    } else {
        (p, false)
    };

    let odds_raw = p / (1.0 - p);
    let k = pi_deploy.odds() / pi_train.odds();
    let odds_adj = odds_raw * k;

    // odds_adj can overflow to inf for extreme ratios
    let p_adj = if odds_adj.is_infinite() {
        1.0
    } else {
        odds_adj / (1.0 + odds_adj)
    };
    let (value, adj_clamped) = clamp(p_adj, epsilon);

    AdjustedProbability {
        value,
        clamped: raw_clamped || adj_clamped,
    }
}

fn clamp(p: f64, epsilon: f64) -> (f64, bool) {
    let clamped = p.clamp(epsilon, 1.0 - epsilon);
    (clamped, clamped != p)
}
