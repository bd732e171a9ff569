//! Logistic scorer with optional isotonic post-calibration.

use risk_core::{FeatureVector, Prior, RiskError, RiskResult, Scorer, FEATURE_ORDER};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::meta::ModelMeta;
use crate::scaler::StandardScaler;

const REFERENCE_ARTIFACT: &str = include_str!("../assets/reference_model.json");

/// On-disk description of a trained logistic model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub meta: ModelMeta,
    #[serde(default)]
    pub scaler: StandardScaler,
    pub intercept: f64,
    pub coefficients: BTreeMap<String, f64>,
    /// `(raw, calibrated)` pairs sorted by raw probability
    #[serde(default)]
    pub isotonic: Option<Vec<(f64, f64)>>,
}

/// Immutable after loading; shared across request handlers.
#[derive(Debug, Clone)]
pub struct LogisticScorer {
    meta: ModelMeta,
    scaler: StandardScaler,
    intercept: f64,
    /// Coefficients aligned with `meta.feature_order`
    weights: Vec<f64>,
    isotonic_table: Vec<(f64, f64)>,
    training_prior: Prior,
}

impl LogisticScorer {
    pub fn from_artifact(artifact: ModelArtifact) -> RiskResult<Self> {
        let training_prior = artifact.meta.training_prior()?;

        let mut weights = Vec::with_capacity(artifact.meta.feature_order.len());
        for name in &artifact.meta.feature_order {
            if !FEATURE_ORDER.contains(&name.as_str()) {
                return Err(RiskError::Model(format!("unknown feature '{name}' in feature_order")));
            }
            let coef = artifact
                .coefficients
                .get(name)
                .ok_or_else(|| RiskError::Model(format!("missing coefficient for '{name}'")))?;
            weights.push(*coef);
        }

        let isotonic_table = artifact.isotonic.unwrap_or_default();
        if isotonic_table.windows(2).any(|w| w[0].0 > w[1].0) {
            return Err(RiskError::Model("isotonic table is not sorted".to_string()));
        }
        if let Some((x, y)) = isotonic_table
            .iter()
            .find(|(x, y)| !x.is_finite() || !(0.0..=1.0).contains(y))
        {
            return Err(RiskError::Model(format!(
                "isotonic point ({x}, {y}) must map a finite score into [0, 1]"
            )));
        }

        Ok(Self {
            meta: artifact.meta,
            scaler: artifact.scaler,
            intercept: artifact.intercept,
            weights,
            isotonic_table,
            training_prior,
        })
    }

    pub fn from_json(json: &str) -> RiskResult<Self> {
        Self::from_artifact(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> RiskResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| RiskError::Model(format!("failed to read {}: {e}", path.display())))?;
        let scorer = Self::from_json(&json)?;
        tracing::info!(
            path = %path.display(),
            model = %scorer.meta.model_name,
            version = %scorer.meta.model_version,
            "loaded model artifact"
        );
        Ok(scorer)
    }

    /// The model bundled with the crate.
    pub fn reference() -> RiskResult<Self> {
        Self::from_json(REFERENCE_ARTIFACT)
    }

    pub fn meta(&self) -> &ModelMeta {
        &self.meta
    }

    fn logit(&self, features: &FeatureVector) -> f64 {
        let encoded = features.encoded();
        self.meta
            .feature_order
            .iter()
            .zip(&self.weights)
            .map(|(name, w)| {
                // from_artifact guarantees every name is in FEATURE_ORDER
                let raw = encoded
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| *v)
                    .unwrap_or(0.0);
                w * self.scaler.transform(name, raw)
            })
            .sum::<f64>()
            + self.intercept
    }

    fn isotonic_lookup(&self, value: f64) -> f64 {
        let table = &self.isotonic_table;
        let (Some(first), Some(last)) = (table.first(), table.last()) else {
            return value;
        };

        match table.binary_search_by(|point| point.0.total_cmp(&value)) {
            Ok(idx) => table[idx].1,
            Err(0) => first.1,
            Err(idx) if idx >= table.len() => last.1,
            Err(idx) => {
                let (x0, y0) = table[idx - 1];
                let (x1, y1) = table[idx];
                let t = (value - x0) / (x1 - x0);
                y0 + t * (y1 - y0)
            }
        }
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Scorer for LogisticScorer {
    fn score(&self, features: &FeatureVector) -> RiskResult<f64> {
        features.validate()?;
        let p = self.isotonic_lookup(sigmoid(self.logit(features)));
        if p.is_nan() {
            return Err(RiskError::ScorerContract("model produced NaN".to_string()));
        }
        Ok(p)
    }

    fn training_prior(&self) -> Prior {
        self.training_prior
    }

    fn feature_order(&self) -> &[String] {
        &self.meta.feature_order
    }

    fn model_name(&self) -> &str {
        &self.meta.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use risk_core::{AlcoholConsumption, ExposureLevel, Gender, PriorKind};
    use serde_json::json;

    fn low_risk() -> FeatureVector {
        FeatureVector {
            age: 30.0,
            gender: Gender::Female,
            pack_years: 0.0,
            radon_exposure: ExposureLevel::Low,
            asbestos_exposure: false,
            secondhand_smoke_exposure: false,
            copd_diagnosis: false,
            alcohol_consumption: AlcoholConsumption::None,
            family_history: false,
        }
    }

    fn high_risk() -> FeatureVector {
        FeatureVector {
            age: 72.0,
            gender: Gender::Male,
            pack_years: 90.0,
            radon_exposure: ExposureLevel::High,
            asbestos_exposure: true,
            secondhand_smoke_exposure: true,
            copd_diagnosis: true,
            alcohol_consumption: AlcoholConsumption::Heavy,
            family_history: true,
        }
    }

    fn tiny_artifact() -> serde_json::Value {
        json!({
            "meta": {
                "model_name": "tiny",
                "model_version": "0.1",
                "training_prevalence": 0.5,
                "feature_order": ["age", "copd_diagnosis"]
            },
            "scaler": { "age": { "mean": 50.0, "scale": 10.0 } },
            "intercept": 0.0,
            "coefficients": { "age": 1.0, "copd_diagnosis": 2.0 }
        })
    }

    #[test]
    fn test_reference_model_loads() {
        let scorer = LogisticScorer::reference().unwrap();
        assert_eq!(scorer.training_prior().value(), 0.68728);
        assert_eq!(scorer.feature_order().len(), FEATURE_ORDER.len());
        assert_eq!(scorer.model_name(), "lung-cancer-logistic");
    }

    #[test]
    fn test_reference_model_ranks_risk() {
        let scorer = LogisticScorer::reference().unwrap();
        let low = scorer.score(&low_risk()).unwrap();
        let high = scorer.score(&high_risk()).unwrap();
        assert!(low > 0.0 && high < 1.0);
        assert!(low < high);
    }

    #[test]
    fn test_tiny_model_logit() {
        let scorer = LogisticScorer::from_json(&tiny_artifact().to_string()).unwrap();
        let mut fv = low_risk();
        fv.age = 60.0;
        fv.copd_diagnosis = true;
        // z = 1.0 * (60 - 50) / 10 + 2.0 * 1
        assert_relative_eq!(scorer.score(&fv).unwrap(), sigmoid(3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_missing_coefficient_rejected() {
        let mut artifact = tiny_artifact();
        artifact["coefficients"]
            .as_object_mut()
            .unwrap()
            .remove("copd_diagnosis");
        let err = LogisticScorer::from_json(&artifact.to_string()).unwrap_err();
        assert!(err.to_string().contains("copd_diagnosis"));
    }

    #[test]
    fn test_invalid_training_prevalence_rejected() {
        let mut artifact = tiny_artifact();
        artifact["meta"]["training_prevalence"] = json!(1.0);
        let err = LogisticScorer::from_json(&artifact.to_string()).unwrap_err();
        assert!(matches!(err, RiskError::InvalidPrior { kind: PriorKind::Train, .. }));
    }

    #[test]
    fn test_isotonic_interpolation() {
        let mut artifact = tiny_artifact();
        artifact["isotonic"] = json!([[0.2, 0.1], [0.6, 0.3], [0.9, 0.8]]);
        let scorer = LogisticScorer::from_json(&artifact.to_string()).unwrap();

        assert_relative_eq!(scorer.isotonic_lookup(0.4), 0.2, epsilon = 1e-12);
        assert_eq!(scorer.isotonic_lookup(0.6), 0.3);
        assert_eq!(scorer.isotonic_lookup(0.05), 0.1);
        assert_eq!(scorer.isotonic_lookup(0.95), 0.8);
    }

    #[test]
    fn test_unsorted_isotonic_rejected() {
        let mut artifact = tiny_artifact();
        artifact["isotonic"] = json!([[0.6, 0.3], [0.2, 0.1]]);
        assert!(LogisticScorer::from_json(&artifact.to_string()).is_err());
    }

    #[test]
    fn test_isotonic_output_outside_unit_interval_rejected() {
        for points in [json!([[0.2, 0.1], [0.6, 1.3]]), json!([[0.2, -0.1], [0.6, 0.3]])] {
            let mut artifact = tiny_artifact();
            artifact["isotonic"] = points;
            match LogisticScorer::from_json(&artifact.to_string()) {
                Err(RiskError::Model(msg)) => assert!(msg.contains("isotonic")),
                other => panic!("expected Model error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_finite_isotonic_point_rejected() {
        let mut artifact: ModelArtifact = serde_json::from_value(tiny_artifact()).unwrap();
        artifact.isotonic = Some(vec![(0.2, 0.1), (0.6, f64::NAN)]);
        assert!(matches!(
            LogisticScorer::from_artifact(artifact),
            Err(RiskError::Model(_))
        ));
    }
}
