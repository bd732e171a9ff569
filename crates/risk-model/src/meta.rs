use chrono::{DateTime, Utc};
use risk_core::{Prior, PriorKind, RiskResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive metadata recorded alongside a trained model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMeta {
    pub model_name: String,
    pub model_version: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    /// Fraction of positives in the training set
    pub training_prevalence: f64,
    #[serde(default)]
    pub n_train: usize,
    pub feature_order: Vec<String>,
    /// Human-readable meaning of each 0/1 and ordinal encoding
    #[serde(default)]
    pub binary_meanings: BTreeMap<String, String>,
    /// Library versions the model was trained with
    #[serde(default)]
    pub versions: BTreeMap<String, String>,
}

impl ModelMeta {
    pub fn training_prior(&self) -> RiskResult<Prior> {
        Prior::new(PriorKind::Train, self.training_prevalence)
    }
}
