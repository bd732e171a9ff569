use serde::{Deserialize, Serialize};

use crate::{PriorKind, RiskError, RiskResult};

/// Feature names in the order the scorer consumes them.
pub const FEATURE_ORDER: [&str; 9] = [
    "age",
    "gender",
    "pack_years",
    "radon_exposure",
    "asbestos_exposure",
    "secondhand_smoke_exposure",
    "copd_diagnosis",
    "alcohol_consumption",
    "family_history",
];

/// Fraction of positives in a population, strictly inside (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Prior(f64);

impl Prior {
    pub fn new(kind: PriorKind, value: f64) -> RiskResult<Self> {
        // NaN fails both comparisons
        if value > 0.0 && value < 1.0 {
            Ok(Self(value))
        } else {
            Err(RiskError::InvalidPrior { kind, value })
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Prior odds `pi / (1 - pi)`. Always finite and positive.
    pub fn odds(&self) -> f64 {
        self.0 / (1.0 - self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub fn encode(&self) -> f64 {
        match self {
            Gender::Female => 0.0,
            Gender::Male => 1.0,
        }
    }
}

/// Three-step ordinal scale used for radon exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum ExposureLevel {
    Low,
    Medium,
    High,
}

impl ExposureLevel {
    pub fn encode(&self) -> f64 {
        match self {
            ExposureLevel::Low => 0.0,
            ExposureLevel::Medium => 1.0,
            ExposureLevel::High => 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum AlcoholConsumption {
    None,
    Moderate,
    Heavy,
}

impl AlcoholConsumption {
    pub fn encode(&self) -> f64 {
        match self {
            AlcoholConsumption::None => 0.0,
            AlcoholConsumption::Moderate => 1.0,
            AlcoholConsumption::Heavy => 2.0,
        }
    }
}

/// Risk factors for a single individual, already decoded into typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FeatureVector {
    pub age: f64,
    pub gender: Gender,
    pub pack_years: f64,
    pub radon_exposure: ExposureLevel,
    pub asbestos_exposure: bool,
    pub secondhand_smoke_exposure: bool,
    pub copd_diagnosis: bool,
    pub alcohol_consumption: AlcoholConsumption,
    pub family_history: bool,
}

impl FeatureVector {
    /// Check the numeric domains. Categorical fields are valid by construction.
    pub fn validate(&self) -> RiskResult<()> {
        for (field, value) in [("age", self.age), ("pack_years", self.pack_years)] {
            if !value.is_finite() {
                return Err(RiskError::invalid_feature(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(RiskError::invalid_feature(field, "must be non-negative"));
            }
        }
        Ok(())
    }

    /// Numeric encoding of every feature, keyed by name, in [`FEATURE_ORDER`].
    ///
    /// Numeric fields are returned unscaled; standardization belongs to the scorer.
    pub fn encoded(&self) -> [(&'static str, f64); 9] {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        [
            ("age", self.age),
            ("gender", self.gender.encode()),
            ("pack_years", self.pack_years),
            ("radon_exposure", self.radon_exposure.encode()),
            ("asbestos_exposure", flag(self.asbestos_exposure)),
            ("secondhand_smoke_exposure", flag(self.secondhand_smoke_exposure)),
            ("copd_diagnosis", flag(self.copd_diagnosis)),
            ("alcohol_consumption", self.alcohol_consumption.encode()),
            ("family_history", flag(self.family_history)),
        ]
    }
}

/// Outcome of one scoring request, serialized once and then dropped.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PredictionResult {
    pub raw_probability: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_probability: Option<f64>,
    pub used_adjustment: bool,
    pub pi_train: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pi_deploy: Option<f64>,
    /// Set when the raw or adjusted probability had to be pulled off 0 or 1.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub probability_clamped: bool,
}
