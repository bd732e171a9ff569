use thiserror::Error;

/// Which of the two class priors a validation failure refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorKind {
    Train,
    Deploy,
}

impl PriorKind {
    pub fn key(&self) -> &'static str {
        match self {
            PriorKind::Train => "pi_train",
            PriorKind::Deploy => "pi_deploy",
        }
    }
}

impl std::fmt::Display for PriorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Invalid prior {kind}: {value} is not strictly between 0 and 1")]
    InvalidPrior { kind: PriorKind, value: f64 },

    #[error("Invalid feature '{field}': {reason}")]
    InvalidFeature { field: String, reason: String },

    #[error("Scorer contract violation: {0}")]
    ScorerContract(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RiskError {
    pub fn invalid_feature(field: impl Into<String>, reason: impl Into<String>) -> Self {
        RiskError::InvalidFeature {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for errors caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RiskError::InvalidPrior { .. } | RiskError::InvalidFeature { .. }
        )
    }
}

pub type RiskResult<T> = Result<T, RiskError>;
