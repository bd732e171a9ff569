use crate::{FeatureVector, Prior, RiskResult};

/// A pre-trained classifier that maps a validated feature vector to the
/// probability of the positive class.
///
/// Probabilities are calibrated under the class balance of the training set,
/// which the scorer reports through [`Scorer::training_prior`].
pub trait Scorer: Send + Sync {
    fn score(&self, features: &FeatureVector) -> RiskResult<f64>;

    fn training_prior(&self) -> Prior;

    /// Expected feature names in model input order. Introspection only.
    fn feature_order(&self) -> &[String];

    fn model_name(&self) -> &str {
        "unnamed"
    }
}
