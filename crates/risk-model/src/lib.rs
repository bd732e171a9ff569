//! In-process lung cancer risk scorer.
//!
//! Decodes loosely-typed request payloads into [`risk_core::FeatureVector`],
//! standardizes numeric columns with the training scaler and scores with a
//! logistic model, optionally followed by an isotonic calibration table.

pub mod encoding;
pub mod logistic;
pub mod meta;
pub mod scaler;

pub use encoding::decode_features;
pub use logistic::{LogisticScorer, ModelArtifact};
pub use meta::ModelMeta;
pub use scaler::{ScalerColumn, StandardScaler};
