use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerColumn {
    pub mean: f64,
    pub scale: f64,
}

/// Per-column z-score standardization fitted on the training data.
///
/// Columns without an entry pass through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StandardScaler {
    columns: BTreeMap<String, ScalerColumn>,
}

impl StandardScaler {
    pub fn new(columns: BTreeMap<String, ScalerColumn>) -> Self {
        Self { columns }
    }

    pub fn transform(&self, name: &str, value: f64) -> f64 {
        match self.columns.get(name) {
            // Constant training columns have scale 0
            Some(col) if col.scale == 0.0 => value - col.mean,
            Some(col) => (value - col.mean) / col.scale,
            None => value,
        }
    }
}
