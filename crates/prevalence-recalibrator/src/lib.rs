//! Prevalence Recalibrator
//!
//! Rescales a classifier probability calibrated under the training class
//! prior to the class prior of the population being served, holding the
//! classifier's likelihood ratio fixed.

pub mod recalibrator;

pub use recalibrator::{
    adjust, adjust_probability, AdjustedProbability, PrevalenceRecalibrator,
    RecalibrationConfig, DEFAULT_EPSILON,
};
