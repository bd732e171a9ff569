//! Request payload decoding
//!
//! Clients send whatever their form produced: booleans as `true`, `1`,
//! `"yes"` or `"Y"`, numbers as numbers or numeric strings. Everything is
//! normalized here into a typed [`FeatureVector`].

use risk_core::{
    AlcoholConsumption, ExposureLevel, FeatureVector, Gender, RiskError, RiskResult,
};
use serde_json::{Map, Value};

/// Decode and validate a feature payload. Unknown keys are ignored.
pub fn decode_features(payload: &Map<String, Value>) -> RiskResult<FeatureVector> {
    let features = FeatureVector {
        age: number(payload, "age")?,
        gender: gender(payload, "gender")?,
        pack_years: number(payload, "pack_years")?,
        radon_exposure: exposure(payload, "radon_exposure")?,
        asbestos_exposure: flag(payload, "asbestos_exposure")?,
        secondhand_smoke_exposure: flag(payload, "secondhand_smoke_exposure")?,
        copd_diagnosis: flag(payload, "copd_diagnosis")?,
        alcohol_consumption: alcohol(payload, "alcohol_consumption")?,
        family_history: flag(payload, "family_history")?,
    };
    features.validate()?;
    Ok(features)
}

fn required<'a>(payload: &'a Map<String, Value>, field: &str) -> RiskResult<&'a Value> {
    match payload.get(field) {
        None | Some(Value::Null) => Err(RiskError::invalid_feature(field, "is required")),
        Some(v) => Ok(v),
    }
}

fn number(payload: &Map<String, Value>, field: &str) -> RiskResult<f64> {
    let value = match required(payload, field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.ok_or_else(|| RiskError::invalid_feature(field, "expected a number"))
}

/// Accepts JSON booleans, 0/1 and the usual yes/no spellings.
pub fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(true),
            Some(x) if x == 0.0 => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "t" | "1" => Some(true),
            "no" | "n" | "false" | "f" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn flag(payload: &Map<String, Value>, field: &str) -> RiskResult<bool> {
    parse_flag(required(payload, field)?)
        .ok_or_else(|| RiskError::invalid_feature(field, "expected yes/no, true/false or 1/0"))
}

fn label(payload: &Map<String, Value>, field: &str) -> RiskResult<Option<String>> {
    match payload.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_ascii_lowercase())),
        Some(_) => Err(RiskError::invalid_feature(field, "expected a string")),
    }
}

fn gender(payload: &Map<String, Value>, field: &str) -> RiskResult<Gender> {
    match label(payload, field)?.as_deref() {
        Some("male" | "m") => Ok(Gender::Male),
        Some("female" | "f") => Ok(Gender::Female),
        None => Err(RiskError::invalid_feature(field, "is required")),
        Some(other) => Err(RiskError::invalid_feature(
            field,
            format!("unknown value '{other}', expected male or female"),
        )),
    }
}

fn exposure(payload: &Map<String, Value>, field: &str) -> RiskResult<ExposureLevel> {
    match label(payload, field)?.as_deref() {
        Some("low") => Ok(ExposureLevel::Low),
        Some("medium") => Ok(ExposureLevel::Medium),
        Some("high") => Ok(ExposureLevel::High),
        None => Err(RiskError::invalid_feature(field, "is required")),
        Some(other) => Err(RiskError::invalid_feature(
            field,
            format!("unknown level '{other}', expected low, medium or high"),
        )),
    }
}

fn alcohol(payload: &Map<String, Value>, field: &str) -> RiskResult<AlcoholConsumption> {
    match label(payload, field)?.as_deref() {
        // Missing means the respondent does not drink
        None | Some("none" | "") => Ok(AlcoholConsumption::None),
        Some("moderate") => Ok(AlcoholConsumption::Moderate),
        Some("heavy") => Ok(AlcoholConsumption::Heavy),
        Some(other) => Err(RiskError::invalid_feature(
            field,
            format!("unknown level '{other}', expected none, moderate or heavy"),
        )),
    }
}
