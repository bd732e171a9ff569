//! Prediction API Routes
//!
//! Score a feature payload and optionally rescale the result to the
//! prevalence of the population being served.

use axum::{extract::State, http::StatusCode, routing::post, Extension, Json, Router};
use risk_core::{FeatureVector, PredictionResult};
use risk_model::decode_features;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::extract::{ApiJson, ApiQuery};
use crate::request_id::RequestId;
use crate::{ApiResponse, AppError, AppState};

/// Feature payload plus optional priors, all at the top level.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub pi_deploy: Option<f64>,
    #[serde(default)]
    pub pi_train: Option<f64>,
    #[serde(flatten)]
    pub features: Map<String, Value>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PredictQuery {
    /// Target prevalence; the request body takes precedence
    pub pi_deploy: Option<f64>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct RecalibrateRequest {
    pub raw_probability: f64,
    pub pi_train: Option<f64>,
    pub pi_deploy: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    #[serde(flatten)]
    pub result: PredictionResult,
    pub raw_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_percent: Option<f64>,
    pub model: String,
}

impl PredictResponse {
    fn new(result: PredictionResult, model: &str) -> Self {
        Self {
            raw_percent: to_percent(result.raw_probability),
            adjusted_percent: result.adjusted_probability.map(to_percent),
            model: model.to_string(),
            result,
        }
    }
}

fn to_percent(p: f64) -> f64 {
    (p * 10_000.0).round() / 100.0
}

pub fn predict_routes() -> Router<AppState> {
    Router::new()
        .route("/api/predict", post(predict))
        .route("/api/recalibrate", post(recalibrate))
}

/// Score risk factors and rescale to the deployment prevalence
#[utoipa::path(
    post,
    path = "/api/predict",
    params(PredictQuery),
    request_body(
        content = FeatureVector,
        description = "Risk factors, plus optional pi_deploy and pi_train at the top level"
    ),
    responses(
        (status = 200, description = "Raw and prevalence-adjusted probability"),
        (status = 400, description = "pi_train or pi_deploy outside (0, 1), or malformed JSON"),
        (status = 422, description = "Missing or invalid risk factor")
    ),
    tag = "Prediction"
)]
pub async fn predict(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    ApiQuery(query): ApiQuery<PredictQuery>,
    ApiJson(req): ApiJson<PredictRequest>,
) -> Result<Json<ApiResponse<PredictResponse>>, AppError> {
    let features = decode_features(&req.features)?;
    let p_raw = state.scorer.score(&features)?;

    let pi_deploy = req.pi_deploy.or(query.pi_deploy);
    let result = state.recalibrator.adjust(p_raw, req.pi_train, pi_deploy)?;

    tracing::info!(
        %request_id,
        p_raw,
        p_adjusted = ?result.adjusted_probability,
        pi_deploy = ?result.pi_deploy,
        "scored prediction"
    );

    Ok(Json(ApiResponse::success(PredictResponse::new(
        result,
        state.scorer.model_name(),
    ))))
}

/// Rescale an already computed probability
#[utoipa::path(
    post,
    path = "/api/recalibrate",
    request_body = RecalibrateRequest,
    responses(
        (status = 200, description = "Prevalence-adjusted probability"),
        (status = 400, description = "Probability or prior out of range")
    ),
    tag = "Prediction"
)]
pub async fn recalibrate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RecalibrateRequest>,
) -> Result<Json<ApiResponse<PredictionResult>>, AppError> {
    // Here the probability comes from the caller, not the scorer
    if !(0.0..=1.0).contains(&req.raw_probability) {
        return Err(AppError::with_status(
            StatusCode::BAD_REQUEST,
            anyhow::anyhow!("raw_probability {} is outside [0, 1]", req.raw_probability),
        ));
    }

    let result = state
        .recalibrator
        .adjust(req.raw_probability, req.pi_train, req.pi_deploy)?;
    Ok(Json(ApiResponse::success(result)))
}
