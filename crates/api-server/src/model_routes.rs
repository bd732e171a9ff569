//! Liveness and model introspection.

use axum::{extract::State, routing::get, Json, Router};
use risk_model::ModelMeta;
use serde::Serialize;

use crate::{ApiResponse, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
}

#[derive(Serialize)]
pub struct ModelInfoResponse {
    pub model_name: String,
    pub feature_order: Vec<String>,
    /// Prevalence the scorer was trained under
    pub training_prevalence: f64,
    /// Prevalence the recalibrator actually assumes for training
    pub effective_pi_train: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_pi_deploy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelMeta>,
}

pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/model", get(model_info))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up and a model is loaded")),
    tag = "Model"
)]
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "ok",
        model: state.scorer.model_name().to_string(),
        model_version: state.meta.as_ref().map(|m| m.model_version.clone()),
    }))
}

#[utoipa::path(
    get,
    path = "/api/model",
    responses((status = 200, description = "Feature order, priors and training metadata")),
    tag = "Model"
)]
pub async fn model_info(State(state): State<AppState>) -> Json<ApiResponse<ModelInfoResponse>> {
    let recal = state.recalibrator.config();
    Json(ApiResponse::success(ModelInfoResponse {
        model_name: state.scorer.model_name().to_string(),
        feature_order: state.scorer.feature_order().to_vec(),
        training_prevalence: state.scorer.training_prior().value(),
        effective_pi_train: recal.pi_train.value(),
        default_pi_deploy: recal.default_pi_deploy.map(|p| p.value()),
        details: state.meta.as_deref().cloned(),
    }))
}
