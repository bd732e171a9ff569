//! HTTP boundary for the lung cancer risk service.
//!
//! Decodes feature payloads, scores them, applies the prevalence correction
//! and wraps every answer in an [`ApiResponse`] envelope.

pub mod config;
mod extract;
mod model_routes;
mod predict_routes;
mod request_id;
mod security_headers;


use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Request,
    },
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    Json, Router,
};
use chrono::{DateTime, Utc};
use prevalence_recalibrator::{PrevalenceRecalibrator, RecalibrationConfig};
use risk_core::{RiskError, Scorer};
use risk_model::{LogisticScorer, ModelMeta};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

pub use config::ServerConfig;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub scorer: Arc<dyn Scorer>,
    pub recalibrator: Arc<PrevalenceRecalibrator>,
    /// Present when the scorer was loaded from an artifact
    pub meta: Option<Arc<ModelMeta>>,
}

impl AppState {
    /// Wire a scorer to a recalibrator; `PI_TRAIN`/`PI_DEPLOY` from config win
    /// over the scorer's recorded prevalence.
    pub fn new(scorer: Arc<dyn Scorer>, config: &ServerConfig) -> Self {
        let pi_train = config.pi_train.unwrap_or_else(|| scorer.training_prior());
        let recalibrator = PrevalenceRecalibrator::new(
            RecalibrationConfig::new(pi_train).with_default_pi_deploy(config.pi_deploy),
        );
        Self {
            scorer,
            recalibrator: Arc::new(recalibrator),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: ModelMeta) -> Self {
        self.meta = Some(Arc::new(meta));
        self
    }
}

/// Standard JSON envelope for every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Handler error: an `anyhow` chain plus an optional explicit status.
#[derive(Debug)]
pub struct AppError {
    status: Option<StatusCode>,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: impl Into<anyhow::Error>) -> Self {
        Self {
            status: Some(status),
            error: error.into(),
        }
    }

    fn status(&self) -> StatusCode {
        if let Some(status) = self.status {
            return status;
        }
        if let Some(rejection) = self.error.downcast_ref::<JsonRejection>() {
            return rejection.status();
        }
        if let Some(rejection) = self.error.downcast_ref::<QueryRejection>() {
            return rejection.status();
        }
        match self.error.downcast_ref::<RiskError>() {
            Some(RiskError::InvalidPrior { .. }) => StatusCode::BAD_REQUEST,
            Some(RiskError::InvalidFeature { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(error: E) -> Self {
        Self {
            status: None,
            error: error.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self.error, "request failed");
        } else {
            tracing::debug!(error = %self.error, %status, "request rejected");
        }
        let body = ApiResponse::<()>::error(format!("{:#}", self.error));
        (status, Json(body)).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Lung Cancer Risk API"),
    paths(
        model_routes::health,
        model_routes::model_info,
        predict_routes::predict,
        predict_routes::recalibrate,
    ),
    components(schemas(
        predict_routes::RecalibrateRequest,
        risk_core::FeatureVector,
        risk_core::PredictionResult,
    ))
)]
struct ApiDoc;

async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Full router with middleware, ready to serve.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        tracing::info_span!(
            "http",
            method = %req.method(),
            uri = %req.uri(),
            request_id = tracing::field::Empty,
        )
    });

    Router::new()
        .merge(model_routes::model_routes())
        .merge(predict_routes::predict_routes())
        .route("/api-docs/openapi.json", axum::routing::get(openapi_spec))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(trace)
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id::request_id_middleware))
                .layer(middleware::from_fn_with_state(
                    config.enable_hsts,
                    security_headers::security_headers_middleware,
                )),
        )
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_scorer(config: &ServerConfig) -> anyhow::Result<LogisticScorer> {
    let scorer = match &config.model_path {
        Some(path) => LogisticScorer::from_path(path)?,
        None => {
            tracing::warn!("RISK_MODEL_PATH not set, using bundled reference model");
            LogisticScorer::reference()?
        }
    };
    Ok(scorer)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(config.json_logging);

    let scorer = load_scorer(&config)?;
    let meta = scorer.meta().clone();
    let state = AppState::new(Arc::new(scorer), &config).with_meta(meta);

    let recal = state.recalibrator.config();
    tracing::info!(
        model = state.scorer.model_name(),
        pi_train = recal.pi_train.value(),
        pi_deploy = ?recal.default_pi_deploy.map(|p| p.value()),
        "risk model ready"
    );

    let app = build_router(state, &config);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
