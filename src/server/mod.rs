// ============================================================
// Layer 1 — HTTP Boundary
// ============================================================
//
//   POST /LeNet/Train    → retrain, 200 with empty body
//   POST /LeNet/Predict  → multipart upload, 200 with the digit
//                          as a JSON number
//
// Status mapping for predict:
//   400  no file bytes supplied, or the image does not decode
//   503  no model has been built or trained yet
//   500  anything else
//
// One PredictUseCase sits behind a Mutex; engine work runs on
// the blocking pool so the async workers stay free. A train
// request holds the lock until fitting finishes, so concurrent
// predicts wait.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use crate::application::predict_use_case::PredictUseCase;
use crate::domain::error::DigitError;

type SharedUseCase = Arc<Mutex<PredictUseCase>>;

pub fn router(use_case: PredictUseCase) -> Router {
    Router::new()
        .route("/LeNet/Train", post(train))
        .route("/LeNet/Predict", post(predict))
        .with_state(Arc::new(Mutex::new(use_case)))
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, use_case: PredictUseCase) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(use_case))
        .await
        .context("HTTP server stopped unexpectedly")
}

async fn train(State(state): State<SharedUseCase>) -> Result<StatusCode, ApiError> {
    tracing::info!("POST /LeNet/Train");
    run_blocking(state, |uc| uc.train()).await?;
    Ok(StatusCode::OK)
}

async fn predict(
    State(state): State<SharedUseCase>,
    mut multipart: Multipart,
) -> Result<Json<usize>, ApiError> {
    let bytes = first_upload(&mut multipart).await?;
    if bytes.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "No file was uploaded."));
    }
    tracing::info!("POST /LeNet/Predict ({} bytes)", bytes.len());

    let digit = run_blocking(state, move |uc| uc.predict_image(&bytes)).await?;
    Ok(Json(digit))
}

/// Bytes of the first multipart field that carries any.
async fn first_upload(multipart: &mut Multipart) -> Result<Bytes, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?
    {
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;
        if !data.is_empty() {
            return Ok(data);
        }
    }
    Ok(Bytes::new())
}

async fn run_blocking<T, F>(state: SharedUseCase, job: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut PredictUseCase) -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut use_case = state
            .lock()
            .map_err(|_| anyhow::anyhow!("classifier lock poisoned by an earlier panic"))?;
        job(&mut use_case)
    })
    .await
    .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, format!("worker task failed: {e}")))?
    .map_err(ApiError::from)
}

// ─── Error Responses ─────────────────────────────────────────────────────────
#[derive(Debug)]
pub struct ApiError {
    status:  StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = match err.downcast_ref::<DigitError>() {
            Some(DigitError::Decode(_))     => StatusCode::BAD_REQUEST,
            Some(DigitError::ModelNotBuilt) => StatusCode::SERVICE_UNAVAILABLE,
            _                               => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{} {}", self.status, self.message);
        } else {
            tracing::warn!("{} {}", self.status, self.message);
        }
        (self.status, self.message).into_response()
    }
}
