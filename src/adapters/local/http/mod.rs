//! HTTP inbound adapter.
//!
//! Lets the asset store (or an operator) trigger and tear down pipelines and
//! inspect job state over plain JSON.

use super::events::hub::EventHub;
use super::events::AssetEvent;
use crate::application::pipeline::PipelineTrigger;
use crate::application::scheduler::Scheduler;
use crate::domain::asset::{AssetId, VideoAsset};
use crate::domain::error::PipelineError;
use crate::domain::jobs::TranscodeJob;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone)]
pub struct AppState {
    pub trigger: Arc<dyn PipelineTrigger>,
    pub scheduler: Scheduler,
    pub events: EventHub,
}

/// Body of `DELETE /assets/:id`. The asset row is already gone, so the
/// paths to clean up come with the request.
#[derive(Debug, Deserialize)]
pub struct DeleteAsset {
    pub source_path: PathBuf,
    #[serde(default)]
    pub thumbnail_path: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::AlreadyProcessing(_) => StatusCode::CONFLICT,
            PipelineError::QueueUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::MissingInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PipelineError::UnknownJob(_) | PipelineError::UnknownDependency(_) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self.0, "Request failed");
        }
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/assets", post(create_asset))
        .route("/assets/:id", axum::routing::delete(delete_asset))
        .route("/assets/:id/jobs", get(asset_jobs))
        .route("/events", post(publish_event))
        .with_state(state)
}

async fn create_asset(
    State(state): State<AppState>,
    Json(asset): Json<VideoAsset>,
) -> Result<impl IntoResponse, ApiError> {
    let run = state.trigger.on_created(asset).await?;
    Ok((StatusCode::ACCEPTED, Json(run)))
}

async fn delete_asset(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<DeleteAsset>,
) -> Result<StatusCode, ApiError> {
    let asset = VideoAsset {
        id: AssetId(id),
        source_path: body.source_path,
        thumbnail_path: body.thumbnail_path,
    };
    state.trigger.on_deleted(asset).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn asset_jobs(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<Vec<TranscodeJob>> {
    Json(state.scheduler.jobs_for_asset(AssetId(id)))
}

/// Fire-and-forget entry point for lifecycle signals. The listener does the work.
async fn publish_event(
    State(state): State<AppState>,
    Json(event): Json<AssetEvent>,
) -> Result<StatusCode, ApiError> {
    state.events.publish(event).map_err(|_| {
        ApiError(PipelineError::QueueUnavailable(
            "no event listener running".to_string(),
        ))
    })?;
    Ok(StatusCode::ACCEPTED)
}
