//! Canvas endpoints - upsert, list by owner, fetch by owner and name
//!
//! Every route here sits behind the connection guard.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::error::ApiError;
use crate::http::extractors::{require_connection, ConnectedStore};
use crate::http::server::AppState;
use crate::models::{CanvasRecord, CanvasSummary, DrawingName, Email, ValidationError};

/// Upsert request body
///
/// Fields are optional here so that a missing field surfaces as a
/// validation message rather than a generic deserialization failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertCanvasRequest {
    pub email: Option<String>,
    pub drawing_name: Option<String>,
    pub canvas_data: Option<Value>,
}

/// Validated upsert input
#[derive(Debug)]
pub struct CanvasUpload {
    pub email: Email,
    pub drawing_name: DrawingName,
    pub canvas_data: Value,
}

impl UpsertCanvasRequest {
    pub fn validate(self) -> Result<CanvasUpload, ValidationError> {
        let email = self.email.ok_or(ValidationError::Missing { field: "email" })?;
        let drawing_name = self.drawing_name.ok_or(ValidationError::Missing {
            field: "drawingName",
        })?;
        // `null` deserializes to None as well, so it is rejected like a missing field.
        let canvas_data = self.canvas_data.ok_or(ValidationError::Missing {
            field: "canvasData",
        })?;

        Ok(CanvasUpload {
            email: Email::new(&email)?,
            drawing_name: DrawingName::new(&drawing_name)?,
            canvas_data,
        })
    }
}

/// Upsert response
#[derive(Debug, Serialize)]
pub struct UpsertCanvasResponse {
    pub message: &'static str,
    pub canvas: CanvasRecord,
}

/// POST /canvas - create or replace a drawing
async fn upsert_canvas(
    ConnectedStore(store): ConnectedStore,
    body: Result<Json<UpsertCanvasRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UpsertCanvasResponse>), ApiError> {
    let Json(req) = body?;
    let upload = req.validate()?;

    let upserted = store
        .upsert(&upload.email, &upload.drawing_name, upload.canvas_data)
        .await
        .map_err(ApiError::WriteRejected)?;

    tracing::info!(
        drawing_name = %upserted.record.drawing_name,
        email = %upserted.record.email,
        created = upserted.created,
        "Canvas saved"
    );

    let (status, message) = if upserted.created {
        (StatusCode::CREATED, "Canvas created")
    } else {
        (StatusCode::OK, "Canvas updated")
    };

    Ok((
        status,
        Json(UpsertCanvasResponse {
            message,
            canvas: upserted.record,
        }),
    ))
}

/// GET /canvas/{email} - drawings owned by `email`, newest first
async fn list_canvases(
    ConnectedStore(store): ConnectedStore,
    Path(email): Path<String>,
) -> Result<Json<Vec<CanvasSummary>>, ApiError> {
    let canvases = store
        .list_by_email(&email)
        .await
        .map_err(|e| ApiError::store("Failed to list canvases", e))?;

    Ok(Json(canvases))
}

/// GET /canvas/{email}/{drawing_name} - the stored canvas data, verbatim
async fn get_canvas(
    ConnectedStore(store): ConnectedStore,
    Path((email, drawing_name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let record = store
        .find(&email, &drawing_name)
        .await
        .map_err(|e| ApiError::store("Failed to load canvas", e))?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(record.canvas_data))
}

/// Canvas routes, wrapped in the connection guard
pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/canvas", post(upsert_canvas))
        .route("/canvas/{email}", get(list_canvases))
        .route("/canvas/{email}/{drawing_name}", get(get_canvas))
        .route_layer(middleware::from_fn_with_state(state, require_connection))
}
