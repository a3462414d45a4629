//! Canvas drawing records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A stored drawing
///
/// `canvas_data` is opaque: whatever JSON the client uploaded is returned
/// verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasRecord {
    pub id: Uuid,
    pub email: String,
    pub drawing_name: String,
    pub canvas_data: Value,
    pub created_at: DateTime<Utc>,
}

/// List-by-owner projection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSummary {
    pub drawing_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&CanvasRecord> for CanvasSummary {
    fn from(record: &CanvasRecord) -> Self {
        Self {
            drawing_name: record.drawing_name.clone(),
            created_at: record.created_at,
        }
    }
}

/// Outcome of an upsert
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted {
    pub record: CanvasRecord,
    /// `true` when no record with this drawing name existed before
    pub created: bool,
}
