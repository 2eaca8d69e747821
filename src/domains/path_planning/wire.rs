//! JSON messages exchanged with an out-of-process path worker.
//!
//! Request: `{ start, end, resolution?, bufferValue?, obstacles }` with GeoJSON
//! Point geometries and a Polygon feature collection in geodetic coordinates.
//! Reply: `{ path: Feature<LineString> }` or `{ error, kind }`.

use super::engine::PathEngine;
use super::request::{
    CancelToken, EngineError, PathOutcome, PathRequest, PathResult, RequestId, RoutingParams,
    DEFAULT_BUFFER, DEFAULT_RESOLUTION,
};
use crate::domains::geometry::features;
use geojson::{Feature, FeatureCollection, Geometry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerData {
    pub start: Geometry,
    pub end: Geometry,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub via: Vec<Geometry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffer_value: Option<f64>,
    pub obstacles: FeatureCollection,
}

impl WorkerData {
    pub fn from_request(request: &PathRequest) -> Self {
        Self {
            start: features::point_to_geometry(request.start),
            end: features::point_to_geometry(request.end),
            via: request.via.iter().map(|p| features::point_to_geometry(*p)).collect(),
            resolution: Some(request.params.resolution),
            buffer_value: Some(request.params.buffer),
            obstacles: features::obstacles_to_collection(&request.obstacles),
        }
    }

    pub fn into_request(self, id: RequestId) -> Result<PathRequest, EngineError> {
        let start = features::point_from_geometry(&self.start)?;
        let end = features::point_from_geometry(&self.end)?;
        let via = self
            .via
            .iter()
            .map(features::point_from_geometry)
            .collect::<Result<Vec<_>, _>>()?;
        let obstacles = features::obstacles_from_collection(&self.obstacles)?;
        let params = RoutingParams {
            resolution: self.resolution.unwrap_or(DEFAULT_RESOLUTION),
            buffer: self.buffer_value.unwrap_or(DEFAULT_BUFFER),
        };
        Ok(PathRequest::new(id, start, end, obstacles, params).with_via(via))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub path: Feature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkerErrorKind {
    InvalidParameter,
    NoPathFound,
    Cancelled,
    InternalFault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerError {
    pub error: String,
    pub kind: WorkerErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerReply {
    Path(WorkerResponse),
    Error(WorkerError),
}

impl WorkerReply {
    fn error(kind: WorkerErrorKind, error: impl Into<String>) -> Self {
        WorkerReply::Error(WorkerError {
            error: error.into(),
            kind,
        })
    }

    pub fn from_engine(result: Result<crate::domains::geometry::LinePath, EngineError>) -> Self {
        match result {
            Ok(path) => WorkerReply::Path(WorkerResponse {
                path: features::line_to_feature(&path),
            }),
            Err(e @ EngineError::InvalidParameter(_)) => {
                Self::error(WorkerErrorKind::InvalidParameter, e.to_string())
            }
            Err(e @ EngineError::NoPathFound) => Self::error(WorkerErrorKind::NoPathFound, e.to_string()),
            Err(e @ EngineError::Cancelled) => Self::error(WorkerErrorKind::Cancelled, e.to_string()),
        }
    }

    /// Translate a reply back into the outcome of request `request_id`.
    pub fn into_result(self, request_id: RequestId) -> PathResult {
        let outcome = match self {
            WorkerReply::Path(response) => match features::line_from_feature(&response.path) {
                Ok(path) => PathOutcome::Found(path),
                Err(e) => PathOutcome::Failed(e.to_string()),
            },
            WorkerReply::Error(error) => match error.kind {
                WorkerErrorKind::NoPathFound => PathOutcome::NotFound,
                WorkerErrorKind::Cancelled => PathOutcome::Cancelled,
                WorkerErrorKind::InvalidParameter => PathOutcome::Failed(error.error),
                WorkerErrorKind::InternalFault => PathOutcome::Failed("internal error".to_string()),
            },
        };
        PathResult {
            request_id,
            outcome,
        }
    }
}

/// Run one decoded message through the engine.
pub fn handle_message(engine: &dyn PathEngine, data: WorkerData) -> WorkerReply {
    let result = data
        .into_request(0)
        .and_then(|request| engine.compute(&request, &CancelToken::new()));
    WorkerReply::from_engine(result)
}

/// Decode one JSON line, compute, and encode the reply as one JSON line.
pub fn handle_line(engine: &dyn PathEngine, line: &str) -> String {
    let reply = match serde_json::from_str::<WorkerData>(line) {
        Ok(data) => handle_message(engine, data),
        Err(e) => WorkerReply::error(
            WorkerErrorKind::InvalidParameter,
            format!("malformed worker message: {}", e),
        ),
    };
    serde_json::to_string(&reply).unwrap_or_else(|e| {
        format!(
            r#"{{"error":"failed to encode reply: {}","kind":"internalFault"}}"#,
            e.to_string().replace('"', "'")
        )
    })
}
