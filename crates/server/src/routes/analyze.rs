use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Bytes, extract::Query, http::HeaderMap, Extension, Json};
use serde_json::Value as JsonValue;

use crate::config::Config;
use crate::engine::{AnalysisReport, EngineAdapter};
use crate::error::AppError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const DEFAULT_TASK_ID: &str = "defaultTaskId";
const MISSING_FEN: &str = "Please pass a FEN string in the request body \
    (e.g., {\"fen\": \"your_fen_string\"}) or as a query parameter 'fen'.";

/// Position and depth pulled out of an eval request.
#[derive(Debug, PartialEq, Eq)]
pub struct EvalRequest {
    pub fen: String,
    pub depth: u32,
}

/// GET|POST /api/stockfish_eval
/// Analyse a FEN with a fresh engine process. `fen` and `depth` come from the
/// JSON body or the query string; the body wins.
pub async fn stockfish_eval(
    Extension(config): Extension<Config>,
    Extension(adapter): Extension<Arc<EngineAdapter>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<Json<AnalysisReport>, AppError> {
    tracing::info!("Processing stockfish_eval request");

    let request = parse_request(&body, &params, config.default_depth, config.max_depth)?;

    // Validate before any process is started.
    let position = chess_core::parse_fen(&request.fen)
        .map_err(|e| AppError::BadRequest(format!("Invalid FEN string provided: {e}")))?;

    let task_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_TASK_ID)
        .to_string();

    // Run on its own task so a panic becomes a 500 instead of a dropped connection.
    let fen = request.fen.clone();
    let depth = request.depth;
    let handle = tokio::spawn(async move { adapter.analyze(&fen, &position, depth).await });
    let mut report = match handle.await {
        Ok(result) => result?,
        Err(e) => {
            tracing::error!(fen = %request.fen, "analysis task failed: {e}");
            return Err(AppError::Internal(e.to_string()));
        }
    };

    report.task_id = Some(task_id);
    Ok(Json(report))
}

/// Pull `fen` and `depth` out of the body, falling back to the query string.
pub fn parse_request(
    body: &[u8],
    params: &HashMap<String, String>,
    default_depth: u32,
    max_depth: u32,
) -> Result<EvalRequest, AppError> {
    let body: Option<JsonValue> = serde_json::from_slice(body).ok();
    let body = body.as_ref().and_then(|b| b.as_object());

    let mut fen = body
        .and_then(|b| b.get("fen"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .map(String::from);
    let mut depth = match body.and_then(|b| b.get("depth")) {
        None | Some(JsonValue::Null) => None,
        Some(v) => Some(depth_from_json(v)?),
    };

    if fen.is_none() {
        fen = params
            .get("fen")
            .filter(|s| !s.trim().is_empty())
            .cloned();
        if let Some(raw) = params.get("depth").filter(|s| !s.is_empty()) {
            depth = Some(parse_depth(raw)?);
        }
    }

    let fen = fen.ok_or_else(|| AppError::BadRequest(MISSING_FEN.to_string()))?;
    let depth = depth.unwrap_or(i64::from(default_depth));
    if depth < 1 {
        return Err(AppError::BadRequest(format!(
            "depth must be a positive integer, got {depth}"
        )));
    }

    Ok(EvalRequest {
        fen,
        depth: depth.min(i64::from(max_depth)) as u32,
    })
}

fn depth_from_json(value: &JsonValue) -> Result<i64, AppError> {
    match value {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| AppError::BadRequest(format!("depth must be an integer, got {n}"))),
        JsonValue::String(s) => parse_depth(s),
        other => Err(AppError::BadRequest(format!(
            "depth must be an integer, got {other}"
        ))),
    }
}

fn parse_depth(raw: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("depth must be an integer, got '{raw}'")))
}
