//! Public mock surface.
//!
//! `GET /api/mock/:id` serves the stored dataset and `/api/mock/:id/*path`
//! answers from the declared endpoints. Dataset writes on `/api/mock/:id` are
//! owner-scoped.

use axum::{
    extract::{OriginalUri, Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapters::api_handler::{owner, ApiResponse, ApiResult, ApiState};
use crate::application::MockOutcome;
use crate::domain::auth::AuthContext;

/// Body of a dataset replacement.
#[derive(Debug, Deserialize)]
pub struct DatasetBody {
    #[serde(default)]
    pub data: Value,
}

/// Path seen by the mock router for a request under `/api/mock/{id}`.
///
/// The query string is removed, the path is percent-decoded, the prefix is
/// stripped and a leading `/` is ensured. `id` is the decoded path parameter.
/// Trailing slashes are kept, so `/users/` and `/users` stay distinct.
pub fn normalize_mock_path(request_path: &str, id: &str) -> String {
    let without_query = request_path.split('?').next().unwrap_or_default();
    let decoded = urlencoding::decode(without_query)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| without_query.to_string());
    let prefix = format!("/api/mock/{}", id);
    let rest = decoded.strip_prefix(prefix.as_str()).unwrap_or(&decoded);

    if rest.starts_with('/') {
        rest.to_string()
    } else {
        format!("/{}", rest)
    }
}

pub async fn get_dataset(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let dataset = state.service.mock_dataset(&id).await?;
    Ok(Json(dataset.to_value()))
}

pub async fn replace_dataset(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(body): Json<DatasetBody>,
) -> ApiResult<impl IntoResponse> {
    let summary = state
        .service
        .replace_dataset(owner(&auth)?, &id, &body.data)
        .await?;
    Ok(Json(ApiResponse::success(summary)))
}

pub async fn clear_dataset(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let summary = state.service.clear_dataset(owner(&auth)?, &id).await?;
    Ok(Json(ApiResponse::success(summary)))
}

/// Answer any method under `/api/mock/:id/*path` from the declared endpoints.
pub async fn route_mock(
    State(state): State<ApiState>,
    Path((id, _)): Path<(String, String)>,
    OriginalUri(uri): OriginalUri,
    method: Method,
) -> ApiResult<Response> {
    let path = normalize_mock_path(uri.path(), &id);

    let response = match state.service.serve_mock(&id, &path, method.as_str()).await? {
        MockOutcome::Hit(body) => Json(body).into_response(),
        MockOutcome::Miss(not_found) => {
            let body = ApiResponse::<()>::error(not_found.to_string())
                .with_details(Some(json!(not_found)));
            (StatusCode::NOT_FOUND, Json(body)).into_response()
        }
    };
    Ok(response)
}
