//! REST API handlers for definition management
//!
//! Owner-scoped CRUD over definitions and their endpoints, plus generation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{DefinitionService, GenerateRequest, ServiceError};
use crate::domain::auth::AuthContext;
use crate::domain::{DefinitionUpdate, NewDefinition, NewEndpoint};

/// Shared application state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<DefinitionService>,
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            details: None,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }
}

impl ApiResponse<()> {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
            details: None,
        }
    }
}

/// Service failure rendered as the error envelope.
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else if status == StatusCode::BAD_GATEWAY || status == StatusCode::GATEWAY_TIMEOUT {
            tracing::warn!("Upstream failure: {}", self.0);
        }
        let body = ApiResponse::<()>::error(self.0.to_string()).with_details(self.0.details());
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Owner id of an identified caller.
pub fn owner(auth: &AuthContext) -> Result<&str, ApiError> {
    auth.owner_id().ok_or(ApiError(ServiceError::Unauthorized))
}

// ============================================================================
// Definitions
// ============================================================================

pub async fn list_apis(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<impl IntoResponse> {
    let apis = state.service.list(owner(&auth)?).await?;
    Ok(Json(ApiResponse::success(apis)))
}

pub async fn create_api(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Json(new): Json<NewDefinition>,
) -> ApiResult<impl IntoResponse> {
    let definition = state.service.create(owner(&auth)?, new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(definition))))
}

pub async fn get_api(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let definition = state.service.get(owner(&auth)?, &id).await?;
    Ok(Json(ApiResponse::success(definition)))
}

pub async fn update_api(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(update): Json<DefinitionUpdate>,
) -> ApiResult<impl IntoResponse> {
    let definition = state.service.update(owner(&auth)?, &id, update).await?;
    Ok(Json(ApiResponse::success(definition)))
}

pub async fn delete_api(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.service.delete(owner(&auth)?, &id).await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Endpoints
// ============================================================================

pub async fn create_endpoint(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(new): Json<NewEndpoint>,
) -> ApiResult<impl IntoResponse> {
    let endpoint = state.service.add_endpoint(owner(&auth)?, &id, new).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(endpoint))))
}

pub async fn delete_endpoint(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path((id, endpoint_id)): Path<(String, Uuid)>,
) -> ApiResult<impl IntoResponse> {
    state
        .service
        .delete_endpoint(owner(&auth)?, &id, endpoint_id)
        .await?;
    Ok(Json(ApiResponse::ok()))
}

// ============================================================================
// Generation
// ============================================================================

pub async fn generate(
    State(state): State<ApiState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Option<Json<GenerateRequest>>,
) -> ApiResult<impl IntoResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let report = state.service.generate(owner(&auth)?, &id, request).await?;
    Ok(Json(ApiResponse::success(report)))
}
