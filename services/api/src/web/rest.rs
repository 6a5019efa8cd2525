//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Handlers only adapt between the wire format and the core service: they read
//! the resolved identity from request extensions, forward to the service, and
//! wrap results in the response envelopes existing clients expect.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::middleware::UserId;
use crate::web::state::AppState;
use recommendations_core::domain::{Recommendation, RecommendationUpdate};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_recommendations_handler,
        create_recommendation_handler,
        get_recommendation_handler,
        update_recommendation_handler,
        delete_recommendation_handler,
        prepare_attachment_handler,
    ),
    components(
        schemas(
            RecommendationDto,
            RecommendationFields,
            ListResponse,
            ItemResponse,
            UploadUrlResponse
        )
    ),
    tags(
        (name = "Recommendations API", description = "CRUD and attachment-upload endpoints for per-user recommendation records.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Wire representation of a recommendation (camelCase, the format existing
/// clients parse). The domain type itself stays serialization-free.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationDto {
    recommendation_id: Uuid,
    user_id: String,
    created_at: DateTime<Utc>,
    name: String,
    why: String,
    attachment_url: String,
}

impl From<Recommendation> for RecommendationDto {
    fn from(item: Recommendation) -> Self {
        Self {
            recommendation_id: item.recommendation_id,
            user_id: item.user_id,
            created_at: item.created_at,
            name: item.name,
            why: item.why,
            attachment_url: item.attachment_url,
        }
    }
}

/// Request body shared by create and update: the only client-mutable fields.
#[derive(Deserialize, ToSchema)]
pub struct RecommendationFields {
    pub name: String,
    pub why: String,
}

impl From<RecommendationFields> for RecommendationUpdate {
    fn from(fields: RecommendationFields) -> Self {
        Self {
            name: fields.name,
            why: fields.why,
        }
    }
}

/// List envelope. Existing clients read the collection from a
/// `recommendations` key, unlike single-record responses which use `item`.
#[derive(Serialize, ToSchema)]
pub struct ListResponse {
    recommendations: Vec<RecommendationDto>,
}

#[derive(Serialize, ToSchema)]
pub struct ItemResponse {
    item: RecommendationDto,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    upload_url: String,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List every recommendation owned by the caller.
#[utoipa::path(
    get,
    path = "/recommendations",
    responses(
        (status = 200, description = "The caller's recommendations", body = ListResponse),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn list_recommendations_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
) -> ApiResult<impl IntoResponse> {
    let items = state.service.list_all(&user_id).await?;
    let response = ListResponse {
        recommendations: items.into_iter().map(RecommendationDto::from).collect(),
    };
    Ok(Json(response))
}

/// Create a new recommendation owned by the caller.
#[utoipa::path(
    post,
    path = "/recommendations",
    request_body = RecommendationFields,
    responses(
        (status = 200, description = "The created recommendation", body = ItemResponse),
        (status = 401, description = "Missing or invalid bearer token")
    )
)]
pub async fn create_recommendation_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Json(body): Json<RecommendationFields>,
) -> ApiResult<impl IntoResponse> {
    let item = state.service.create(&user_id, body.into()).await?;
    Ok(Json(ItemResponse { item: item.into() }))
}

/// Fetch one recommendation the caller owns.
#[utoipa::path(
    get,
    path = "/recommendations/{recommendationId}",
    params(
        ("recommendationId" = Uuid, Path, description = "The recommendation to fetch.")
    ),
    responses(
        (status = 200, description = "The recommendation", body = ItemResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No such recommendation under the caller's ownership")
    )
)]
pub async fn get_recommendation_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(recommendation_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let item = state.service.get_one(&user_id, recommendation_id).await?;
    Ok(Json(ItemResponse { item: item.into() }))
}

/// Update the name and reason of a recommendation the caller owns.
#[utoipa::path(
    patch,
    path = "/recommendations/{recommendationId}",
    request_body = RecommendationFields,
    params(
        ("recommendationId" = Uuid, Path, description = "The recommendation to update.")
    ),
    responses(
        (status = 200, description = "Updated"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No such recommendation under the caller's ownership")
    )
)]
pub async fn update_recommendation_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(recommendation_id): Path<Uuid>,
    Json(body): Json<RecommendationFields>,
) -> ApiResult<impl IntoResponse> {
    state
        .service
        .update(&user_id, recommendation_id, body.into())
        .await?;
    Ok(StatusCode::OK)
}

/// Permanently delete a recommendation the caller owns.
#[utoipa::path(
    delete,
    path = "/recommendations/{recommendationId}",
    params(
        ("recommendationId" = Uuid, Path, description = "The recommendation to delete.")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No such recommendation under the caller's ownership"),
        (status = 409, description = "The record was already gone when the delete ran")
    )
)]
pub async fn delete_recommendation_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(recommendation_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.service.delete(&user_id, recommendation_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a signed upload URL for a recommendation's attachment.
///
/// The returned URL is the only place the signature ever appears; the record
/// itself stores the durable base form.
#[utoipa::path(
    post,
    path = "/recommendations/{recommendationId}/attachment",
    params(
        ("recommendationId" = Uuid, Path, description = "The recommendation to attach to.")
    ),
    responses(
        (status = 200, description = "A time-limited, write-capable upload URL", body = UploadUrlResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "No such recommendation under the caller's ownership")
    )
)]
pub async fn prepare_attachment_handler(
    State(state): State<Arc<AppState>>,
    Extension(UserId(user_id)): Extension<UserId>,
    Path(recommendation_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let upload_url = state
        .service
        .prepare_attachment(&user_id, recommendation_id)
        .await?;
    Ok(Json(UploadUrlResponse { upload_url }))
}
