use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use croft_service::{
	CreateEntityRequest, DeadLetterJob, DeleteEntityResponse, EntityResponse,
	GrantMembershipRequest, ListEntitiesRequest, ListEntitiesResponse, MembershipResponse,
	SearchRequest, SearchResponse, ServiceError, UpdateEntityRequest,
};

use crate::{envelope::Envelope, state::AppState};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/entities", post(create_entity).get(list_entities))
		.route(
			"/v1/entities/{entity_id}",
			get(get_entity).patch(update_entity).delete(delete_entity),
		)
		.route("/v1/search", post(search))
		.route("/v1/me/memberships", get(list_my_memberships))
		.route("/v1/admin/memberships", post(grant_membership))
		.route("/v1/admin/dead-letters", get(list_dead_letters))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn create_entity(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Json(payload): Json<CreateEntityRequest>,
) -> Result<(StatusCode, Json<EntityResponse>), ApiError> {
	let response = state.service.create_entity(&ctx, payload).await?;

	Ok((StatusCode::CREATED, Json(response)))
}

async fn get_entity(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Path(entity_id): Path<Uuid>,
) -> Result<Json<EntityResponse>, ApiError> {
	let response = state.service.get_entity(&ctx, entity_id).await?;

	Ok(Json(response))
}

async fn list_entities(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Query(payload): Query<ListEntitiesRequest>,
) -> Result<Json<ListEntitiesResponse>, ApiError> {
	let response = state.service.list_entities(&ctx, payload).await?;

	Ok(Json(response))
}

async fn update_entity(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Path(entity_id): Path<Uuid>,
	Json(payload): Json<UpdateEntityRequest>,
) -> Result<Json<EntityResponse>, ApiError> {
	let response = state.service.update_entity(&ctx, entity_id, payload).await?;

	Ok(Json(response))
}

async fn delete_entity(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Path(entity_id): Path<Uuid>,
) -> Result<Json<DeleteEntityResponse>, ApiError> {
	let response = state.service.delete_entity(&ctx, entity_id).await?;

	Ok(Json(response))
}

async fn search(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(&ctx, payload).await?;

	Ok(Json(response))
}

async fn list_my_memberships(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
) -> Result<Json<Vec<MembershipResponse>>, ApiError> {
	let response = state.service.list_my_memberships(&ctx).await?;

	Ok(Json(response))
}

async fn grant_membership(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Json(payload): Json<GrantMembershipRequest>,
) -> Result<Json<MembershipResponse>, ApiError> {
	let response = state.service.grant_membership(&ctx, payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct DeadLetterQuery {
	limit: Option<i64>,
}

async fn list_dead_letters(
	State(state): State<AppState>,
	Envelope(ctx): Envelope,
	Query(query): Query<DeadLetterQuery>,
) -> Result<Json<Vec<DeadLetterJob>>, ApiError> {
	let response = state.service.list_dead_letter_jobs(&ctx, query.limit).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let (status, error_code) = match &err {
			ServiceError::ContextIncomplete { .. } => {
				// Misbehaving gateway, not a caller mistake.
				tracing::error!(error = %err, "request arrived with an incomplete trust envelope");

				(StatusCode::INTERNAL_SERVER_ERROR, "context_incomplete")
			},
			ServiceError::AccessDenied { .. } => (StatusCode::FORBIDDEN, "access_denied"),
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "invalid_request"),
			ServiceError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
			ServiceError::Provider { .. } => (StatusCode::BAD_GATEWAY, "provider_error"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
		};

		Self { status, error_code: error_code.to_string(), message: err.to_string() }
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
