//! Entity CRUD with tenant scoping and post-commit embedding enqueue.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use croft_domain::{
	access::{self, AccessScope},
	auth::AuthContext,
	compose::{self, EntityFields, EntityKind},
};
use croft_storage::{
	entities::{self, EntityPatch},
	models::EntityRecord,
	outbox::{self, NewEmbeddingJob},
};

use crate::{CroftService, ServiceError, ServiceResult, access::ensure_tenant_access, time_serde};

const DEFAULT_LIST_LIMIT: i64 = 50;
const STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEntityRequest {
	pub kind: EntityKind,
	pub name: String,
	pub description: Option<String>,
	pub notes: Option<String>,
	pub policy_text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntityRequest {
	pub name: Option<String>,
	pub description: Option<String>,
	pub notes: Option<String>,
	pub policy_text: Option<String>,
	pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEntitiesRequest {
	pub kind: Option<EntityKind>,
	/// When set, targets exactly this tenant; the Membership Oracle may grant
	/// it even if the token's cached claim set does not.
	pub organization_id: Option<String>,
	pub limit: Option<i64>,
	pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityResponse {
	pub entity_id: Uuid,
	pub organization_id: String,
	pub kind: EntityKind,
	pub name: String,
	pub description: Option<String>,
	pub notes: Option<String>,
	pub policy_text: Option<String>,
	pub status: String,
	pub created_by: String,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}
impl TryFrom<EntityRecord> for EntityResponse {
	type Error = ServiceError;

	fn try_from(record: EntityRecord) -> Result<Self, Self::Error> {
		let kind = record.kind.parse::<EntityKind>().map_err(|err| ServiceError::Storage {
			message: format!("stored entity {} is corrupt: {err}", record.entity_id),
		})?;

		Ok(Self {
			entity_id: record.entity_id,
			organization_id: record.organization_id,
			kind,
			name: record.name,
			description: record.description,
			notes: record.notes,
			policy_text: record.policy_text,
			status: record.status,
			created_by: record.created_by,
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntitiesResponse {
	pub entities: Vec<EntityResponse>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteEntityResponse {
	pub deleted: bool,
}

impl CroftService {
	pub async fn create_entity(
		&self,
		ctx: &AuthContext,
		req: CreateEntityRequest,
	) -> ServiceResult<EntityResponse> {
		let organization_id = ctx.require_organization()?.to_string();

		ensure_tenant_access(&self.db, ctx, &organization_id).await?;

		let name = req.name.trim().to_string();

		if name.is_empty() {
			return Err(ServiceError::InvalidRequest { message: "name must not be empty".into() });
		}

		let now = OffsetDateTime::now_utc();
		let record = EntityRecord {
			entity_id: Uuid::new_v4(),
			organization_id,
			kind: req.kind.as_str().to_string(),
			name,
			description: normalize_optional(req.description),
			notes: normalize_optional(req.notes),
			policy_text: normalize_optional(req.policy_text),
			status: STATUS_ACTIVE.to_string(),
			created_by: ctx.user_id.clone(),
			created_at: now,
			updated_at: now,
		};

		entities::insert_entity(&self.db, &record).await?;

		// The write is durable at this point; a queue hiccup must not fail it.
		self.enqueue_embedding(&record).await;

		record.try_into()
	}

	pub async fn get_entity(
		&self,
		ctx: &AuthContext,
		entity_id: Uuid,
	) -> ServiceResult<EntityResponse> {
		let scope = AccessScope::for_read(ctx);

		if let Some(record) = entities::fetch_entity_scoped(&self.db, entity_id, &scope).await? {
			return record.try_into();
		}

		// Ownership bypass: the creator can always read their own record, even
		// when no membership covers its tenant anymore.
		if let Some(record) = entities::fetch_entity_any(&self.db, entity_id).await?
			&& access::owns_record(ctx, &record.created_by)
		{
			return record.try_into();
		}

		Err(not_found(entity_id))
	}

	pub async fn list_entities(
		&self,
		ctx: &AuthContext,
		req: ListEntitiesRequest,
	) -> ServiceResult<ListEntitiesResponse> {
		let scope = match &req.organization_id {
			Some(organization_id) => {
				// Explicit tenant targeting is an access question, answered
				// with a denial rather than a silently empty page.
				ensure_tenant_access(&self.db, ctx, organization_id).await?;

				AccessScope::single(organization_id.clone())
			},
			None => AccessScope::for_read(ctx),
		};

		if scope.is_deny_all() {
			return Ok(ListEntitiesResponse { entities: Vec::new() });
		}

		let records = entities::list_entities(
			&self.db,
			&scope,
			req.kind.map(EntityKind::as_str),
			req.limit.unwrap_or(DEFAULT_LIST_LIMIT),
			req.offset.unwrap_or(0),
		)
		.await?;
		let entities =
			records.into_iter().map(EntityResponse::try_from).collect::<ServiceResult<Vec<_>>>()?;

		Ok(ListEntitiesResponse { entities })
	}

	pub async fn update_entity(
		&self,
		ctx: &AuthContext,
		entity_id: Uuid,
		req: UpdateEntityRequest,
	) -> ServiceResult<EntityResponse> {
		let patch = EntityPatch {
			name: req.name.map(|name| name.trim().to_string()),
			description: req.description,
			notes: req.notes,
			policy_text: req.policy_text,
			status: req.status,
		};

		if patch.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "update must change at least one field".into(),
			});
		}
		if patch.name.as_deref() == Some("") {
			return Err(ServiceError::InvalidRequest { message: "name must not be empty".into() });
		}

		let existing = entities::fetch_entity_any(&self.db, entity_id)
			.await?
			.ok_or_else(|| not_found(entity_id))?;

		// Creatorship grants reads only; mutations always need a live grant.
		ensure_tenant_access(&self.db, ctx, &existing.organization_id).await?;

		let source_changed = patch.name.is_some()
			|| patch.description.is_some()
			|| patch.notes.is_some()
			|| patch.policy_text.is_some();
		let updated = entities::update_entity(&self.db, entity_id, &patch, OffsetDateTime::now_utc())
			.await?
			.ok_or_else(|| not_found(entity_id))?;

		if source_changed {
			self.enqueue_embedding(&updated).await;
		}

		updated.try_into()
	}

	pub async fn delete_entity(
		&self,
		ctx: &AuthContext,
		entity_id: Uuid,
	) -> ServiceResult<DeleteEntityResponse> {
		let existing = entities::fetch_entity_any(&self.db, entity_id)
			.await?
			.ok_or_else(|| not_found(entity_id))?;

		ensure_tenant_access(&self.db, ctx, &existing.organization_id).await?;

		let deleted = entities::delete_entity(&self.db, entity_id).await?;

		Ok(DeleteEntityResponse { deleted })
	}

	/// Best-effort enqueue. A failure is logged and swallowed; the worker's
	/// orphan sweep and later updates re-converge the index.
	///
	/// The insert runs on its own task: the entity write is already committed,
	/// so a caller that disconnects mid-response must not be able to drop the
	/// enqueue with the request future.
	async fn enqueue_embedding(&self, record: &EntityRecord) {
		let Ok(kind) = record.kind.parse::<EntityKind>() else {
			tracing::warn!(
				entity_id = %record.entity_id,
				kind = %record.kind,
				"skipping embedding enqueue for unknown kind",
			);

			return;
		};
		let source = compose::compose(kind, EntityFields {
			name: &record.name,
			description: record.description.as_deref(),
			notes: record.notes.as_deref(),
			policy_text: record.policy_text.as_deref(),
		});

		if source.is_empty() {
			return;
		}

		let db = self.db.clone();
		let entity_id = record.entity_id;
		let organization_id = record.organization_id.clone();
		let task = tokio::spawn(async move {
			let job = NewEmbeddingJob {
				entity_type: kind.as_str(),
				entity_id,
				embedding_source: &source,
				organization_id: &organization_id,
			};

			if let Err(err) = outbox::enqueue_embedding_job(&db, job).await {
				tracing::warn!(
					entity_id = %entity_id,
					error = %err,
					"failed to enqueue embedding job",
				);
			}
		});

		// Awaited for ordering; the task outlives a dropped request future.
		let _ = task.await;
	}
}

fn normalize_optional(value: Option<String>) -> Option<String> {
	value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn not_found(entity_id: Uuid) -> ServiceError {
	ServiceError::NotFound { message: format!("entity {entity_id}") }
}
