use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use croft_domain::access::AccessScope;

use crate::{Result, db::Db, models::EntityRecord, scope::push_scope_predicate};

const MAX_LIST_LIMIT: i64 = 500;

/// Partial update. `None` leaves a column unchanged; an empty string clears a
/// nullable column.
#[derive(Debug, Default, Clone)]
pub struct EntityPatch {
	pub name: Option<String>,
	pub description: Option<String>,
	pub notes: Option<String>,
	pub policy_text: Option<String>,
	pub status: Option<String>,
}
impl EntityPatch {
	pub fn is_empty(&self) -> bool {
		self.name.is_none()
			&& self.description.is_none()
			&& self.notes.is_none()
			&& self.policy_text.is_none()
			&& self.status.is_none()
	}
}

pub async fn insert_entity(db: &Db, record: &EntityRecord) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO entities (
	entity_id,
	organization_id,
	kind,
	name,
	description,
	notes,
	policy_text,
	status,
	created_by,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
	)
	.bind(record.entity_id)
	.bind(record.organization_id.as_str())
	.bind(record.kind.as_str())
	.bind(record.name.as_str())
	.bind(record.description.as_deref())
	.bind(record.notes.as_deref())
	.bind(record.policy_text.as_deref())
	.bind(record.status.as_str())
	.bind(record.created_by.as_str())
	.bind(record.created_at)
	.bind(record.updated_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Fetch with the caller's scope applied in SQL, like every other read.
pub async fn fetch_entity_scoped(
	db: &Db,
	entity_id: Uuid,
	scope: &AccessScope,
) -> Result<Option<EntityRecord>> {
	let mut builder = QueryBuilder::new("SELECT * FROM entities WHERE entity_id = ");

	builder.push_bind(entity_id);
	push_scope_predicate(&mut builder, scope, "organization_id");

	let record = builder.build_query_as::<EntityRecord>().fetch_optional(&db.pool).await?;

	Ok(record)
}

/// Unscoped fetch. Only for the handler-level ownership bypass and for
/// resolving which tenant a targeted write belongs to; never expose the result
/// without an access decision.
pub async fn fetch_entity_any(db: &Db, entity_id: Uuid) -> Result<Option<EntityRecord>> {
	let record = sqlx::query_as::<_, EntityRecord>("SELECT * FROM entities WHERE entity_id = $1")
		.bind(entity_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(record)
}

pub async fn list_entities(
	db: &Db,
	scope: &AccessScope,
	kind: Option<&str>,
	limit: i64,
	offset: i64,
) -> Result<Vec<EntityRecord>> {
	let mut builder = QueryBuilder::new("SELECT * FROM entities WHERE TRUE");

	push_scope_predicate(&mut builder, scope, "organization_id");

	if let Some(kind) = kind {
		builder.push(" AND kind = ");
		builder.push_bind(kind.to_string());
	}

	builder.push(" ORDER BY updated_at DESC, entity_id LIMIT ");
	builder.push_bind(limit.clamp(1, MAX_LIST_LIMIT));
	builder.push(" OFFSET ");
	builder.push_bind(offset.max(0));

	let records = builder.build_query_as::<EntityRecord>().fetch_all(&db.pool).await?;

	Ok(records)
}

pub async fn update_entity(
	db: &Db,
	entity_id: Uuid,
	patch: &EntityPatch,
	now: OffsetDateTime,
) -> Result<Option<EntityRecord>> {
	let record = sqlx::query_as::<_, EntityRecord>(
		"\
UPDATE entities
SET name = COALESCE($2, name),
	description = CASE WHEN $3::TEXT IS NULL THEN description ELSE NULLIF($3, '') END,
	notes = CASE WHEN $4::TEXT IS NULL THEN notes ELSE NULLIF($4, '') END,
	policy_text = CASE WHEN $5::TEXT IS NULL THEN policy_text ELSE NULLIF($5, '') END,
	status = COALESCE($6, status),
	updated_at = $7
WHERE entity_id = $1
RETURNING *",
	)
	.bind(entity_id)
	.bind(patch.name.as_deref())
	.bind(patch.description.as_deref())
	.bind(patch.notes.as_deref())
	.bind(patch.policy_text.as_deref())
	.bind(patch.status.as_deref())
	.bind(now)
	.fetch_optional(&db.pool)
	.await?;

	Ok(record)
}

/// Deletes the entity and its embedding rows in one transaction, so a
/// successful delete leaves no orphaned vectors behind.
pub async fn delete_entity(db: &Db, entity_id: Uuid) -> Result<bool> {
	let mut tx = db.pool.begin().await?;

	sqlx::query("DELETE FROM entity_embeddings WHERE entity_id = $1")
		.bind(entity_id)
		.execute(&mut *tx)
		.await?;

	let result = sqlx::query("DELETE FROM entities WHERE entity_id = $1")
		.bind(entity_id)
		.execute(&mut *tx)
		.await?;

	tx.commit().await?;

	Ok(result.rows_affected() > 0)
}
