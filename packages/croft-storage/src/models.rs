use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntityRecord {
	pub entity_id: Uuid,
	pub organization_id: String,
	pub kind: String,
	pub name: String,
	pub description: Option<String>,
	pub notes: Option<String>,
	pub policy_text: Option<String>,
	pub status: String,
	pub created_by: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Membership {
	pub membership_id: Uuid,
	pub user_id: String,
	pub organization_id: String,
	pub role: String,
	pub is_active: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EntityEmbeddingMeta {
	pub entity_id: Uuid,
	pub embedding_type: String,
	pub entity_type: String,
	pub model: String,
	pub organization_id: String,
	pub text_length: i32,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmbeddingOutboxEntry {
	pub outbox_id: Uuid,
	pub entity_type: String,
	pub entity_id: Uuid,
	pub embedding_source: String,
	pub organization_id: String,
	pub status: String,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SimilarityMatch {
	pub entity_id: Uuid,
	pub entity_type: String,
	pub embedding_type: String,
	pub model: String,
	pub organization_id: String,
	/// Absent when the embedding row outlived its source entity.
	pub name: Option<String>,
	pub similarity: f32,
}
