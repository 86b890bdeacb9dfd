use sqlx::QueryBuilder;
use time::OffsetDateTime;
use uuid::Uuid;

use croft_domain::access::AccessScope;

use crate::{
	Result,
	db::Db,
	models::{EntityEmbeddingMeta, SimilarityMatch},
	scope::push_scope_predicate,
};

#[derive(Debug, Clone)]
pub struct NewEntityEmbedding<'a> {
	pub entity_id: Uuid,
	pub embedding_type: &'a str,
	pub entity_type: &'a str,
	pub model: &'a str,
	pub organization_id: &'a str,
	pub text_length: i32,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityFilter<'a> {
	pub entity_type: Option<&'a str>,
	pub embedding_type: Option<&'a str>,
	pub model: Option<&'a str>,
	pub threshold: f32,
	pub limit: i64,
}

pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 8);

	out.push('[');

	for (i, value) in vec.iter().enumerate() {
		if i > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

/// Delete-matching-row-then-insert for the `(entity_id, embedding_type)` slot.
/// Processing the same job twice leaves exactly one row; with out-of-order
/// jobs the last processed one wins.
pub async fn replace_embedding(
	db: &Db,
	row: NewEntityEmbedding<'_>,
	vec: &[f32],
	now: OffsetDateTime,
) -> Result<()> {
	let vec_text = vector_to_pg(vec);
	let mut tx = db.pool.begin().await?;

	sqlx::query("DELETE FROM entity_embeddings WHERE entity_id = $1 AND embedding_type = $2")
		.bind(row.entity_id)
		.bind(row.embedding_type)
		.execute(&mut *tx)
		.await?;

	sqlx::query(
		"\
INSERT INTO entity_embeddings (
	entity_id,
	embedding_type,
	entity_type,
	model,
	vec,
	organization_id,
	text_length,
	created_at
)
VALUES ($1, $2, $3, $4, $5::TEXT::VECTOR, $6, $7, $8)",
	)
	.bind(row.entity_id)
	.bind(row.embedding_type)
	.bind(row.entity_type)
	.bind(row.model)
	.bind(vec_text.as_str())
	.bind(row.organization_id)
	.bind(row.text_length)
	.bind(now)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

/// Ranked cosine search over the embedding rows. The caller's scope is pushed
/// into the query exactly as relational reads do, so a match outside the
/// accessible tenants can never surface regardless of similarity.
pub async fn similarity_search(
	db: &Db,
	query_vec: &[f32],
	scope: &AccessScope,
	filter: SimilarityFilter<'_>,
) -> Result<Vec<SimilarityMatch>> {
	let vec_text = vector_to_pg(query_vec);
	let mut builder = QueryBuilder::new(
		"\
SELECT
	e.entity_id,
	e.entity_type,
	e.embedding_type,
	e.model,
	e.organization_id,
	n.name AS name,
	(1 - (e.vec <=> ",
	);

	builder.push_bind(vec_text.clone());
	builder.push(
		"::VECTOR))::REAL AS similarity
FROM entity_embeddings e
LEFT JOIN entities n ON n.entity_id = e.entity_id
WHERE (1 - (e.vec <=> ",
	);
	builder.push_bind(vec_text);
	builder.push("::VECTOR)) >= ");
	builder.push_bind(filter.threshold);

	if let Some(entity_type) = filter.entity_type {
		builder.push(" AND e.entity_type = ");
		builder.push_bind(entity_type.to_string());
	}
	if let Some(embedding_type) = filter.embedding_type {
		builder.push(" AND e.embedding_type = ");
		builder.push_bind(embedding_type.to_string());
	}
	if let Some(model) = filter.model {
		builder.push(" AND e.model = ");
		builder.push_bind(model.to_string());
	}

	push_scope_predicate(&mut builder, scope, "e.organization_id");

	builder.push(" ORDER BY similarity DESC LIMIT ");
	builder.push_bind(filter.limit.max(1));

	let matches = builder.build_query_as::<SimilarityMatch>().fetch_all(&db.pool).await?;

	Ok(matches)
}

pub async fn fetch_embedding_meta(
	db: &Db,
	entity_id: Uuid,
	embedding_type: &str,
) -> Result<Option<EntityEmbeddingMeta>> {
	let meta = sqlx::query_as::<_, EntityEmbeddingMeta>(
		"\
SELECT entity_id, embedding_type, entity_type, model, organization_id, text_length, created_at
FROM entity_embeddings
WHERE entity_id = $1 AND embedding_type = $2",
	)
	.bind(entity_id)
	.bind(embedding_type)
	.fetch_optional(&db.pool)
	.await?;

	Ok(meta)
}

/// Removes embedding rows whose source entity no longer exists. Covers rows
/// orphaned by out-of-band deletes; the delete operation itself cascades.
pub async fn purge_orphan_embeddings(db: &Db) -> Result<u64> {
	let result = sqlx::query(
		"\
DELETE FROM entity_embeddings e
WHERE NOT EXISTS (SELECT 1 FROM entities n WHERE n.entity_id = e.entity_id)",
	)
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn formats_pg_vector_text() {
		assert_eq!(vector_to_pg(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
		assert_eq!(vector_to_pg(&[]), "[]");
	}
}
