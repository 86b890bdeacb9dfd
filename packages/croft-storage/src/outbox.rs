use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Result, db::Db, models::EmbeddingOutboxEntry};

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_FAILED: &str = "FAILED";
pub const STATUS_DONE: &str = "DONE";
/// Dead-letter terminal state. Rows stay in the table for manual inspection.
pub const STATUS_DEAD: &str = "DEAD";

#[derive(Debug, Clone)]
pub struct NewEmbeddingJob<'a> {
	pub entity_type: &'a str,
	pub entity_id: Uuid,
	pub embedding_source: &'a str,
	pub organization_id: &'a str,
}

pub async fn enqueue_embedding_job(db: &Db, job: NewEmbeddingJob<'_>) -> Result<()> {
	let now = OffsetDateTime::now_utc();

	sqlx::query(
		"\
INSERT INTO embedding_outbox (
	outbox_id,
	entity_type,
	entity_id,
	embedding_source,
	organization_id,
	status,
	created_at,
	updated_at,
	available_at
)
VALUES ($1, $2, $3, $4, $5, 'PENDING', $6, $6, $6)",
	)
	.bind(Uuid::new_v4())
	.bind(job.entity_type)
	.bind(job.entity_id)
	.bind(job.embedding_source)
	.bind(job.organization_id)
	.bind(now)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Claims the next due job and leases it, so a crashed consumer releases its
/// claim after `lease_seconds` without operator intervention.
pub async fn fetch_next_job(
	db: &Db,
	now: OffsetDateTime,
	lease_seconds: i64,
) -> Result<Option<EmbeddingOutboxEntry>> {
	let mut tx = db.pool.begin().await?;
	let row = sqlx::query_as::<_, EmbeddingOutboxEntry>(
		"\
SELECT *
FROM embedding_outbox
WHERE status IN ('PENDING', 'FAILED') AND available_at <= $1
ORDER BY available_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.fetch_optional(&mut *tx)
	.await?;

	let job = if let Some(mut job) = row {
		let lease_until = now + Duration::seconds(lease_seconds);

		sqlx::query(
			"UPDATE embedding_outbox SET available_at = $1, updated_at = $2 WHERE outbox_id = $3",
		)
		.bind(lease_until)
		.bind(now)
		.bind(job.outbox_id)
		.execute(&mut *tx)
		.await?;

		job.available_at = lease_until;
		job.updated_at = now;

		Some(job)
	} else {
		None
	};

	tx.commit().await?;

	Ok(job)
}

pub async fn mark_done(db: &Db, outbox_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query("UPDATE embedding_outbox SET status = 'DONE', updated_at = $1 WHERE outbox_id = $2")
		.bind(now)
		.bind(outbox_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn mark_failed(
	db: &Db,
	outbox_id: Uuid,
	attempts: i32,
	error_text: &str,
	available_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE embedding_outbox
SET status = 'FAILED',
	attempts = $1,
	last_error = $2,
	available_at = $3,
	updated_at = $4
WHERE outbox_id = $5",
	)
	.bind(attempts)
	.bind(error_text)
	.bind(available_at)
	.bind(now)
	.bind(outbox_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn mark_dead(
	db: &Db,
	outbox_id: Uuid,
	attempts: i32,
	error_text: &str,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE embedding_outbox
SET status = 'DEAD',
	attempts = $1,
	last_error = $2,
	updated_at = $3
WHERE outbox_id = $4",
	)
	.bind(attempts)
	.bind(error_text)
	.bind(now)
	.bind(outbox_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}

pub async fn list_dead_jobs(db: &Db, limit: i64) -> Result<Vec<EmbeddingOutboxEntry>> {
	let jobs = sqlx::query_as::<_, EmbeddingOutboxEntry>(
		"SELECT * FROM embedding_outbox WHERE status = 'DEAD' ORDER BY updated_at DESC LIMIT $1",
	)
	.bind(limit.clamp(1, 1_000))
	.fetch_all(&db.pool)
	.await?;

	Ok(jobs)
}
