//! Operator-facing inspection of the embedding queue.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use croft_domain::auth::AuthContext;
use croft_storage::{models::EmbeddingOutboxEntry, outbox};

use crate::{CroftService, ServiceError, ServiceResult, time_serde};

const DEFAULT_DEAD_LETTER_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize)]
pub struct DeadLetterJob {
	pub outbox_id: Uuid,
	pub entity_type: String,
	pub entity_id: Uuid,
	pub organization_id: String,
	pub attempts: i32,
	pub last_error: Option<String>,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<EmbeddingOutboxEntry> for DeadLetterJob {
	fn from(entry: EmbeddingOutboxEntry) -> Self {
		Self {
			outbox_id: entry.outbox_id,
			entity_type: entry.entity_type,
			entity_id: entry.entity_id,
			organization_id: entry.organization_id,
			attempts: entry.attempts,
			last_error: entry.last_error,
			updated_at: entry.updated_at,
		}
	}
}

impl CroftService {
	/// Jobs that exhausted their retry budget, newest first. Error text may
	/// reference any tenant, so this is gated on the read-all override.
	pub async fn list_dead_letter_jobs(
		&self,
		ctx: &AuthContext,
		limit: Option<i64>,
	) -> ServiceResult<Vec<DeadLetterJob>> {
		if !ctx.has_read_all() {
			return Err(ServiceError::AccessDenied {
				message: "dead-letter inspection requires elevated access".into(),
			});
		}

		let jobs =
			outbox::list_dead_jobs(&self.db, limit.unwrap_or(DEFAULT_DEAD_LETTER_LIMIT)).await?;

		Ok(jobs.into_iter().map(DeadLetterJob::from).collect())
	}
}
