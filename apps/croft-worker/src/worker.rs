//! Embedding consumer. Drains the outbox one job at a time, writes vectors
//! with a delete-then-insert replace, and sweeps orphaned embedding rows.

use std::{sync::Arc, time::Duration as StdDuration};

use time::{Duration, OffsetDateTime};
use tokio::time as tokio_time;

use croft_config::{EmbeddingProviderConfig, Indexing};
use croft_domain::compose::DEFAULT_EMBEDDING_TYPE;
use croft_service::EmbeddingProvider;
use croft_storage::{
	db::Db,
	embeddings::{self, NewEntityEmbedding},
	entities,
	models::EmbeddingOutboxEntry,
	outbox,
};

use crate::{Error, Result};

const MAX_OUTBOX_ERROR_CHARS: usize = 1_024;

pub struct WorkerState {
	pub db: Db,
	pub embedding: EmbeddingProviderConfig,
	pub indexing: Indexing,
	pub embedder: Arc<dyn EmbeddingProvider>,
}

pub async fn run_worker(state: WorkerState) -> color_eyre::Result<()> {
	let mut last_orphan_sweep = OffsetDateTime::now_utc();

	loop {
		let claimed = match process_outbox_once(&state).await {
			Ok(claimed) => claimed,
			Err(err) => {
				tracing::error!(error = %err, "embedding outbox processing failed");

				false
			},
		};
		let now = OffsetDateTime::now_utc();

		// Checked every iteration so a sustained backlog cannot postpone it.
		if sweep_is_due(last_orphan_sweep, now, state.indexing.orphan_sweep_interval_seconds) {
			match embeddings::purge_orphan_embeddings(&state.db).await {
				Ok(purged) => {
					if purged > 0 {
						tracing::info!(count = purged, "purged orphaned embedding rows");
					}

					last_orphan_sweep = now;
				},
				Err(err) => {
					tracing::error!(error = %err, "orphan embedding sweep failed");
				},
			}
		}

		// Drain without sleeping while jobs are due.
		if claimed {
			continue;
		}

		tokio_time::sleep(StdDuration::from_millis(state.indexing.poll_interval_ms)).await;
	}
}

fn sweep_is_due(last: OffsetDateTime, now: OffsetDateTime, interval_seconds: i64) -> bool {
	now - last >= Duration::seconds(interval_seconds)
}

/// Claims and processes at most one job. Returns whether a job was claimed,
/// so the loop can drain a backlog without idling between jobs.
pub async fn process_outbox_once(state: &WorkerState) -> Result<bool> {
	let now = OffsetDateTime::now_utc();
	let Some(job) = outbox::fetch_next_job(&state.db, now, state.indexing.lease_seconds).await?
	else {
		return Ok(false);
	};

	match handle_job(state, &job).await {
		Ok(()) => {
			outbox::mark_done(&state.db, job.outbox_id, OffsetDateTime::now_utc()).await?;
		},
		Err(err) => {
			let attempts = job.attempts.saturating_add(1);
			let error_text = sanitize_outbox_error(&err.to_string());
			let now = OffsetDateTime::now_utc();

			if attempts >= state.indexing.max_attempts {
				outbox::mark_dead(&state.db, job.outbox_id, attempts, &error_text, now).await?;
				tracing::error!(
					outbox_id = %job.outbox_id,
					entity_id = %job.entity_id,
					attempts,
					error = %err,
					"embedding job dead-lettered",
				);
			} else {
				let available_at = now + backoff_for_attempt(&state.indexing, attempts);

				outbox::mark_failed(
					&state.db,
					job.outbox_id,
					attempts,
					&error_text,
					available_at,
					now,
				)
				.await?;
				tracing::warn!(
					outbox_id = %job.outbox_id,
					entity_id = %job.entity_id,
					attempts,
					error = %err,
					"embedding job failed, will retry",
				);
			}
		},
	}

	Ok(true)
}

async fn handle_job(state: &WorkerState, job: &EmbeddingOutboxEntry) -> Result<()> {
	// The entity may have been deleted between enqueue and processing; the
	// job is then complete, not failed.
	if entities::fetch_entity_any(&state.db, job.entity_id).await?.is_none() {
		tracing::info!(entity_id = %job.entity_id, "entity gone before indexing, skipping");

		return Ok(());
	}

	let texts = [job.embedding_source.clone()];
	let vectors = state.embedder.embed(&state.embedding, &texts).await?;
	let vec = vectors
		.into_iter()
		.next()
		.ok_or_else(|| Error::Message("embedding provider returned no vector".into()))?;

	validate_vector_dim(&vec, state.embedding.dimensions)?;

	let text_length = i32::try_from(job.embedding_source.chars().count()).unwrap_or(i32::MAX);
	let row = NewEntityEmbedding {
		entity_id: job.entity_id,
		embedding_type: DEFAULT_EMBEDDING_TYPE,
		entity_type: &job.entity_type,
		model: &state.embedding.model,
		organization_id: &job.organization_id,
		text_length,
	};

	embeddings::replace_embedding(&state.db, row, &vec, OffsetDateTime::now_utc()).await?;

	Ok(())
}

fn validate_vector_dim(vec: &[f32], expected: u32) -> Result<()> {
	if vec.len() != expected as usize {
		return Err(Error::Message(format!(
			"embedding dimension {} does not match configured dimensions {expected}",
			vec.len(),
		)));
	}

	Ok(())
}

fn backoff_for_attempt(indexing: &Indexing, attempt: i32) -> Duration {
	let exp = (attempt.max(1) as u32).saturating_sub(1).min(6);
	let base = indexing.base_backoff_ms.saturating_mul(1 << exp);

	Duration::milliseconds(base.min(indexing.max_backoff_ms))
}

/// Provider errors can echo request headers back; redact anything that looks
/// like a credential before it lands in a table operators read.
fn sanitize_outbox_error(text: &str) -> String {
	let mut parts = Vec::new();
	let mut redact_next = false;

	for raw in text.split_whitespace() {
		let mut word = raw.to_string();

		if redact_next {
			word = "[REDACTED]".to_string();
			redact_next = false;
		}
		if raw.eq_ignore_ascii_case("bearer") {
			redact_next = true;
		}

		let lowered = raw.to_ascii_lowercase();

		for key in ["api_key", "apikey", "password", "secret", "token"] {
			if lowered.contains(key) && (lowered.contains('=') || lowered.contains(':')) {
				let sep = if raw.contains('=') { '=' } else { ':' };
				let prefix = raw.split(sep).next().unwrap_or(raw);

				word = format!("{prefix}{sep}[REDACTED]");

				break;
			}
		}

		parts.push(word);
	}

	let mut out = parts.join(" ");

	if out.chars().count() > MAX_OUTBOX_ERROR_CHARS {
		out = out.chars().take(MAX_OUTBOX_ERROR_CHARS).collect();
		out.push_str("...");
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	fn indexing() -> Indexing {
		Indexing {
			poll_interval_ms: 500,
			lease_seconds: 30,
			max_attempts: 5,
			base_backoff_ms: 500,
			max_backoff_ms: 30_000,
			orphan_sweep_interval_seconds: 900,
		}
	}

	#[test]
	fn backoff_doubles_then_caps() {
		let cfg = indexing();

		assert_eq!(backoff_for_attempt(&cfg, 1), Duration::milliseconds(500));
		assert_eq!(backoff_for_attempt(&cfg, 2), Duration::milliseconds(1_000));
		assert_eq!(backoff_for_attempt(&cfg, 3), Duration::milliseconds(2_000));
		assert_eq!(backoff_for_attempt(&cfg, 10), Duration::milliseconds(30_000));
		assert_eq!(backoff_for_attempt(&cfg, 0), Duration::milliseconds(500));
	}

	#[test]
	fn sanitizes_bearer_tokens_and_key_pairs() {
		let text = "request failed: Authorization: Bearer sk-12345 api_key=sk-67890";
		let sanitized = sanitize_outbox_error(text);

		assert!(!sanitized.contains("sk-12345"));
		assert!(!sanitized.contains("sk-67890"));
		assert!(sanitized.contains("[REDACTED]"));
	}

	#[test]
	fn truncates_very_long_errors() {
		let text = "x".repeat(5_000);
		let sanitized = sanitize_outbox_error(&text);

		assert!(sanitized.chars().count() <= MAX_OUTBOX_ERROR_CHARS + 3);
		assert!(sanitized.ends_with("..."));
	}

	#[test]
	fn sweep_deadline_depends_on_time_not_idleness() {
		let start = OffsetDateTime::now_utc();

		assert!(!sweep_is_due(start, start + Duration::seconds(899), 900));
		assert!(sweep_is_due(start, start + Duration::seconds(900), 900));
		assert!(sweep_is_due(start, start + Duration::seconds(10_000), 900));
	}

	#[test]
	fn rejects_mismatched_vector_dim() {
		assert!(validate_vector_dim(&[0.0; 8], 8).is_ok());
		assert!(validate_vector_dim(&[0.0; 7], 8).is_err());
	}
}
