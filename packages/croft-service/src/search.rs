//! Similarity search fan-out across entity kinds.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use croft_domain::{
	access::AccessScope,
	auth::AuthContext,
	compose::{DEFAULT_EMBEDDING_TYPE, EntityKind},
};
use croft_storage::embeddings::{self, SimilarityFilter};

use crate::{CroftService, ServiceError, ServiceResult};

const RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
	pub query: String,
	/// Kinds to search, in the order groups come back. Defaults to all kinds.
	pub entity_types: Option<Vec<EntityKind>>,
	pub embedding_type: Option<String>,
	pub model: Option<String>,
	pub limit: Option<u32>,
	pub threshold: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchMatchItem {
	pub entity_id: Uuid,
	pub organization_id: String,
	pub name: Option<String>,
	pub model: String,
	pub similarity: f32,
}

/// Matches for one kind, so callers can tell a tool hit from a policy hit
/// without re-fetching.
#[derive(Debug, Clone, Serialize)]
pub struct SearchGroup {
	pub entity_type: EntityKind,
	pub matches: Vec<SearchMatchItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
	pub groups: Vec<SearchGroup>,
}

impl CroftService {
	pub async fn search(
		&self,
		ctx: &AuthContext,
		req: SearchRequest,
	) -> ServiceResult<SearchResponse> {
		let query = req.query.trim();

		if query.is_empty() {
			return Err(ServiceError::InvalidRequest { message: "query must not be empty".into() });
		}

		let search_cfg = &self.cfg.search;
		let limit = req.limit.unwrap_or(search_cfg.default_limit).min(search_cfg.max_limit).max(1);
		let threshold = req.threshold.unwrap_or(search_cfg.default_threshold);

		// Cosine similarity spans [-1, 1]; the config validates its default
		// against the same range.
		if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
			return Err(ServiceError::InvalidRequest {
				message: "threshold must be within [-1, 1]".into(),
			});
		}

		let kinds = req.entity_types.unwrap_or_else(|| EntityKind::ALL.to_vec());
		let scope = AccessScope::for_read(ctx);

		// No accessible tenants means empty groups, not an error; the caller
		// asked a valid question with a trivially empty answer.
		if scope.is_deny_all() {
			let groups = kinds
				.into_iter()
				.map(|kind| SearchGroup { entity_type: kind, matches: Vec::new() })
				.collect();

			return Ok(SearchResponse { groups });
		}

		let provider_cfg = &self.cfg.providers.embedding;
		let query_vec = self
			.providers
			.embedding
			.embed(provider_cfg, &[query.to_string()])
			.await?
			.into_iter()
			.next()
			.ok_or_else(|| ServiceError::Provider {
				message: "embedding provider returned no vector".into(),
			})?;

		if query_vec.len() != provider_cfg.dimensions as usize {
			return Err(ServiceError::Provider {
				message: format!(
					"embedding provider returned {} dimensions, expected {}",
					query_vec.len(),
					provider_cfg.dimensions,
				),
			});
		}

		let embedding_type = req.embedding_type.as_deref().unwrap_or(DEFAULT_EMBEDDING_TYPE);
		let mut groups = Vec::with_capacity(kinds.len());

		for kind in kinds {
			let filter = SimilarityFilter {
				entity_type: Some(kind.as_str()),
				embedding_type: Some(embedding_type),
				model: req.model.as_deref(),
				threshold,
				limit: i64::from(limit),
			};
			let matches = self.search_one_kind(&query_vec, &scope, filter).await?;

			groups.push(SearchGroup {
				entity_type: kind,
				matches: matches
					.into_iter()
					.map(|item| SearchMatchItem {
						entity_id: item.entity_id,
						organization_id: item.organization_id,
						name: item.name,
						model: item.model,
						similarity: item.similarity,
					})
					.collect(),
			});
		}

		Ok(SearchResponse { groups })
	}

	/// One transparent retry on a storage error before surfacing it, to ride
	/// out transient pool contention mid-fan-out.
	async fn search_one_kind(
		&self,
		query_vec: &[f32],
		scope: &AccessScope,
		filter: SimilarityFilter<'_>,
	) -> ServiceResult<Vec<croft_storage::models::SimilarityMatch>> {
		match embeddings::similarity_search(&self.db, query_vec, scope, filter.clone()).await {
			Ok(matches) => Ok(matches),
			Err(err) => {
				tracing::warn!(error = %err, "similarity search failed, retrying once");
				tokio::time::sleep(RETRY_DELAY).await;

				Ok(embeddings::similarity_search(&self.db, query_vec, scope, filter).await?)
			},
		}
	}
}
