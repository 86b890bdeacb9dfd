pub mod access;
pub mod admin;
pub mod entities;
pub mod memberships;
pub mod search;
pub mod time_serde;

mod error;

pub use access::AccessGrant;
pub use admin::DeadLetterJob;
pub use entities::{
	CreateEntityRequest, DeleteEntityResponse, EntityResponse, ListEntitiesRequest,
	ListEntitiesResponse, UpdateEntityRequest,
};
pub use error::{ServiceError, ServiceResult};
pub use memberships::{GrantMembershipRequest, MembershipResponse};
pub use search::{SearchGroup, SearchMatchItem, SearchRequest, SearchResponse};

use std::{future::Future, pin::Pin, sync::Arc};

use croft_config::{Config, EmbeddingProviderConfig};
use croft_providers::embedding;
use croft_storage::db::Db;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seam for the external embedding service, so tests can stub the network
/// call while production uses the reqwest-backed provider.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, croft_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, croft_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

pub struct CroftService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl CroftService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}
