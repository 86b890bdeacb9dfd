use std::sync::Arc;

use croft_service::CroftService;
use croft_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<CroftService>,
}
impl AppState {
	pub async fn new(config: croft_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema(config.providers.embedding.dimensions).await?;

		let service = CroftService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}
