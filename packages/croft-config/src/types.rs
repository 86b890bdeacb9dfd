use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub indexing: Indexing,
	pub search: Search,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
	#[serde(default = "default_acquire_timeout_ms")]
	pub acquire_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Indexing {
	pub poll_interval_ms: u64,
	pub lease_seconds: i64,
	pub max_attempts: i32,
	pub base_backoff_ms: i64,
	pub max_backoff_ms: i64,
	#[serde(default = "default_orphan_sweep_interval_seconds")]
	pub orphan_sweep_interval_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	pub default_threshold: f32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

fn default_acquire_timeout_ms() -> u64 {
	5_000
}

fn default_orphan_sweep_interval_seconds() -> i64 {
	900
}
