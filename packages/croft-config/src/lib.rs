mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Indexing, Postgres, Providers, Search, Security, Service,
	Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.api_key must be non-empty.".to_string(),
		});
	}
	if cfg.indexing.poll_interval_ms == 0 {
		return Err(Error::Validation {
			message: "indexing.poll_interval_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "indexing.lease_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.max_attempts <= 0 {
		return Err(Error::Validation {
			message: "indexing.max_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.base_backoff_ms <= 0 {
		return Err(Error::Validation {
			message: "indexing.base_backoff_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.indexing.max_backoff_ms < cfg.indexing.base_backoff_ms {
		return Err(Error::Validation {
			message: "indexing.max_backoff_ms must be at least indexing.base_backoff_ms."
				.to_string(),
		});
	}
	if cfg.indexing.orphan_sweep_interval_seconds <= 0 {
		return Err(Error::Validation {
			message: "indexing.orphan_sweep_interval_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit < cfg.search.default_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be at least search.default_limit.".to_string(),
		});
	}
	if !cfg.search.default_threshold.is_finite() {
		return Err(Error::Validation {
			message: "search.default_threshold must be a finite number.".to_string(),
		});
	}
	if !(-1.0..=1.0).contains(&cfg.search.default_threshold) {
		return Err(Error::Validation {
			message: "search.default_threshold must be in the range -1.0 to 1.0.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let api_base = cfg.providers.embedding.api_base.trim_end_matches('/').to_string();

	cfg.providers.embedding.api_base = api_base;

	if !cfg.providers.embedding.path.starts_with('/') {
		cfg.providers.embedding.path = format!("/{}", cfg.providers.embedding.path);
	}
}
