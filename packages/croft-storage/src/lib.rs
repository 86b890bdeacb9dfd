pub mod db;
pub mod embeddings;
pub mod entities;
pub mod membership;
pub mod models;
pub mod outbox;
pub mod schema;
pub mod scope;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
