pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	/// The trust envelope lacked required context. An upstream gateway
	/// misconfiguration, not a caller mistake; logged loudly at the edge.
	#[error("Request context incomplete: {message}")]
	ContextIncomplete { message: String },
	#[error("Access denied: {message}")]
	AccessDenied { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}
impl From<croft_storage::Error> for ServiceError {
	fn from(err: croft_storage::Error) -> Self {
		match err {
			croft_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			croft_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			croft_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}
impl From<croft_providers::Error> for ServiceError {
	fn from(err: croft_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
impl From<croft_domain::auth::EnvelopeError> for ServiceError {
	fn from(err: croft_domain::auth::EnvelopeError) -> Self {
		Self::ContextIncomplete { message: err.to_string() }
	}
}
