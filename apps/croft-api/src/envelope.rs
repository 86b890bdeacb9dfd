//! Trust envelope extraction.
//!
//! The service sits behind a gateway that authenticates callers and forwards
//! identity as headers. Those headers are trusted as-is; an envelope missing
//! the caller identity is a gateway misconfiguration and surfaces as a 500,
//! never as a caller-facing 4xx.

use axum::{
	extract::FromRequestParts,
	http::{HeaderMap, request::Parts},
};
use serde_json::{Map, Value};

use croft_domain::auth::{
	self, AuthContext, CLAIM_ACCESSIBLE_ORGANIZATION_IDS, CLAIM_ORGANIZATION_ID, CLAIM_PERMISSIONS,
	CLAIM_USER_ID, CLAIM_USER_ROLE,
};
use croft_service::ServiceError;

use crate::routes::ApiError;

pub const HEADER_USER_ID: &str = "x-user-id";
pub const HEADER_ORGANIZATION_ID: &str = "x-organization-id";
pub const HEADER_ACCESSIBLE_ORGANIZATION_IDS: &str = "x-accessible-organization-ids";
pub const HEADER_PERMISSIONS: &str = "x-permissions";
pub const HEADER_USER_ROLE: &str = "x-user-role";

pub struct Envelope(pub AuthContext);

impl<S> FromRequestParts<S> for Envelope
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let claims = claims_from_headers(&parts.headers);
		let ctx = AuthContext::from_envelope(&claims)
			.map_err(|err: auth::EnvelopeError| ApiError::from(ServiceError::from(err)))?;

		Ok(Self(ctx))
	}
}

fn claims_from_headers(headers: &HeaderMap) -> Map<String, Value> {
	let pairs = [
		(HEADER_USER_ID, CLAIM_USER_ID),
		(HEADER_ORGANIZATION_ID, CLAIM_ORGANIZATION_ID),
		(HEADER_ACCESSIBLE_ORGANIZATION_IDS, CLAIM_ACCESSIBLE_ORGANIZATION_IDS),
		(HEADER_PERMISSIONS, CLAIM_PERMISSIONS),
		(HEADER_USER_ROLE, CLAIM_USER_ROLE),
	];
	let mut claims = Map::new();

	for (header, claim) in pairs {
		if let Some(value) = headers.get(header).and_then(|value| value.to_str().ok()) {
			claims.insert(claim.to_string(), Value::from(value));
		}
	}

	claims
}

#[cfg(test)]
mod tests {
	use axum::http::HeaderValue;

	use super::*;

	#[test]
	fn maps_headers_to_claims() {
		let mut headers = HeaderMap::new();

		headers.insert(HEADER_USER_ID, HeaderValue::from_static("user-1"));
		headers.insert(HEADER_ORGANIZATION_ID, HeaderValue::from_static("org-a"));
		headers.insert(
			HEADER_ACCESSIBLE_ORGANIZATION_IDS,
			HeaderValue::from_static(r#"["org-a","org-b"]"#),
		);

		let claims = claims_from_headers(&headers);
		let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");

		assert_eq!(ctx.user_id, "user-1");
		assert_eq!(ctx.organization_id.as_deref(), Some("org-a"));
		assert!(ctx.can_access_cached("org-b"));
	}

	#[test]
	fn missing_identity_header_fails_extraction() {
		let headers = HeaderMap::new();
		let claims = claims_from_headers(&headers);

		assert!(AuthContext::from_envelope(&claims).is_err());
	}
}
