use std::collections::HashSet;

use serde_json::{Map, Value};

/// Disables tenant scoping entirely. Granted to privileged service callers only.
pub const READ_ALL_PERMISSION: &str = "data:read:all";

pub const CLAIM_USER_ID: &str = "user_id";
pub const CLAIM_ORGANIZATION_ID: &str = "organization_id";
pub const CLAIM_ACCESSIBLE_ORGANIZATION_IDS: &str = "accessible_organization_ids";
pub const CLAIM_PERMISSIONS: &str = "permissions";
pub const CLAIM_USER_ROLE: &str = "user_role";

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
	#[error("Trust envelope is missing the caller identity.")]
	MissingIdentity,
	#[error("Trust envelope is missing organization_id.")]
	MissingOrganization,
}

/// Per-request caller context derived from the gateway's trust envelope.
///
/// Constructed fresh for every request and never mutated. The accessible set is
/// a claim cached at token issuance, not a live membership read.
#[derive(Debug, Clone)]
pub struct AuthContext {
	pub user_id: String,
	/// Active tenant. Absent when the upstream gateway attached an incomplete
	/// envelope; callers must treat that as fatal for tenant-scoped writes and
	/// must never substitute a default.
	pub organization_id: Option<String>,
	pub accessible_organization_ids: HashSet<String>,
	pub permissions: HashSet<String>,
	pub user_role: Option<String>,
}
impl AuthContext {
	/// Pure extraction. Malformed or absent claim encodings normalize to empty
	/// sets, never to "all access".
	pub fn from_envelope(claims: &Map<String, Value>) -> Result<Self, EnvelopeError> {
		let user_id = claim_string(claims, CLAIM_USER_ID).ok_or(EnvelopeError::MissingIdentity)?;
		let organization_id = claim_string(claims, CLAIM_ORGANIZATION_ID);
		let accessible_organization_ids =
			claim_string_set(claims, CLAIM_ACCESSIBLE_ORGANIZATION_IDS);
		let permissions = claim_string_set(claims, CLAIM_PERMISSIONS);
		let user_role = claim_string(claims, CLAIM_USER_ROLE);

		Ok(Self {
			user_id,
			organization_id,
			accessible_organization_ids,
			permissions,
			user_role,
		})
	}

	pub fn has_read_all(&self) -> bool {
		self.permissions.contains(READ_ALL_PERMISSION)
	}

	pub fn require_organization(&self) -> Result<&str, EnvelopeError> {
		self.organization_id
			.as_deref()
			.filter(|org| !org.is_empty())
			.ok_or(EnvelopeError::MissingOrganization)
	}

	pub fn can_access_cached(&self, organization_id: &str) -> bool {
		self.accessible_organization_ids.contains(organization_id)
	}
}

fn claim_string(claims: &Map<String, Value>, key: &str) -> Option<String> {
	claims
		.get(key)
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_string)
}

/// Accepts either a JSON array of strings or a string holding JSON array text,
/// which is how gateways commonly flatten claims into headers.
fn claim_string_set(claims: &Map<String, Value>, key: &str) -> HashSet<String> {
	let Some(value) = claims.get(key) else {
		return HashSet::new();
	};

	match value {
		Value::Array(items) => collect_strings(items),
		Value::String(raw) => match serde_json::from_str::<Value>(raw) {
			Ok(Value::Array(items)) => collect_strings(&items),
			_ => HashSet::new(),
		},
		_ => HashSet::new(),
	}
}

fn collect_strings(items: &[Value]) -> HashSet<String> {
	items
		.iter()
		.filter_map(Value::as_str)
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(str::to_string)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn envelope(entries: &[(&str, Value)]) -> Map<String, Value> {
		entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
	}

	#[test]
	fn resolves_full_envelope() {
		let claims = envelope(&[
			(CLAIM_USER_ID, Value::from("user-1")),
			(CLAIM_ORGANIZATION_ID, Value::from("org-a")),
			(CLAIM_ACCESSIBLE_ORGANIZATION_IDS, Value::from(r#"["org-a","org-b"]"#)),
			(CLAIM_PERMISSIONS, serde_json::json!(["data:read:all"])),
			(CLAIM_USER_ROLE, Value::from("operator")),
		]);
		let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");

		assert_eq!(ctx.user_id, "user-1");
		assert_eq!(ctx.organization_id.as_deref(), Some("org-a"));
		assert!(ctx.can_access_cached("org-b"));
		assert!(ctx.has_read_all());
		assert_eq!(ctx.user_role.as_deref(), Some("operator"));
	}

	#[test]
	fn missing_identity_is_an_error() {
		let claims = envelope(&[(CLAIM_ORGANIZATION_ID, Value::from("org-a"))]);

		assert!(matches!(
			AuthContext::from_envelope(&claims),
			Err(EnvelopeError::MissingIdentity)
		));
	}

	#[test]
	fn missing_organization_leaves_context_incomplete() {
		let claims = envelope(&[(CLAIM_USER_ID, Value::from("user-1"))]);
		let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");

		assert!(ctx.organization_id.is_none());
		assert!(matches!(ctx.require_organization(), Err(EnvelopeError::MissingOrganization)));
	}

	#[test]
	fn malformed_claims_normalize_to_empty_sets() {
		let claims = envelope(&[
			(CLAIM_USER_ID, Value::from("user-1")),
			(CLAIM_ACCESSIBLE_ORGANIZATION_IDS, Value::from("not-json")),
			(CLAIM_PERMISSIONS, Value::from(42)),
		]);
		let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");

		assert!(ctx.accessible_organization_ids.is_empty());
		assert!(ctx.permissions.is_empty());
		assert!(!ctx.has_read_all());
	}

	#[test]
	fn blank_entries_are_dropped() {
		let claims = envelope(&[
			(CLAIM_USER_ID, Value::from("user-1")),
			(CLAIM_ACCESSIBLE_ORGANIZATION_IDS, serde_json::json!(["org-a", " ", ""])),
		]);
		let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");

		assert_eq!(ctx.accessible_organization_ids.len(), 1);
		assert!(ctx.can_access_cached("org-a"));
	}
}
