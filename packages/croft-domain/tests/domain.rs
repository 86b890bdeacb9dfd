use serde_json::{Map, Value};

use croft_domain::{
	access::AccessScope,
	auth::{
		AuthContext, CLAIM_ACCESSIBLE_ORGANIZATION_IDS, CLAIM_ORGANIZATION_ID, CLAIM_PERMISSIONS,
		CLAIM_USER_ID,
	},
	compose::{EntityFields, EntityKind, compose},
};

fn envelope(entries: &[(&str, Value)]) -> Map<String, Value> {
	entries.iter().map(|(key, value)| (key.to_string(), value.clone())).collect()
}

#[test]
fn envelope_resolves_into_a_scoped_read() {
	let claims = envelope(&[
		(CLAIM_USER_ID, Value::from("user-7")),
		(CLAIM_ORGANIZATION_ID, Value::from("org-a")),
		(CLAIM_ACCESSIBLE_ORGANIZATION_IDS, Value::from(r#"["org-a","org-b"]"#)),
	]);
	let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");
	let scope = AccessScope::for_read(&ctx);

	assert!(scope.allows("org-a"));
	assert!(scope.allows("org-b"));
	assert!(!scope.allows("org-c"));
}

#[test]
fn empty_claims_never_grant_access() {
	let claims = envelope(&[
		(CLAIM_USER_ID, Value::from("user-7")),
		(CLAIM_PERMISSIONS, Value::from("{broken")),
	]);
	let ctx = AuthContext::from_envelope(&claims).expect("Envelope must resolve.");

	assert!(AccessScope::for_read(&ctx).is_deny_all());
}

#[test]
fn composed_text_matches_example_scenario() {
	// An entity named "Hand Drill" with an empty description indexes as just
	// its name.
	let fields = EntityFields { name: "Hand Drill", description: Some(""), ..Default::default() };

	assert_eq!(compose(EntityKind::Tool, fields), "Hand Drill");
}
