use time::OffsetDateTime;
use uuid::Uuid;

use croft_domain::access::AccessScope;
use croft_storage::{db::Db, entities, models::EntityRecord};

fn sample_entity(organization_id: &str) -> EntityRecord {
	let now = OffsetDateTime::now_utc();

	EntityRecord {
		entity_id: Uuid::new_v4(),
		organization_id: organization_id.to_string(),
		kind: "tool".to_string(),
		name: "Hand Drill".to_string(),
		description: Some("Cordless 18V".to_string()),
		notes: None,
		policy_text: None,
		status: "active".to_string(),
		created_by: "user-1".to_string(),
		created_at: now,
		updated_at: now,
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CROFT_PG_DSN to run."]
async fn schema_applies_and_scoped_reads_filter() {
	let Some(base_dsn) = croft_testkit::env_dsn() else {
		eprintln!("Skipping schema_applies_and_scoped_reads_filter; set CROFT_PG_DSN to run.");

		return;
	};
	let test_db =
		croft_testkit::TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = croft_config::Postgres {
		dsn: test_db.dsn().to_string(),
		pool_max_conns: 1,
		acquire_timeout_ms: 5_000,
	};
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema(3).await.expect("Failed to ensure schema.");
	// Re-running must be a no-op, not an error.
	db.ensure_schema(3).await.expect("Schema must be idempotent.");

	let record = sample_entity("org-a");

	entities::insert_entity(&db, &record).await.expect("Failed to insert entity.");

	let visible = entities::fetch_entity_scoped(&db, record.entity_id, &AccessScope::single("org-a"))
		.await
		.expect("Scoped fetch failed.");

	assert!(visible.is_some());

	let hidden = entities::fetch_entity_scoped(&db, record.entity_id, &AccessScope::single("org-b"))
		.await
		.expect("Scoped fetch failed.");

	assert!(hidden.is_none());

	let denied = entities::fetch_entity_scoped(&db, record.entity_id, &AccessScope::DenyAll)
		.await
		.expect("Scoped fetch failed.");

	assert!(denied.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
