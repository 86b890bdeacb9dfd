use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Result, db::Db, models::Membership};

/// Live membership lookup, bypassing the token's cached accessible set. Rows
/// are returned active or not; the caller decides what an inactive row grants.
pub async fn find_membership(
	db: &Db,
	user_id: &str,
	organization_id: &str,
) -> Result<Option<Membership>> {
	let membership = sqlx::query_as::<_, Membership>(
		"SELECT * FROM memberships WHERE user_id = $1 AND organization_id = $2",
	)
	.bind(user_id)
	.bind(organization_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(membership)
}

pub async fn list_memberships_for_user(db: &Db, user_id: &str) -> Result<Vec<Membership>> {
	let memberships = sqlx::query_as::<_, Membership>(
		"SELECT * FROM memberships WHERE user_id = $1 ORDER BY organization_id",
	)
	.bind(user_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(memberships)
}

pub async fn upsert_membership(
	db: &Db,
	user_id: &str,
	organization_id: &str,
	role: &str,
	is_active: bool,
	now: OffsetDateTime,
) -> Result<Membership> {
	let membership = sqlx::query_as::<_, Membership>(
		"\
INSERT INTO memberships (
	membership_id,
	user_id,
	organization_id,
	role,
	is_active,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $6)
ON CONFLICT (user_id, organization_id) DO UPDATE
SET
	role = EXCLUDED.role,
	is_active = EXCLUDED.is_active,
	updated_at = EXCLUDED.updated_at
RETURNING *",
	)
	.bind(Uuid::new_v4())
	.bind(user_id)
	.bind(organization_id)
	.bind(role)
	.bind(is_active)
	.bind(now)
	.fetch_one(&db.pool)
	.await?;

	Ok(membership)
}
