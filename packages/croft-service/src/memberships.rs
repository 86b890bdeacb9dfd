//! Membership administration and self-service listing.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use croft_domain::auth::AuthContext;
use croft_storage::{membership, models::Membership};

use crate::{CroftService, ServiceError, ServiceResult, time_serde};

const DEFAULT_ROLE: &str = "member";

#[derive(Debug, Clone, Deserialize)]
pub struct GrantMembershipRequest {
	pub user_id: String,
	pub organization_id: String,
	pub role: Option<String>,
	#[serde(default = "default_is_active")]
	pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MembershipResponse {
	pub user_id: String,
	pub organization_id: String,
	pub role: String,
	pub is_active: bool,
	#[serde(with = "time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Membership> for MembershipResponse {
	fn from(membership: Membership) -> Self {
		Self {
			user_id: membership.user_id,
			organization_id: membership.organization_id,
			role: membership.role,
			is_active: membership.is_active,
			created_at: membership.created_at,
			updated_at: membership.updated_at,
		}
	}
}

impl CroftService {
	/// Creates or updates a membership row. Administrative; requires the
	/// read-all override rather than any tenant claim.
	pub async fn grant_membership(
		&self,
		ctx: &AuthContext,
		req: GrantMembershipRequest,
	) -> ServiceResult<MembershipResponse> {
		if !ctx.has_read_all() {
			return Err(ServiceError::AccessDenied {
				message: "membership administration requires elevated access".into(),
			});
		}

		let user_id = req.user_id.trim();
		let organization_id = req.organization_id.trim();

		if user_id.is_empty() || organization_id.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "user_id and organization_id must not be empty".into(),
			});
		}

		let membership = membership::upsert_membership(
			&self.db,
			user_id,
			organization_id,
			req.role.as_deref().unwrap_or(DEFAULT_ROLE),
			req.is_active,
			OffsetDateTime::now_utc(),
		)
		.await?;

		Ok(membership.into())
	}

	/// Lists the caller's own memberships, matched by exact identity.
	pub async fn list_my_memberships(
		&self,
		ctx: &AuthContext,
	) -> ServiceResult<Vec<MembershipResponse>> {
		let memberships = membership::list_memberships_for_user(&self.db, &ctx.user_id).await?;

		Ok(memberships.into_iter().map(MembershipResponse::from).collect())
	}
}

fn default_is_active() -> bool {
	true
}
