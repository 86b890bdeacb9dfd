//! Tenant access resolution for single-tenant-targeted requests.
//!
//! The token's `accessible_organization_ids` claim is a cache. When a request
//! names a tenant outside that cache, the Membership Oracle consults the live
//! `memberships` table before denying, so callers whose grants are newer than
//! their token still get through.

use croft_domain::auth::AuthContext;
use croft_storage::{db::Db, membership};

use crate::{ServiceError, ServiceResult};

/// How a tenant-targeted request was authorized, kept for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGrant {
	ReadAll,
	CachedClaim,
	LiveMembership { role: String, is_active: bool },
}

/// Resolves access to a single named tenant: read-all override first, then
/// the cached claim set, then a live membership lookup. Inactive memberships
/// still grant read access; the grant records that for the caller to log.
pub async fn ensure_tenant_access(
	db: &Db,
	ctx: &AuthContext,
	organization_id: &str,
) -> ServiceResult<AccessGrant> {
	if ctx.has_read_all() {
		return Ok(AccessGrant::ReadAll);
	}
	if ctx.can_access_cached(organization_id) {
		return Ok(AccessGrant::CachedClaim);
	}

	match membership::find_membership(db, &ctx.user_id, organization_id).await? {
		Some(membership) => {
			if !membership.is_active {
				tracing::debug!(
					user_id = %ctx.user_id,
					organization_id,
					"access granted through inactive membership",
				);
			}

			Ok(AccessGrant::LiveMembership {
				role: membership.role,
				is_active: membership.is_active,
			})
		},
		None => Err(ServiceError::AccessDenied {
			message: format!("no membership for organization {organization_id}"),
		}),
	}
}
