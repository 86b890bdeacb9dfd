use std::collections::BTreeSet;

use crate::auth::AuthContext;

/// Tenant-scoping predicate shared by every read path, relational and vector
/// alike. Built once per request from the AuthContext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessScope {
	/// Read-all override; no tenant filter is applied.
	Unrestricted,
	/// Restrict to this tenant set.
	Organizations(BTreeSet<String>),
	/// No accessible tenants and no override. An empty result set, not an
	/// error; the ownership bypass is evaluated by the handler, not here.
	DenyAll,
}
impl AccessScope {
	pub fn for_read(ctx: &AuthContext) -> Self {
		if ctx.has_read_all() {
			return Self::Unrestricted;
		}
		if ctx.accessible_organization_ids.is_empty() {
			return Self::DenyAll;
		}

		Self::Organizations(ctx.accessible_organization_ids.iter().cloned().collect())
	}

	/// Scope for a single-tenant-targeted request, e.g. after a Membership
	/// Oracle grant. Valid for the current request only.
	pub fn single(organization_id: impl Into<String>) -> Self {
		Self::Organizations(BTreeSet::from([organization_id.into()]))
	}

	pub fn allows(&self, organization_id: &str) -> bool {
		match self {
			Self::Unrestricted => true,
			Self::Organizations(orgs) => orgs.contains(organization_id),
			Self::DenyAll => false,
		}
	}

	pub fn is_unrestricted(&self) -> bool {
		matches!(self, Self::Unrestricted)
	}

	pub fn is_deny_all(&self) -> bool {
		matches!(self, Self::DenyAll)
	}
}

/// Handler-level ownership bypass. Exact identity match only, never a prefix
/// or fuzzy match.
pub fn owns_record(ctx: &AuthContext, created_by: &str) -> bool {
	!created_by.is_empty() && ctx.user_id == created_by
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::auth::READ_ALL_PERMISSION;

	fn context(accessible: &[&str], permissions: &[&str]) -> AuthContext {
		AuthContext {
			user_id: "user-1".to_string(),
			organization_id: Some("org-a".to_string()),
			accessible_organization_ids: accessible.iter().map(|org| org.to_string()).collect(),
			permissions: permissions.iter().map(|perm| perm.to_string()).collect(),
			user_role: None,
		}
	}

	#[test]
	fn read_all_override_is_unrestricted() {
		let ctx = context(&[], &[READ_ALL_PERMISSION]);

		assert!(AccessScope::for_read(&ctx).is_unrestricted());
		assert!(AccessScope::for_read(&ctx).allows("any-org"));
	}

	#[test]
	fn accessible_set_restricts_to_those_tenants() {
		let ctx = context(&["org-a", "org-b"], &[]);
		let scope = AccessScope::for_read(&ctx);

		assert!(scope.allows("org-a"));
		assert!(scope.allows("org-b"));
		assert!(!scope.allows("org-c"));
	}

	#[test]
	fn empty_set_without_override_denies_all() {
		let ctx = context(&[], &[]);
		let scope = AccessScope::for_read(&ctx);

		assert!(scope.is_deny_all());
		assert!(!scope.allows("org-a"));
	}

	#[test]
	fn unrelated_permissions_do_not_unlock() {
		let ctx = context(&[], &["data:write:all", "admin"]);

		assert!(AccessScope::for_read(&ctx).is_deny_all());
	}

	#[test]
	fn ownership_is_exact_match_only() {
		let mut ctx = context(&[], &[]);

		assert!(owns_record(&ctx, "user-1"));
		assert!(!owns_record(&ctx, "user-10"));
		assert!(!owns_record(&ctx, "user"));
		assert!(!owns_record(&ctx, ""));

		ctx.user_id = String::new();
		ctx.accessible_organization_ids = HashSet::new();

		assert!(!owns_record(&ctx, ""));
	}

	#[test]
	fn single_tenant_scope_allows_only_that_tenant() {
		let scope = AccessScope::single("org-z");

		assert!(scope.allows("org-z"));
		assert!(!scope.allows("org-a"));
	}
}
