use sqlx::{Postgres, QueryBuilder};

use croft_domain::access::AccessScope;

/// Appends the tenant-scoping predicate to a query that already has a WHERE
/// clause. The same helper serves relational reads and vector search so the
/// two paths cannot drift apart.
///
/// `column` is a code-controlled column reference, never caller input.
pub fn push_scope_predicate(
	builder: &mut QueryBuilder<'_, Postgres>,
	scope: &AccessScope,
	column: &str,
) {
	match scope {
		AccessScope::Unrestricted => {},
		AccessScope::Organizations(orgs) => {
			builder.push(format!(" AND {column} = ANY("));
			builder.push_bind(orgs.iter().cloned().collect::<Vec<String>>());
			builder.push(")");
		},
		AccessScope::DenyAll => {
			builder.push(" AND FALSE");
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn rendered(scope: &AccessScope) -> String {
		let mut builder = QueryBuilder::new("SELECT 1 FROM entities WHERE TRUE");

		push_scope_predicate(&mut builder, scope, "organization_id");

		builder.sql().to_string()
	}

	#[test]
	fn unrestricted_adds_no_filter() {
		assert_eq!(rendered(&AccessScope::Unrestricted), "SELECT 1 FROM entities WHERE TRUE");
	}

	#[test]
	fn organizations_bind_a_parameter() {
		let sql = rendered(&AccessScope::single("org-a"));

		assert!(sql.contains("organization_id = ANY($1)"));
	}

	#[test]
	fn deny_all_matches_nothing() {
		assert!(rendered(&AccessScope::DenyAll).ends_with("AND FALSE"));
	}
}
