use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Textual facet a vector represents. Only one facet exists today; the tag is
/// stored alongside every vector so further facets can coexist later.
pub const DEFAULT_EMBEDDING_TYPE: &str = "profile";

const SEPARATOR: char = '\n';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Tool,
	Part,
	Mission,
	Issue,
	Action,
	Policy,
	Exploration,
}
impl EntityKind {
	pub const ALL: [Self; 7] = [
		Self::Tool,
		Self::Part,
		Self::Mission,
		Self::Issue,
		Self::Action,
		Self::Policy,
		Self::Exploration,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Tool => "tool",
			Self::Part => "part",
			Self::Mission => "mission",
			Self::Issue => "issue",
			Self::Action => "action",
			Self::Policy => "policy",
			Self::Exploration => "exploration",
		}
	}
}
impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
impl FromStr for EntityKind {
	type Err = UnknownEntityKind;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw {
			"tool" => Ok(Self::Tool),
			"part" => Ok(Self::Part),
			"mission" => Ok(Self::Mission),
			"issue" => Ok(Self::Issue),
			"action" => Ok(Self::Action),
			"policy" => Ok(Self::Policy),
			"exploration" => Ok(Self::Exploration),
			_ => Err(UnknownEntityKind { raw: raw.to_string() }),
		}
	}
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown entity kind: {raw}.")]
pub struct UnknownEntityKind {
	pub raw: String,
}

/// Searchable fields of an entity, as stored. Absent fields stay absent; the
/// composer never renders a placeholder for them.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityFields<'a> {
	pub name: &'a str,
	pub description: Option<&'a str>,
	pub notes: Option<&'a str>,
	pub policy_text: Option<&'a str>,
}

/// Deterministically derives the canonical text indexed for an entity.
///
/// Fields are concatenated in a fixed per-kind order with a newline separator;
/// empty fields are skipped without placeholder tokens. An empty result means
/// "do not index".
pub fn compose(kind: EntityKind, fields: EntityFields<'_>) -> String {
	let ordered: [Option<&str>; 3] = match kind {
		EntityKind::Tool | EntityKind::Part | EntityKind::Mission | EntityKind::Issue
		| EntityKind::Action => [Some(fields.name), fields.description, fields.notes],
		EntityKind::Policy => [Some(fields.name), fields.policy_text, fields.description],
		EntityKind::Exploration => [Some(fields.name), fields.notes, fields.description],
	};
	let mut out = String::new();

	for part in ordered.into_iter().flatten() {
		let trimmed = part.trim();

		if trimmed.is_empty() {
			continue;
		}
		if !out.is_empty() {
			out.push(SEPARATOR);
		}

		out.push_str(trimmed);
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn concatenates_in_fixed_order() {
		let fields = EntityFields {
			name: "Hand Drill",
			description: Some("Cordless 18V"),
			notes: Some("Stored in shed B"),
			policy_text: None,
		};

		assert_eq!(
			compose(EntityKind::Tool, fields),
			"Hand Drill\nCordless 18V\nStored in shed B"
		);
	}

	#[test]
	fn policy_prefers_policy_text_over_description() {
		let fields = EntityFields {
			name: "Irrigation Policy",
			description: Some("Summary"),
			notes: None,
			policy_text: Some("Water before 9am"),
		};

		assert_eq!(
			compose(EntityKind::Policy, fields),
			"Irrigation Policy\nWater before 9am\nSummary"
		);
	}

	#[test]
	fn skips_absent_fields_without_placeholders() {
		let fields = EntityFields { name: "Hand Drill", ..Default::default() };
		let text = compose(EntityKind::Tool, fields);

		assert_eq!(text, "Hand Drill");
		assert!(!text.contains("null"));
		assert!(!text.contains("undefined"));
	}

	#[test]
	fn all_empty_fields_compose_to_empty() {
		let fields = EntityFields { name: "  ", description: Some(""), ..Default::default() };

		assert!(compose(EntityKind::Mission, fields).is_empty());
	}

	#[test]
	fn compose_is_deterministic() {
		let fields = EntityFields {
			name: "Fence Repair",
			description: Some("North paddock"),
			notes: Some("Needs two people"),
			policy_text: None,
		};

		assert_eq!(compose(EntityKind::Mission, fields), compose(EntityKind::Mission, fields));
	}

	#[test]
	fn kind_round_trips_through_str() {
		for kind in EntityKind::ALL {
			assert_eq!(kind.as_str().parse::<EntityKind>().expect("Kind must parse."), kind);
		}
		assert!("tractor".parse::<EntityKind>().is_err());
	}
}
