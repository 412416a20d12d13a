//! Eligibility criteria entity model and DTOs.
//!
//! Maps to the `eligibility_criteria` table. The wire format is camelCase
//! to match the rule-builder clients.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crewgate_core::eligibility::rules::GroupRule;
use crewgate_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `eligibility_criteria` table.
///
/// The root group is stored as JSONB; decode it with
/// [`EligibilityCriteria::decode_root_group`] when the tree itself is
/// needed rather than the raw document.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityCriteria {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub root_group: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl EligibilityCriteria {
    /// Decode the stored tree into the typed rule model.
    pub fn decode_root_group(&self) -> Result<GroupRule, serde_json::Error> {
        serde_json::from_value(self.root_group.clone())
    }

    /// Project this row onto its list-view summary, computing `rule_count`
    /// from the stored tree.
    pub fn to_summary(&self) -> Result<CriteriaSummary, serde_json::Error> {
        let root_group = self.decode_root_group()?;
        Ok(CriteriaSummary {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            is_active: self.is_active,
            rule_count: root_group.rule_count(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// List-view projection: everything but the tree, plus the recursive count
/// of non-group nodes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaSummary {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub rule_count: usize,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Create / Update DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a criteria document. The tree deserializes into the
/// typed rule model, so unknown node discriminants are rejected at the
/// JSON boundary.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCriteria {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub root_group: GroupRule,
}

/// DTO for patching an existing criteria document. Fields are
/// independently settable; omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCriteria {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub root_group: Option<GroupRule>,
    /// Optimistic concurrency guard: when present, the update is refused
    /// unless it matches the stored row's `updated_at`.
    pub expected_updated_at: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row(root_group: serde_json::Value) -> EligibilityCriteria {
        EligibilityCriteria {
            id: 7,
            name: "Union welders".to_string(),
            description: None,
            is_active: true,
            root_group,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn summary_counts_non_group_nodes() {
        let tree = json!({
            "logic": "AND",
            "children": [
                {"nodeType": "FIELD_RULE", "fieldId": "candidate.trade", "operator": "equals", "value": "WELDER"},
                {"nodeType": "FIELD_RULE", "fieldId": "candidate.is_union_member", "operator": "equals", "value": true},
                {"nodeType": "GROUP", "logic": "OR", "children": [
                    {"nodeType": "FIELD_RULE", "fieldId": "project.region", "operator": "equals", "value": "GULF"},
                    {"nodeType": "SQL_RULE", "name": "check", "query": "SELECT true"},
                ]},
            ],
        });
        let summary = sample_row(tree).to_summary().unwrap();
        assert_eq!(summary.rule_count, 4);
    }

    #[test]
    fn corrupt_tree_fails_to_decode() {
        let row = sample_row(json!({"logic": "XOR", "children": []}));
        assert!(row.decode_root_group().is_err());
    }

    #[test]
    fn create_dto_parses_camel_case() {
        let body: CreateCriteria = serde_json::from_value(json!({
            "name": "Union welders",
            "rootGroup": {"logic": "AND", "children": []},
        }))
        .unwrap();
        assert_eq!(body.name, "Union welders");
        assert!(body.description.is_none());
        assert!(body.root_group.children.is_empty());
    }

    #[test]
    fn create_dto_rejects_unknown_discriminant() {
        let result: Result<CreateCriteria, _> = serde_json::from_value(json!({
            "name": "Bad",
            "rootGroup": {"logic": "AND", "children": [
                {"nodeType": "REGEX_RULE", "pattern": ".*"},
            ]},
        }));
        assert!(result.is_err());
    }

    #[test]
    fn update_dto_fields_default_to_none() {
        let body: UpdateCriteria = serde_json::from_value(json!({"isActive": false})).unwrap();
        assert_eq!(body.is_active, Some(false));
        assert!(body.name.is_none());
        assert!(body.root_group.is_none());
        assert!(body.expected_updated_at.is_none());
    }
}
