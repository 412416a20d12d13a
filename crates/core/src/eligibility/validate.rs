//! Structural validation of rule trees.
//!
//! Validation runs before persistence and before evaluation: a tree that
//! fails here is never stored and never partially evaluated. Every issue
//! carries the node's path so nested problems can be pinpointed.

use std::fmt;

use serde::Serialize;

use crate::types::Timestamp;

use super::fields::{DataType, FieldRegistry};
use super::rules::{Arity, FieldRule, GroupRule, NodePath, Operator, RuleNode, RuleValue};

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// What went wrong with a single node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(
    tag = "kind",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum IssueKind {
    /// The rule references a field id absent from the registry.
    UnknownField { field_id: String },
    /// The operator is not in the referenced field's allowed set.
    OperatorNotAllowedForField { field_id: String, operator: Operator },
    /// A `between` rule is missing its upper bound.
    MissingSecondaryValueForBetween,
    /// A configured value is missing or incompatible with the field's
    /// declared data type.
    TypeMismatch { field_id: String, expected: DataType },
    /// A SQL rule with blank query text.
    EmptyPredicate,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::UnknownField { field_id } => {
                write!(f, "unknown field '{field_id}'")
            }
            IssueKind::OperatorNotAllowedForField { field_id, operator } => {
                write!(f, "operator '{operator}' is not allowed for field '{field_id}'")
            }
            IssueKind::MissingSecondaryValueForBetween => {
                f.write_str("'between' requires a second value")
            }
            IssueKind::TypeMismatch { field_id, expected } => {
                write!(f, "value for field '{field_id}' must be a {expected} value")
            }
            IssueKind::EmptyPredicate => f.write_str("SQL rule has empty query text"),
        }
    }
}

/// A single validation failure, located by node path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub path: NodePath,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)
    }
}

// ---------------------------------------------------------------------------
// Tree validation
// ---------------------------------------------------------------------------

/// Validate every node of a tree against the registry.
///
/// Returns all issues found; an empty vec means the tree is valid.
pub fn validate_tree(root: &GroupRule, registry: &FieldRegistry) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    validate_group(root, registry, &NodePath::root(), &mut issues);
    issues
}

/// Validate a single field rule.
///
/// Returns the first issue found; [`validate_tree`] reports all of them.
pub fn validate_field_rule(rule: &FieldRule, registry: &FieldRegistry) -> Result<(), IssueKind> {
    match field_rule_issues(rule, registry).into_iter().next() {
        Some(kind) => Err(kind),
        None => Ok(()),
    }
}

fn validate_group(
    group: &GroupRule,
    registry: &FieldRegistry,
    path: &NodePath,
    issues: &mut Vec<ValidationIssue>,
) {
    for (index, child) in group.children.iter().enumerate() {
        let child_path = path.child(index);
        match child {
            RuleNode::Group(nested) => validate_group(nested, registry, &child_path, issues),
            RuleNode::Field(rule) => {
                issues.extend(field_rule_issues(rule, registry).into_iter().map(|kind| {
                    ValidationIssue {
                        path: child_path.clone(),
                        kind,
                    }
                }));
            }
            RuleNode::Predicate(rule) => {
                if rule.query.trim().is_empty() {
                    issues.push(ValidationIssue {
                        path: child_path,
                        kind: IssueKind::EmptyPredicate,
                    });
                }
            }
        }
    }
}

fn field_rule_issues(rule: &FieldRule, registry: &FieldRegistry) -> Vec<IssueKind> {
    let Some(field) = registry.lookup(&rule.field_id) else {
        // Without a definition there is nothing further to check against.
        return vec![IssueKind::UnknownField {
            field_id: rule.field_id.clone(),
        }];
    };

    let mut issues = Vec::new();

    if !field.allows_operator(rule.operator) {
        issues.push(IssueKind::OperatorNotAllowedForField {
            field_id: rule.field_id.clone(),
            operator: rule.operator,
        });
    }

    match rule.operator.arity() {
        Arity::Zero => {}
        Arity::One => {
            if !value_is_compatible(rule.value.as_ref(), field.data_type, rule.operator) {
                issues.push(IssueKind::TypeMismatch {
                    field_id: rule.field_id.clone(),
                    expected: field.data_type,
                });
            }
        }
        Arity::Two => {
            if !value_is_compatible(rule.value.as_ref(), field.data_type, rule.operator) {
                issues.push(IssueKind::TypeMismatch {
                    field_id: rule.field_id.clone(),
                    expected: field.data_type,
                });
            }
            match rule.second_value.as_ref() {
                None => issues.push(IssueKind::MissingSecondaryValueForBetween),
                Some(second) => {
                    if !value_is_compatible(Some(second), field.data_type, rule.operator) {
                        issues.push(IssueKind::TypeMismatch {
                            field_id: rule.field_id.clone(),
                            expected: field.data_type,
                        });
                    }
                }
            }
        }
    }

    issues
}

/// Whether a configured value fits the field's declared data type under the
/// given operator. A missing required value counts as a mismatch.
fn value_is_compatible(value: Option<&RuleValue>, data_type: DataType, operator: Operator) -> bool {
    let Some(value) = value else {
        return false;
    };

    // Membership operators always take a value set.
    if matches!(operator, Operator::In | Operator::NotIn) {
        return matches!(value, RuleValue::List(_));
    }

    match data_type {
        DataType::String => matches!(value, RuleValue::Text(_)),
        DataType::Number => matches!(value, RuleValue::Number(_)),
        DataType::Boolean => matches!(value, RuleValue::Bool(_)),
        DataType::Date => match value {
            RuleValue::Text(text) => parse_date(text).is_some(),
            _ => false,
        },
        // Array membership tests compare against a single element;
        // set equality takes a full list.
        DataType::Array => match operator {
            Operator::Contains | Operator::NotContains => matches!(value, RuleValue::Text(_)),
            _ => matches!(value, RuleValue::List(_)),
        },
    }
}

/// Parse a date value: RFC 3339 first, then bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_date(text: &str) -> Option<Timestamp> {
    if let Ok(instant) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&chrono::Utc));
    }
    let date = chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
