//! Rule tree model and wire format.
//!
//! A criteria document owns exactly one root [`GroupRule`]. Nodes serialize
//! with a `nodeType` discriminant (`FIELD_RULE` | `SQL_RULE` | `GROUP`);
//! unknown discriminants are rejected at the JSON boundary, never silently
//! ignored. Trees are plain owned data: `Clone` is the deep copy used by
//! duplication features and `PartialEq` is structural equality.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// Comparison and presence operators usable in field rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    In,
    NotIn,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Between,
    IsEmpty,
    IsNotEmpty,
}

/// How many configured values an operator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Presence tests (`is_empty`, `is_not_empty`).
    Zero,
    /// Single comparison value.
    One,
    /// Lower and upper bound (`between`).
    Two,
}

impl Operator {
    /// The number of configured values this operator requires.
    pub fn arity(&self) -> Arity {
        match self {
            Operator::IsEmpty | Operator::IsNotEmpty => Arity::Zero,
            Operator::Between => Arity::Two,
            _ => Arity::One,
        }
    }

    /// Wire name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterOrEqual => "greater_or_equal",
            Operator::LessOrEqual => "less_or_equal",
            Operator::Between => "between",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule values
// ---------------------------------------------------------------------------

/// A configured comparison value.
///
/// The wire format is the bare JSON value (untagged); the variant set is
/// closed so type compatibility with a field's declared data type can be
/// checked at validation time instead of failing deep inside evaluation.
/// Dates travel as ISO-8601 text and are parsed against `DataType::Date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Logic combinator for a group's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupLogic {
    And,
    Or,
}

/// A comparison between a catalog field's subject value and configured
/// value(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub field_id: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RuleValue>,
    /// Upper bound; required iff `operator` is `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_value: Option<RuleValue>,
}

/// A named, opaque query predicate.
///
/// The engine never interprets `query`; evaluation is delegated to an
/// injected [`super::evaluator::PredicateExecutor`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredicateRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub query: String,
}

/// An AND/OR combinator over an ordered sequence of child nodes.
///
/// Children may themselves be groups, to arbitrary depth, and the sequence
/// may be empty: an empty AND group is vacuously true, an empty OR group
/// vacuously false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRule {
    pub logic: GroupLogic,
    pub children: Vec<RuleNode>,
}

/// A node in a rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "nodeType")]
pub enum RuleNode {
    #[serde(rename = "FIELD_RULE")]
    Field(FieldRule),
    #[serde(rename = "SQL_RULE")]
    Predicate(PredicateRule),
    #[serde(rename = "GROUP")]
    Group(GroupRule),
}

impl RuleNode {
    /// Recursive count of non-group nodes. Groups are structural only and
    /// never counted.
    pub fn rule_count(&self) -> usize {
        match self {
            RuleNode::Group(group) => group.rule_count(),
            RuleNode::Field(_) | RuleNode::Predicate(_) => 1,
        }
    }
}

impl GroupRule {
    /// New empty group with the given combinator.
    pub fn new(logic: GroupLogic) -> Self {
        Self {
            logic,
            children: Vec::new(),
        }
    }

    /// Recursive count of non-group nodes under this group.
    pub fn rule_count(&self) -> usize {
        self.children.iter().map(RuleNode::rule_count).sum()
    }
}

// ---------------------------------------------------------------------------
// Node paths
// ---------------------------------------------------------------------------

/// Location of a node in a tree: the sequence of child indices from the
/// root group. The root itself is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NodePath(pub Vec<usize>);

impl NodePath {
    /// The root group's path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Path of the child at `index` under this node.
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    /// Renders as `$` for the root, `$.2.0` for nested positions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for index in &self.0 {
            write!(f, ".{index}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trade_rule() -> RuleNode {
        RuleNode::Field(FieldRule {
            field_id: "candidate.trade".to_string(),
            operator: Operator::Equals,
            value: Some(RuleValue::Text("WELDER".to_string())),
            second_value: None,
        })
    }

    // -- serialization ----------------------------------------------------

    #[test]
    fn field_rule_wire_format() {
        let node = trade_rule();
        let wire = serde_json::to_value(&node).unwrap();
        assert_eq!(
            wire,
            json!({
                "nodeType": "FIELD_RULE",
                "fieldId": "candidate.trade",
                "operator": "equals",
                "value": "WELDER",
            })
        );
    }

    #[test]
    fn group_round_trip_preserves_child_order() {
        let group = GroupRule {
            logic: GroupLogic::And,
            children: vec![
                trade_rule(),
                RuleNode::Group(GroupRule {
                    logic: GroupLogic::Or,
                    children: vec![
                        RuleNode::Predicate(PredicateRule {
                            name: "passed background check".to_string(),
                            description: None,
                            query: "SELECT passed FROM background_checks".to_string(),
                        }),
                        trade_rule(),
                    ],
                }),
            ],
        };

        let wire = serde_json::to_string(&group).unwrap();
        let parsed: GroupRule = serde_json::from_str(&wire).unwrap();
        assert_eq!(parsed, group);
    }

    #[test]
    fn unknown_discriminant_rejected() {
        let wire = json!({
            "nodeType": "REGEX_RULE",
            "fieldId": "candidate.trade",
            "operator": "equals",
            "value": "WELDER",
        });
        let result: Result<RuleNode, _> = serde_json::from_value(wire);
        assert!(result.is_err());
    }

    #[test]
    fn between_rule_carries_second_value() {
        let wire = json!({
            "nodeType": "FIELD_RULE",
            "fieldId": "candidate.years_experience",
            "operator": "between",
            "value": 3.0,
            "secondValue": 10.0,
        });
        let node: RuleNode = serde_json::from_value(wire).unwrap();
        match node {
            RuleNode::Field(rule) => {
                assert_eq!(rule.operator, Operator::Between);
                assert_eq!(rule.value, Some(RuleValue::Number(3.0)));
                assert_eq!(rule.second_value, Some(RuleValue::Number(10.0)));
            }
            other => panic!("expected field rule, got {other:?}"),
        }
    }

    #[test]
    fn list_value_parses_from_string_array() {
        let wire = json!(["WELDER", "PIPEFITTER"]);
        let value: RuleValue = serde_json::from_value(wire).unwrap();
        assert_eq!(
            value,
            RuleValue::List(vec!["WELDER".to_string(), "PIPEFITTER".to_string()])
        );
    }

    // -- rule_count ---------------------------------------------------------

    #[test]
    fn rule_count_skips_groups() {
        // Root AND with 2 field rules and a nested OR with 2 more: count = 4.
        let nested = RuleNode::Group(GroupRule {
            logic: GroupLogic::Or,
            children: vec![trade_rule(), trade_rule()],
        });
        let root = GroupRule {
            logic: GroupLogic::And,
            children: vec![trade_rule(), trade_rule(), nested],
        };
        assert_eq!(root.rule_count(), 4);
    }

    #[test]
    fn rule_count_empty_group_is_zero() {
        assert_eq!(GroupRule::new(GroupLogic::And).rule_count(), 0);
    }

    // -- copies and equality -------------------------------------------------

    #[test]
    fn clone_is_a_deep_copy() {
        let original = GroupRule {
            logic: GroupLogic::And,
            children: vec![trade_rule()],
        };
        let mut copy = original.clone();
        copy.children.push(trade_rule());
        assert_eq!(original.children.len(), 1);
        assert_ne!(copy, original);
    }

    // -- paths ----------------------------------------------------------------

    #[test]
    fn path_display() {
        assert_eq!(NodePath::root().to_string(), "$");
        assert_eq!(NodePath::root().child(2).child(0).to_string(), "$.2.0");
    }

    #[test]
    fn operator_arity() {
        assert_eq!(Operator::IsEmpty.arity(), Arity::Zero);
        assert_eq!(Operator::Equals.arity(), Arity::One);
        assert_eq!(Operator::Between.arity(), Arity::Two);
    }
}
