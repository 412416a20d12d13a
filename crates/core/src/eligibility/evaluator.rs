//! Rule evaluator — pure logic, no database access.
//!
//! Evaluation is stateless per call and never mutates the tree or the
//! subject, so a single evaluator may be used from many tasks at once
//! (e.g. batch checks across candidates).
//!
//! Both entry points run structural validation first and refuse invalid
//! trees; an invalid tree is never partially evaluated. Rule value shapes
//! are therefore guaranteed below, and a shape mismatch in a comparison
//! helper compares as false, matching the policy that missing or unusable
//! data never satisfies a comparison. Subject values whose runtime type
//! disagrees with the field's declared data type are a hard error.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use super::fields::{DataType, FieldDefinition, FieldRegistry};
use super::rules::{FieldRule, GroupLogic, GroupRule, Operator, PredicateRule, RuleNode, RuleValue};
use super::validate::{parse_date, validate_tree, ValidationIssue};
use crate::types::Timestamp;

/// The fact record a tree is evaluated against, keyed by field id.
pub type Subject = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Predicate delegation
// ---------------------------------------------------------------------------

/// Failure reported by a predicate executor.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct PredicateError(pub String);

/// External delegate for opaque SQL rules.
///
/// The evaluator treats the rule's query as a black box; sandboxing and
/// authorization policy live entirely behind this trait.
pub trait PredicateExecutor {
    fn execute(&self, rule: &PredicateRule, subject: &Subject) -> Result<bool, PredicateError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    /// The tree failed the fail-fast validation pass.
    #[error("rule tree failed validation with {} issue(s)", .0.len())]
    InvalidTree(Vec<ValidationIssue>),

    /// A field rule references an id absent from the registry.
    #[error("unknown field '{field_id}'")]
    FieldNotFound { field_id: String },

    /// A SQL rule was reached but no executor is wired in. Never silently
    /// defaults to true or false.
    #[error("no predicate executor configured; cannot evaluate SQL rule '{name}'")]
    PredicateExecutorUnavailable { name: String },

    /// The executor itself failed; aborts the whole evaluation.
    #[error("predicate '{name}' failed: {source}")]
    Predicate {
        name: String,
        #[source]
        source: PredicateError,
    },

    /// The subject's runtime value disagrees with the field's declared type.
    #[error("subject value for '{field_id}' is not a {expected} value")]
    SubjectTypeMismatch { field_id: String, expected: DataType },
}

// ---------------------------------------------------------------------------
// Trace
// ---------------------------------------------------------------------------

/// Diagnostic mirror of an evaluation: one entry per node actually visited.
///
/// Children skipped by short-circuiting do not appear, which makes the
/// decisive child visible in audit output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalTrace {
    /// `GROUP` | `FIELD_RULE` | `SQL_RULE`, matching the wire discriminant.
    pub node_type: &'static str,
    pub result: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EvalTrace>,
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Walks a rule tree against a subject record.
pub struct Evaluator<'a> {
    registry: &'a FieldRegistry,
    executor: Option<&'a dyn PredicateExecutor>,
}

impl<'a> Evaluator<'a> {
    /// Evaluator without predicate delegation; reaching a SQL rule yields
    /// [`EvalError::PredicateExecutorUnavailable`].
    pub fn new(registry: &'a FieldRegistry) -> Self {
        Self {
            registry,
            executor: None,
        }
    }

    pub fn with_executor(
        registry: &'a FieldRegistry,
        executor: &'a dyn PredicateExecutor,
    ) -> Self {
        Self {
            registry,
            executor: Some(executor),
        }
    }

    /// Evaluate a tree to a single boolean.
    pub fn evaluate(&self, root: &GroupRule, subject: &Subject) -> Result<bool, EvalError> {
        self.check_tree(root)?;
        self.eval_group(root, subject)
    }

    /// Evaluate a tree and record which nodes were visited and how each
    /// resolved.
    pub fn evaluate_traced(
        &self,
        root: &GroupRule,
        subject: &Subject,
    ) -> Result<EvalTrace, EvalError> {
        self.check_tree(root)?;
        self.trace_group(root, subject)
    }

    fn check_tree(&self, root: &GroupRule) -> Result<(), EvalError> {
        let issues = validate_tree(root, self.registry);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(EvalError::InvalidTree(issues))
        }
    }

    // -- plain descent ------------------------------------------------------

    fn eval_group(&self, group: &GroupRule, subject: &Subject) -> Result<bool, EvalError> {
        match group.logic {
            // Empty AND is vacuously true; empty OR vacuously false.
            GroupLogic::And => {
                for child in &group.children {
                    if !self.eval_node(child, subject)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            GroupLogic::Or => {
                for child in &group.children {
                    if self.eval_node(child, subject)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn eval_node(&self, node: &RuleNode, subject: &Subject) -> Result<bool, EvalError> {
        match node {
            RuleNode::Group(group) => self.eval_group(group, subject),
            RuleNode::Field(rule) => self.eval_field_rule(rule, subject),
            RuleNode::Predicate(rule) => self.eval_predicate(rule, subject),
        }
    }

    // -- traced descent -------------------------------------------------------

    fn trace_group(&self, group: &GroupRule, subject: &Subject) -> Result<EvalTrace, EvalError> {
        let mut children = Vec::new();
        let mut result = matches!(group.logic, GroupLogic::And);

        for child in &group.children {
            let trace = self.trace_node(child, subject)?;
            let passed = trace.result;
            children.push(trace);
            match group.logic {
                GroupLogic::And if !passed => {
                    result = false;
                    break;
                }
                GroupLogic::Or if passed => {
                    result = true;
                    break;
                }
                _ => {}
            }
        }

        Ok(EvalTrace {
            node_type: "GROUP",
            result,
            field_id: None,
            operator: None,
            children,
        })
    }

    fn trace_node(&self, node: &RuleNode, subject: &Subject) -> Result<EvalTrace, EvalError> {
        match node {
            RuleNode::Group(group) => self.trace_group(group, subject),
            RuleNode::Field(rule) => {
                let result = self.eval_field_rule(rule, subject)?;
                Ok(EvalTrace {
                    node_type: "FIELD_RULE",
                    result,
                    field_id: Some(rule.field_id.clone()),
                    operator: Some(rule.operator),
                    children: Vec::new(),
                })
            }
            RuleNode::Predicate(rule) => {
                let result = self.eval_predicate(rule, subject)?;
                Ok(EvalTrace {
                    node_type: "SQL_RULE",
                    result,
                    field_id: None,
                    operator: None,
                    children: Vec::new(),
                })
            }
        }
    }

    // -- leaves -----------------------------------------------------------------

    fn eval_predicate(&self, rule: &PredicateRule, subject: &Subject) -> Result<bool, EvalError> {
        match self.executor {
            Some(executor) => {
                executor
                    .execute(rule, subject)
                    .map_err(|source| EvalError::Predicate {
                        name: rule.name.clone(),
                        source,
                    })
            }
            None => Err(EvalError::PredicateExecutorUnavailable {
                name: rule.name.clone(),
            }),
        }
    }

    fn eval_field_rule(&self, rule: &FieldRule, subject: &Subject) -> Result<bool, EvalError> {
        let field =
            self.registry
                .lookup(&rule.field_id)
                .ok_or_else(|| EvalError::FieldNotFound {
                    field_id: rule.field_id.clone(),
                })?;

        // JSON null counts as absent.
        let raw = subject.get(&rule.field_id).filter(|value| !value.is_null());

        let Some(raw) = raw else {
            // Absence policy: presence tests resolve, comparisons never
            // match missing data.
            return Ok(match rule.operator {
                Operator::IsEmpty => true,
                _ => false,
            });
        };

        match rule.operator {
            Operator::IsEmpty => return Ok(is_empty_value(raw)),
            Operator::IsNotEmpty => return Ok(!is_empty_value(raw)),
            _ => {}
        }

        let subject_value = coerce_subject(field, raw).ok_or_else(|| {
            EvalError::SubjectTypeMismatch {
                field_id: rule.field_id.clone(),
                expected: field.data_type,
            }
        })?;

        Ok(apply_operator(rule, &subject_value))
    }
}

// ---------------------------------------------------------------------------
// Typed subject values
// ---------------------------------------------------------------------------

enum SubjectValue {
    Text(String),
    Number(f64),
    Date(Timestamp),
    Bool(bool),
    Items(Vec<String>),
}

/// Coerce the raw subject value to the field's declared data type.
fn coerce_subject(field: &FieldDefinition, raw: &Value) -> Option<SubjectValue> {
    match field.data_type {
        DataType::String => raw.as_str().map(|text| SubjectValue::Text(text.to_string())),
        DataType::Number => raw.as_f64().map(SubjectValue::Number),
        DataType::Boolean => raw.as_bool().map(SubjectValue::Bool),
        DataType::Date => raw.as_str().and_then(parse_date).map(SubjectValue::Date),
        DataType::Array => {
            let items = raw.as_array()?;
            items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect::<Option<Vec<String>>>()
                .map(SubjectValue::Items)
        }
    }
}

/// Presence check for a raw subject value that exists and is non-null.
fn is_empty_value(raw: &Value) -> bool {
    match raw {
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Operator semantics
// ---------------------------------------------------------------------------

fn apply_operator(rule: &FieldRule, subject: &SubjectValue) -> bool {
    match rule.operator {
        Operator::Equals => equals(subject, rule.value.as_ref()),
        Operator::NotEquals => !equals(subject, rule.value.as_ref()),
        Operator::Contains => contains(subject, rule.value.as_ref()),
        Operator::NotContains => !contains(subject, rule.value.as_ref()),
        Operator::StartsWith => {
            affix_match(subject, rule.value.as_ref(), |s, p| s.starts_with(p))
        }
        Operator::EndsWith => affix_match(subject, rule.value.as_ref(), |s, p| s.ends_with(p)),
        Operator::In => is_member(subject, rule.value.as_ref()),
        Operator::NotIn => !is_member(subject, rule.value.as_ref()),
        Operator::GreaterThan => {
            matches!(compare(subject, rule.value.as_ref()), Some(Ordering::Greater))
        }
        Operator::LessThan => {
            matches!(compare(subject, rule.value.as_ref()), Some(Ordering::Less))
        }
        Operator::GreaterOrEqual => matches!(
            compare(subject, rule.value.as_ref()),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Operator::LessOrEqual => matches!(
            compare(subject, rule.value.as_ref()),
            Some(Ordering::Less | Ordering::Equal)
        ),
        // Inclusive on both bounds.
        Operator::Between => {
            let above_lower = matches!(
                compare(subject, rule.value.as_ref()),
                Some(Ordering::Greater | Ordering::Equal)
            );
            let below_upper = matches!(
                compare(subject, rule.second_value.as_ref()),
                Some(Ordering::Less | Ordering::Equal)
            );
            above_lower && below_upper
        }
        // Handled before coercion.
        Operator::IsEmpty | Operator::IsNotEmpty => false,
    }
}

/// Exact equality after coercion; arrays compare as sets.
fn equals(subject: &SubjectValue, value: Option<&RuleValue>) -> bool {
    match (subject, value) {
        (SubjectValue::Text(text), Some(RuleValue::Text(other))) => text == other,
        (SubjectValue::Number(number), Some(RuleValue::Number(other))) => number == other,
        (SubjectValue::Bool(flag), Some(RuleValue::Bool(other))) => flag == other,
        (SubjectValue::Date(instant), Some(RuleValue::Text(other))) => {
            parse_date(other) == Some(*instant)
        }
        (SubjectValue::Items(items), Some(RuleValue::List(list))) => {
            let lhs: HashSet<&str> = items.iter().map(String::as_str).collect();
            let rhs: HashSet<&str> = list.iter().map(String::as_str).collect();
            lhs == rhs
        }
        _ => false,
    }
}

/// Case-insensitive substring for strings; exact membership for arrays.
fn contains(subject: &SubjectValue, value: Option<&RuleValue>) -> bool {
    match (subject, value) {
        (SubjectValue::Text(text), Some(RuleValue::Text(needle))) => {
            text.to_lowercase().contains(&needle.to_lowercase())
        }
        (SubjectValue::Items(items), Some(RuleValue::Text(needle))) => {
            items.iter().any(|item| item == needle)
        }
        _ => false,
    }
}

/// Case-insensitive prefix/suffix comparison.
fn affix_match(
    subject: &SubjectValue,
    value: Option<&RuleValue>,
    check: fn(&str, &str) -> bool,
) -> bool {
    match (subject, value) {
        (SubjectValue::Text(text), Some(RuleValue::Text(affix))) => {
            check(&text.to_lowercase(), &affix.to_lowercase())
        }
        _ => false,
    }
}

/// Membership of the subject value in the configured value set. An array
/// subject is a member when every element belongs to the set.
fn is_member(subject: &SubjectValue, value: Option<&RuleValue>) -> bool {
    let Some(RuleValue::List(list)) = value else {
        return false;
    };
    match subject {
        SubjectValue::Text(text) => list.iter().any(|item| item == text),
        SubjectValue::Number(number) => list
            .iter()
            .any(|item| item.parse::<f64>().is_ok_and(|parsed| parsed == *number)),
        SubjectValue::Date(instant) => list.iter().any(|item| parse_date(item) == Some(*instant)),
        SubjectValue::Bool(flag) => list
            .iter()
            .any(|item| item.parse::<bool>().is_ok_and(|parsed| parsed == *flag)),
        SubjectValue::Items(items) => items
            .iter()
            .all(|element| list.iter().any(|item| item == element)),
    }
}

/// Normalized typed comparison: numbers as IEEE-754 doubles, dates as
/// instants. `None` when the pair is not orderable.
fn compare(subject: &SubjectValue, value: Option<&RuleValue>) -> Option<Ordering> {
    match (subject, value) {
        (SubjectValue::Number(number), Some(RuleValue::Number(other))) => {
            number.partial_cmp(other)
        }
        (SubjectValue::Date(instant), Some(RuleValue::Text(other))) => {
            parse_date(other).map(|bound| instant.cmp(&bound))
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::eligibility::rules::{FieldRule, GroupLogic, GroupRule, PredicateRule, RuleNode};

    fn registry() -> FieldRegistry {
        FieldRegistry::builtin()
    }

    fn subject(pairs: &[(&str, Value)]) -> Subject {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    fn field_rule(field_id: &str, operator: Operator, value: Option<RuleValue>) -> RuleNode {
        RuleNode::Field(FieldRule {
            field_id: field_id.to_string(),
            operator,
            value,
            second_value: None,
        })
    }

    fn group(logic: GroupLogic, children: Vec<RuleNode>) -> GroupRule {
        GroupRule { logic, children }
    }

    fn eval(root: &GroupRule, subject: &Subject) -> bool {
        Evaluator::new(&registry())
            .evaluate(root, subject)
            .expect("evaluation should succeed")
    }

    // -- vacuous truth ------------------------------------------------------

    #[test]
    fn empty_and_group_is_true() {
        assert!(eval(&group(GroupLogic::And, vec![]), &subject(&[])));
    }

    #[test]
    fn empty_or_group_is_false() {
        assert!(!eval(&group(GroupLogic::Or, vec![]), &subject(&[])));
    }

    // -- missing-field policy -------------------------------------------------

    #[test]
    fn missing_field_fails_every_comparison_operator() {
        let cases = [
            (
                Operator::Equals,
                Some(RuleValue::Text("WELDER".to_string())),
            ),
            (
                Operator::NotEquals,
                Some(RuleValue::Text("WELDER".to_string())),
            ),
            (Operator::Contains, Some(RuleValue::Text("W".to_string()))),
            (
                Operator::NotContains,
                Some(RuleValue::Text("W".to_string())),
            ),
            (
                Operator::StartsWith,
                Some(RuleValue::Text("W".to_string())),
            ),
            (Operator::EndsWith, Some(RuleValue::Text("R".to_string()))),
            (
                Operator::In,
                Some(RuleValue::List(vec!["WELDER".to_string()])),
            ),
            (
                Operator::NotIn,
                Some(RuleValue::List(vec!["WELDER".to_string()])),
            ),
        ];
        for (operator, value) in cases {
            let root = group(
                GroupLogic::And,
                vec![field_rule("candidate.trade", operator, value)],
            );
            assert!(
                !eval(&root, &subject(&[])),
                "operator {operator} should not match a missing field"
            );
        }
    }

    #[test]
    fn missing_field_presence_tests() {
        let empty = group(
            GroupLogic::And,
            vec![field_rule("candidate.trade", Operator::IsEmpty, None)],
        );
        assert!(eval(&empty, &subject(&[])));

        let not_empty = group(
            GroupLogic::And,
            vec![field_rule("candidate.trade", Operator::IsNotEmpty, None)],
        );
        assert!(!eval(&not_empty, &subject(&[])));
    }

    #[test]
    fn null_subject_value_counts_as_missing() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.trade",
                Operator::Equals,
                Some(RuleValue::Text("WELDER".to_string())),
            )],
        );
        assert!(!eval(&root, &subject(&[("candidate.trade", Value::Null)])));
    }

    // -- the trade scenario -----------------------------------------------------

    #[test]
    fn trade_membership_scenario() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.trade",
                Operator::In,
                Some(RuleValue::List(vec![
                    "WELDER".to_string(),
                    "PIPEFITTER".to_string(),
                ])),
            )],
        );

        assert!(eval(&root, &subject(&[("candidate.trade", json!("WELDER"))])));
        assert!(!eval(
            &root,
            &subject(&[("candidate.trade", json!("ELECTRICIAN"))])
        ));
        assert!(!eval(&root, &subject(&[])));
    }

    // -- operator semantics ---------------------------------------------------

    #[test]
    fn string_contains_is_case_insensitive() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "project.region",
                Operator::Contains,
                Some(RuleValue::Text("gulf".to_string())),
            )],
        );
        assert!(eval(
            &root,
            &subject(&[("project.region", json!("Gulf Coast"))])
        ));
    }

    #[test]
    fn starts_and_ends_with() {
        let starts = group(
            GroupLogic::And,
            vec![field_rule(
                "assignment.role",
                Operator::StartsWith,
                Some(RuleValue::Text("lead".to_string())),
            )],
        );
        assert!(eval(
            &starts,
            &subject(&[("assignment.role", json!("Lead Welder"))])
        ));

        let ends = group(
            GroupLogic::And,
            vec![field_rule(
                "assignment.role",
                Operator::EndsWith,
                Some(RuleValue::Text("welder".to_string())),
            )],
        );
        assert!(eval(
            &ends,
            &subject(&[("assignment.role", json!("Lead Welder"))])
        ));
    }

    #[test]
    fn between_is_inclusive_at_both_bounds() {
        let root = group(
            GroupLogic::And,
            vec![RuleNode::Field(FieldRule {
                field_id: "candidate.years_experience".to_string(),
                operator: Operator::Between,
                value: Some(RuleValue::Number(3.0)),
                second_value: Some(RuleValue::Number(10.0)),
            })],
        );

        for (years, expected) in [(2.9, false), (3.0, true), (7.0, true), (10.0, true), (10.1, false)]
        {
            assert_eq!(
                eval(
                    &root,
                    &subject(&[("candidate.years_experience", json!(years))])
                ),
                expected,
                "between 3..=10 with value {years}"
            );
        }
    }

    #[test]
    fn date_comparison_uses_instants() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.available_from",
                Operator::LessOrEqual,
                Some(RuleValue::Text("2026-09-01".to_string())),
            )],
        );
        assert!(eval(
            &root,
            &subject(&[("candidate.available_from", json!("2026-08-15"))])
        ));
        assert!(!eval(
            &root,
            &subject(&[("candidate.available_from", json!("2026-09-02T00:00:01Z"))])
        ));
    }

    #[test]
    fn array_membership_requires_every_element_in_the_set() {
        let root = group(
            GroupLogic::And,
            vec![RuleNode::Field(FieldRule {
                field_id: "candidate.certifications".to_string(),
                operator: Operator::In,
                value: Some(RuleValue::List(vec![
                    "OSHA30".to_string(),
                    "TWIC".to_string(),
                    "RIGGING".to_string(),
                ])),
                second_value: None,
            })],
        );
        assert!(eval(
            &root,
            &subject(&[("candidate.certifications", json!(["TWIC", "OSHA30"]))])
        ));
        assert!(!eval(
            &root,
            &subject(&[("candidate.certifications", json!(["TWIC", "CRANE"]))])
        ));
    }

    #[test]
    fn array_equality_is_order_independent() {
        let root = group(
            GroupLogic::And,
            vec![RuleNode::Field(FieldRule {
                field_id: "candidate.certifications".to_string(),
                operator: Operator::Equals,
                value: Some(RuleValue::List(vec![
                    "OSHA30".to_string(),
                    "TWIC".to_string(),
                ])),
                second_value: None,
            })],
        );
        assert!(eval(
            &root,
            &subject(&[("candidate.certifications", json!(["TWIC", "OSHA30"]))])
        ));
        assert!(!eval(
            &root,
            &subject(&[("candidate.certifications", json!(["TWIC"]))])
        ));
    }

    #[test]
    fn array_contains_is_exact_membership() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.certifications",
                Operator::Contains,
                Some(RuleValue::Text("OSHA30".to_string())),
            )],
        );
        assert!(eval(
            &root,
            &subject(&[("candidate.certifications", json!(["TWIC", "OSHA30"]))])
        ));
        assert!(!eval(
            &root,
            &subject(&[("candidate.certifications", json!(["TWIC"]))])
        ));
    }

    #[test]
    fn boolean_equality() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.is_union_member",
                Operator::Equals,
                Some(RuleValue::Bool(true)),
            )],
        );
        assert!(eval(
            &root,
            &subject(&[("candidate.is_union_member", json!(true))])
        ));
        assert!(!eval(
            &root,
            &subject(&[("candidate.is_union_member", json!(false))])
        ));
    }

    // -- group combinators ------------------------------------------------------

    #[test]
    fn and_or_combinators() {
        let welder = field_rule(
            "candidate.trade",
            Operator::Equals,
            Some(RuleValue::Text("WELDER".to_string())),
        );
        let union = field_rule(
            "candidate.is_union_member",
            Operator::Equals,
            Some(RuleValue::Bool(true)),
        );

        let both = group(GroupLogic::And, vec![welder.clone(), union.clone()]);
        let either = group(GroupLogic::Or, vec![welder, union]);

        let non_union_welder = subject(&[
            ("candidate.trade", json!("WELDER")),
            ("candidate.is_union_member", json!(false)),
        ]);
        assert!(!eval(&both, &non_union_welder));
        assert!(eval(&either, &non_union_welder));
    }

    // -- short-circuiting ---------------------------------------------------------

    struct CountingExecutor {
        calls: Cell<usize>,
        result: bool,
    }

    impl PredicateExecutor for CountingExecutor {
        fn execute(&self, _rule: &PredicateRule, _subject: &Subject) -> Result<bool, PredicateError> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.result)
        }
    }

    fn sql_rule(name: &str) -> RuleNode {
        RuleNode::Predicate(PredicateRule {
            name: name.to_string(),
            description: None,
            query: "SELECT true".to_string(),
        })
    }

    #[test]
    fn and_short_circuits_before_predicate() {
        // The failing field rule must prevent the predicate from running at
        // all; with no executor wired, reaching it would be an error.
        let root = group(
            GroupLogic::And,
            vec![
                field_rule(
                    "candidate.trade",
                    Operator::Equals,
                    Some(RuleValue::Text("WELDER".to_string())),
                ),
                sql_rule("background check"),
            ],
        );
        let result = Evaluator::new(&registry())
            .evaluate(&root, &subject(&[("candidate.trade", json!("ELECTRICIAN"))]));
        assert_matches!(result, Ok(false));
    }

    #[test]
    fn or_short_circuits_after_first_true() {
        let executor = CountingExecutor {
            calls: Cell::new(0),
            result: true,
        };
        let root = group(
            GroupLogic::Or,
            vec![sql_rule("first"), sql_rule("second"), sql_rule("third")],
        );
        let reg = registry();
        let evaluator = Evaluator::with_executor(&reg, &executor);
        assert!(evaluator.evaluate(&root, &subject(&[])).unwrap());
        assert_eq!(executor.calls.get(), 1);
    }

    // -- predicate failures ------------------------------------------------------

    #[test]
    fn predicate_without_executor_is_an_error() {
        let root = group(GroupLogic::And, vec![sql_rule("background check")]);
        let result = Evaluator::new(&registry()).evaluate(&root, &subject(&[]));
        assert_matches!(result, Err(EvalError::PredicateExecutorUnavailable { name }) => {
            assert_eq!(name, "background check");
        });
    }

    struct FailingExecutor;

    impl PredicateExecutor for FailingExecutor {
        fn execute(&self, _rule: &PredicateRule, _subject: &Subject) -> Result<bool, PredicateError> {
            Err(PredicateError("connection refused".to_string()))
        }
    }

    #[test]
    fn predicate_failure_aborts_evaluation() {
        let root = group(GroupLogic::Or, vec![sql_rule("reachability")]);
        let reg = registry();
        let evaluator = Evaluator::with_executor(&reg, &FailingExecutor);
        assert_matches!(
            evaluator.evaluate(&root, &subject(&[])),
            Err(EvalError::Predicate { .. })
        );
    }

    // -- fail-fast validation ------------------------------------------------------

    #[test]
    fn invalid_tree_is_rejected_before_evaluation() {
        let root = group(
            GroupLogic::And,
            vec![field_rule("nope.nothing", Operator::IsEmpty, None)],
        );
        assert_matches!(
            Evaluator::new(&registry()).evaluate(&root, &subject(&[])),
            Err(EvalError::InvalidTree(issues)) if issues.len() == 1
        );
    }

    #[test]
    fn subject_type_mismatch_is_an_error() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.years_experience",
                Operator::GreaterThan,
                Some(RuleValue::Number(5.0)),
            )],
        );
        let result = Evaluator::new(&registry()).evaluate(
            &root,
            &subject(&[("candidate.years_experience", json!("plenty"))]),
        );
        assert_matches!(result, Err(EvalError::SubjectTypeMismatch { field_id, .. }) => {
            assert_eq!(field_id, "candidate.years_experience");
        });
    }

    // -- tracing -----------------------------------------------------------------

    #[test]
    fn trace_mirrors_visited_nodes_only() {
        let root = group(
            GroupLogic::Or,
            vec![
                field_rule(
                    "candidate.trade",
                    Operator::Equals,
                    Some(RuleValue::Text("WELDER".to_string())),
                ),
                field_rule(
                    "candidate.is_union_member",
                    Operator::Equals,
                    Some(RuleValue::Bool(true)),
                ),
            ],
        );
        let trace = Evaluator::new(&registry())
            .evaluate_traced(&root, &subject(&[("candidate.trade", json!("WELDER"))]))
            .unwrap();

        assert!(trace.result);
        assert_eq!(trace.node_type, "GROUP");
        // The second child was never evaluated.
        assert_eq!(trace.children.len(), 1);
        assert_eq!(trace.children[0].node_type, "FIELD_RULE");
        assert_eq!(
            trace.children[0].field_id.as_deref(),
            Some("candidate.trade")
        );
        assert_eq!(trace.children[0].operator, Some(Operator::Equals));
    }

    #[test]
    fn trace_serializes_camel_case() {
        let root = group(
            GroupLogic::And,
            vec![field_rule(
                "candidate.trade",
                Operator::IsNotEmpty,
                None,
            )],
        );
        let trace = Evaluator::new(&registry())
            .evaluate_traced(&root, &subject(&[("candidate.trade", json!("WELDER"))]))
            .unwrap();
        let wire = serde_json::to_value(&trace).unwrap();
        assert_eq!(wire["nodeType"], "GROUP");
        assert_eq!(wire["children"][0]["fieldId"], "candidate.trade");
        assert_eq!(wire["children"][0]["operator"], "is_not_empty");
    }
}
