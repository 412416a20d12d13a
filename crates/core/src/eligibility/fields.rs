//! Field catalog for eligibility rules.
//!
//! The catalog is configuration: built once at process start and read-only
//! thereafter. Changing the field set is a deployment-time concern, so
//! there is no mutation API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::rules::Operator;

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Where a field's value is sourced from when assembling a subject record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    Project,
    Candidate,
    Assignment,
    CustomQuery,
}

/// Primitive type of a field's subject value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Number,
    Date,
    Boolean,
    Array,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selectable option for choice-constrained fields.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// An evaluable subject attribute. Immutable once registered.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub id: &'static str,
    pub label: &'static str,
    pub category: FieldCategory,
    pub data_type: DataType,
    /// Operators valid for this field; a rule using any other operator
    /// fails validation.
    pub operators: &'static [Operator],
    /// Enumerated choices, empty when the field is unconstrained.
    pub options: &'static [FieldOption],
}

impl FieldDefinition {
    pub fn allows_operator(&self, operator: Operator) -> bool {
        self.operators.contains(&operator)
    }
}

// ---------------------------------------------------------------------------
// Default operator sets per data type
// ---------------------------------------------------------------------------

pub const STRING_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::Contains,
    Operator::NotContains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::In,
    Operator::NotIn,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

/// For numbers and dates, which share ordered-comparison semantics.
pub const ORDERED_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::GreaterThan,
    Operator::LessThan,
    Operator::GreaterOrEqual,
    Operator::LessOrEqual,
    Operator::Between,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

pub const BOOLEAN_OPERATORS: &[Operator] = &[Operator::Equals, Operator::NotEquals];

pub const ARRAY_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::NotEquals,
    Operator::Contains,
    Operator::NotContains,
    Operator::In,
    Operator::NotIn,
    Operator::IsEmpty,
    Operator::IsNotEmpty,
];

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

const TRADE_OPTIONS: &[FieldOption] = &[
    FieldOption { value: "WELDER", label: "Welder" },
    FieldOption { value: "PIPEFITTER", label: "Pipefitter" },
    FieldOption { value: "ELECTRICIAN", label: "Electrician" },
    FieldOption { value: "MILLWRIGHT", label: "Millwright" },
    FieldOption { value: "BOILERMAKER", label: "Boilermaker" },
];

const ASSIGNMENT_STATUS_OPTIONS: &[FieldOption] = &[
    FieldOption { value: "PENDING", label: "Pending" },
    FieldOption { value: "ACTIVE", label: "Active" },
    FieldOption { value: "COMPLETED", label: "Completed" },
    FieldOption { value: "TERMINATED", label: "Terminated" },
];

const BUILTIN_FIELDS: &[FieldDefinition] = &[
    // -- Candidate-sourced --
    FieldDefinition {
        id: "candidate.trade",
        label: "Trade",
        category: FieldCategory::Candidate,
        data_type: DataType::String,
        operators: STRING_OPERATORS,
        options: TRADE_OPTIONS,
    },
    FieldDefinition {
        id: "candidate.certifications",
        label: "Certifications",
        category: FieldCategory::Candidate,
        data_type: DataType::Array,
        operators: ARRAY_OPERATORS,
        options: &[],
    },
    FieldDefinition {
        id: "candidate.years_experience",
        label: "Years of experience",
        category: FieldCategory::Candidate,
        data_type: DataType::Number,
        operators: ORDERED_OPERATORS,
        options: &[],
    },
    FieldDefinition {
        id: "candidate.available_from",
        label: "Available from",
        category: FieldCategory::Candidate,
        data_type: DataType::Date,
        operators: ORDERED_OPERATORS,
        options: &[],
    },
    FieldDefinition {
        id: "candidate.is_union_member",
        label: "Union member",
        category: FieldCategory::Candidate,
        data_type: DataType::Boolean,
        operators: BOOLEAN_OPERATORS,
        options: &[],
    },
    // -- Project-sourced --
    FieldDefinition {
        id: "project.region",
        label: "Project region",
        category: FieldCategory::Project,
        data_type: DataType::String,
        operators: STRING_OPERATORS,
        options: &[],
    },
    FieldDefinition {
        id: "project.start_date",
        label: "Project start date",
        category: FieldCategory::Project,
        data_type: DataType::Date,
        operators: ORDERED_OPERATORS,
        options: &[],
    },
    FieldDefinition {
        id: "project.is_per_diem_eligible",
        label: "Per diem eligible",
        category: FieldCategory::Project,
        data_type: DataType::Boolean,
        operators: BOOLEAN_OPERATORS,
        options: &[],
    },
    // -- Assignment-sourced --
    FieldDefinition {
        id: "assignment.role",
        label: "Assignment role",
        category: FieldCategory::Assignment,
        data_type: DataType::String,
        operators: STRING_OPERATORS,
        options: &[],
    },
    FieldDefinition {
        id: "assignment.status",
        label: "Assignment status",
        category: FieldCategory::Assignment,
        data_type: DataType::String,
        operators: STRING_OPERATORS,
        options: ASSIGNMENT_STATUS_OPTIONS,
    },
    FieldDefinition {
        id: "assignment.hourly_rate",
        label: "Hourly rate",
        category: FieldCategory::Assignment,
        data_type: DataType::Number,
        operators: ORDERED_OPERATORS,
        options: &[],
    },
    // -- Custom-query sourced --
    FieldDefinition {
        id: "custom.background_check_passed",
        label: "Background check passed",
        category: FieldCategory::CustomQuery,
        data_type: DataType::Boolean,
        operators: BOOLEAN_OPERATORS,
        options: &[],
    },
];

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Read-only catalog of evaluable fields, indexed by id.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    by_id: HashMap<&'static str, usize>,
}

impl FieldRegistry {
    /// Build a registry from a list of definitions, preserving order.
    pub fn new(fields: Vec<FieldDefinition>) -> Self {
        let by_id = fields
            .iter()
            .enumerate()
            .map(|(index, field)| (field.id, index))
            .collect();
        Self { fields, by_id }
    }

    /// The built-in catalog, loaded once at process start.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_FIELDS.to_vec())
    }

    pub fn lookup(&self, field_id: &str) -> Option<&FieldDefinition> {
        self.by_id.get(field_id).map(|&index| &self.fields[index])
    }

    /// Fields in a category, in registration order.
    pub fn list_by_category(&self, category: FieldCategory) -> Vec<&FieldDefinition> {
        self.fields
            .iter()
            .filter(|field| field.category == category)
            .collect()
    }

    /// All fields in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_field() {
        let registry = FieldRegistry::builtin();
        let field = registry.lookup("candidate.trade").unwrap();
        assert_eq!(field.data_type, DataType::String);
        assert_eq!(field.category, FieldCategory::Candidate);
        assert!(!field.options.is_empty());
    }

    #[test]
    fn lookup_unknown_field() {
        let registry = FieldRegistry::builtin();
        assert!(registry.lookup("candidate.shoe_size").is_none());
    }

    #[test]
    fn list_by_category_preserves_order() {
        let registry = FieldRegistry::builtin();
        let candidate_fields = registry.list_by_category(FieldCategory::Candidate);
        let ids: Vec<&str> = candidate_fields.iter().map(|f| f.id).collect();
        assert_eq!(
            ids,
            vec![
                "candidate.trade",
                "candidate.certifications",
                "candidate.years_experience",
                "candidate.available_from",
                "candidate.is_union_member",
            ]
        );
    }

    #[test]
    fn operator_sets_match_data_types() {
        let registry = FieldRegistry::builtin();

        let trade = registry.lookup("candidate.trade").unwrap();
        assert!(trade.allows_operator(Operator::Contains));
        assert!(!trade.allows_operator(Operator::Between));

        let experience = registry.lookup("candidate.years_experience").unwrap();
        assert!(experience.allows_operator(Operator::Between));
        assert!(!experience.allows_operator(Operator::StartsWith));

        let union = registry.lookup("candidate.is_union_member").unwrap();
        assert!(union.allows_operator(Operator::Equals));
        assert!(!union.allows_operator(Operator::IsEmpty));
    }

    #[test]
    fn builtin_ids_are_unique() {
        let registry = FieldRegistry::builtin();
        assert_eq!(registry.len(), BUILTIN_FIELDS.len());
    }
}
