use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crewgate_core::eligibility::evaluator::EvalError;
use crewgate_core::eligibility::validate::ValidationIssue;
use crewgate_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`EvalError`] for domain errors and adds
/// HTTP-specific variants. Implements [`IntoResponse`] to produce
/// consistent JSON error responses; rule validation failures additionally
/// carry an `issues` array with one entry per offending node.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `crewgate_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An evaluation failure from the rule engine.
    #[error(transparent)]
    Evaluation(#[from] EvalError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A criteria document was submitted with a blank name.
    #[error("criteria name must not be empty")]
    EmptyCriteriaName,

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, issues) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                    None,
                ),
                CoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    msg.clone(),
                    None,
                ),
                CoreError::RuleValidation(issues) => rule_validation_response(issues),
                CoreError::Conflict(msg) => {
                    (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None)
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                        None,
                    )
                }
            },

            // --- Evaluation errors ---
            AppError::Evaluation(eval) => match eval {
                EvalError::InvalidTree(issues) => rule_validation_response(issues),
                EvalError::FieldNotFound { field_id } => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    format!("unknown field '{field_id}'"),
                    None,
                ),
                EvalError::PredicateExecutorUnavailable { name } => (
                    StatusCode::NOT_IMPLEMENTED,
                    "PREDICATE_EXECUTOR_UNAVAILABLE",
                    format!("no predicate executor configured; cannot evaluate SQL rule '{name}'"),
                    None,
                ),
                EvalError::Predicate { name, source } => {
                    tracing::error!(predicate = %name, error = %source, "Predicate executor failed");
                    (
                        StatusCode::BAD_GATEWAY,
                        "PREDICATE_FAILED",
                        format!("predicate '{name}' failed"),
                        None,
                    )
                }
                EvalError::SubjectTypeMismatch { field_id, expected } => (
                    StatusCode::BAD_REQUEST,
                    "SUBJECT_TYPE_MISMATCH",
                    format!("subject value for '{field_id}' is not a {expected} value"),
                    None,
                ),
            },

            // --- Database errors ---
            AppError::Database(err) => {
                let (status, code, message) = classify_sqlx_error(err);
                (status, code, message, None)
            }

            // --- HTTP-specific errors ---
            AppError::EmptyCriteriaName => (
                StatusCode::BAD_REQUEST,
                "EMPTY_CRITERIA_NAME",
                self.to_string(),
                None,
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone(), None)
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let Some(issues) = issues {
            body["issues"] = issues;
        }

        (status, axum::Json(body)).into_response()
    }
}

/// 400 with the full issue list so clients can pinpoint every offending
/// node in one round trip.
fn rule_validation_response(
    issues: &[ValidationIssue],
) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    (
        StatusCode::BAD_REQUEST,
        "RULE_VALIDATION_ERROR",
        format!("rule tree failed validation with {} issue(s)", issues.len()),
        Some(serde_json::to_value(issues).unwrap_or_default()),
    )
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
