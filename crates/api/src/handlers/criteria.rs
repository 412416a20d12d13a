//! Handlers for eligibility criteria endpoints.
//!
//! Trees are validated against the field registry before any write: a
//! tree that fails validation is never persisted and never partially
//! evaluated. Evaluation endpoints run without a predicate executor
//! wired in, so criteria containing SQL rules report
//! `PREDICATE_EXECUTOR_UNAVAILABLE` rather than guessing a result.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crewgate_core::eligibility::evaluator::{EvalTrace, Evaluator, Subject};
use crewgate_core::eligibility::rules::GroupRule;
use crewgate_core::eligibility::validate::validate_tree;
use crewgate_core::error::CoreError;
use crewgate_core::types::DbId;
use crewgate_db::models::criteria::{CreateCriteria, UpdateCriteria};
use crewgate_db::repositories::{CriteriaRepo, UpdateOutcome};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "eligibility_criteria",
        id,
    })
}

fn check_tree(state: &AppState, root: &GroupRule) -> Result<(), AppError> {
    let issues = validate_tree(root, &state.registry);
    if issues.is_empty() {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::RuleValidation(issues)))
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/eligibility-criteria
///
/// Returns summaries of all criteria documents, ordered by name.
pub async fn list_criteria(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let summaries = CriteriaRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: summaries }))
}

/// GET /api/v1/eligibility-criteria/{id}
///
/// Returns the full document including the root group tree.
pub async fn get_criteria(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let criteria = CriteriaRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse { data: criteria }))
}

/// POST /api/v1/eligibility-criteria
///
/// Creates a criteria document. The name must be non-blank and the tree
/// must pass registry validation.
pub async fn create_criteria(
    State(state): State<AppState>,
    Json(body): Json<CreateCriteria>,
) -> AppResult<impl IntoResponse> {
    if body.name.trim().is_empty() {
        return Err(AppError::EmptyCriteriaName);
    }
    check_tree(&state, &body.root_group)?;

    let created = CriteriaRepo::create(&state.pool, &body).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT /api/v1/eligibility-criteria/{id}
///
/// Patches name, description, active flag, and/or root group
/// independently. A replacement tree is validated like a new one.
pub async fn update_criteria(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<UpdateCriteria>,
) -> AppResult<impl IntoResponse> {
    if let Some(name) = &body.name {
        if name.trim().is_empty() {
            return Err(AppError::EmptyCriteriaName);
        }
    }
    if let Some(root_group) = &body.root_group {
        check_tree(&state, root_group)?;
    }

    match CriteriaRepo::update(&state.pool, id, &body).await? {
        UpdateOutcome::Updated(criteria) => Ok(Json(DataResponse { data: criteria })),
        UpdateOutcome::NotFound => Err(not_found(id)),
        UpdateOutcome::Conflict => Err(AppError::Core(CoreError::Conflict(
            "criteria was modified by another writer".to_string(),
        ))),
    }
}

/// DELETE /api/v1/eligibility-criteria/{id}
pub async fn delete_criteria(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if CriteriaRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Request body for ad-hoc evaluation of an unsaved tree.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub root_group: GroupRule,
    #[serde(default)]
    pub subject: Subject,
}

/// Request body for evaluating a stored criteria document.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    #[serde(default)]
    pub subject: Subject,
}

/// Evaluation result plus the visited-node trace for audit display.
#[derive(Debug, Serialize)]
pub struct EvaluationResponse {
    pub eligible: bool,
    pub trace: EvalTrace,
}

/// POST /api/v1/eligibility-criteria/preview
///
/// Evaluates a tree straight from the request body against the supplied
/// subject. Nothing is persisted; used by the rules builder to test a
/// draft before saving.
pub async fn preview_criteria(
    State(state): State<AppState>,
    Json(body): Json<PreviewRequest>,
) -> AppResult<impl IntoResponse> {
    let trace = Evaluator::new(&state.registry).evaluate_traced(&body.root_group, &body.subject)?;
    Ok(Json(DataResponse {
        data: EvaluationResponse {
            eligible: trace.result,
            trace,
        },
    }))
}

/// POST /api/v1/eligibility-criteria/{id}/evaluate
///
/// Evaluates a stored criteria document against the supplied subject.
pub async fn evaluate_criteria(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<EvaluateRequest>,
) -> AppResult<impl IntoResponse> {
    let criteria = CriteriaRepo::get(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;

    let root_group = criteria.decode_root_group().map_err(|err| {
        AppError::InternalError(format!(
            "stored rule tree for criteria {id} failed to decode: {err}"
        ))
    })?;

    let trace = Evaluator::new(&state.registry).evaluate_traced(&root_group, &body.subject)?;
    Ok(Json(DataResponse {
        data: EvaluationResponse {
            eligible: trace.result,
            trace,
        },
    }))
}
