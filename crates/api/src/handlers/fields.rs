//! Handlers for the field catalog endpoint.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crewgate_core::eligibility::fields::{FieldCategory, FieldDefinition};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FieldListQuery {
    pub category: Option<FieldCategory>,
}

/// GET /api/v1/eligibility-fields
///
/// Returns the field catalog the rules builder offers, optionally
/// filtered by source category.
pub async fn list_fields(
    State(state): State<AppState>,
    Query(query): Query<FieldListQuery>,
) -> AppResult<impl IntoResponse> {
    let fields: Vec<FieldDefinition> = match query.category {
        Some(category) => state
            .registry
            .list_by_category(category)
            .into_iter()
            .cloned()
            .collect(),
        None => state.registry.iter().cloned().collect(),
    };
    Ok(Json(DataResponse { data: fields }))
}
