//! Route definitions for eligibility criteria endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::criteria;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/eligibility-criteria",
            get(criteria::list_criteria).post(criteria::create_criteria),
        )
        .route(
            "/eligibility-criteria/preview",
            post(criteria::preview_criteria),
        )
        .route(
            "/eligibility-criteria/{id}",
            get(criteria::get_criteria)
                .put(criteria::update_criteria)
                .delete(criteria::delete_criteria),
        )
        .route(
            "/eligibility-criteria/{id}/evaluate",
            post(criteria::evaluate_criteria),
        )
}
