//! Route definitions for the field catalog endpoint.

use axum::routing::get;
use axum::Router;

use crate::handlers::fields;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/eligibility-fields", get(fields::list_fields))
}
