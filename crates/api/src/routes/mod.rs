pub mod criteria;
pub mod fields;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /eligibility-criteria                   list, create (GET, POST)
/// /eligibility-criteria/preview           ad-hoc evaluation of a draft tree (POST)
/// /eligibility-criteria/{id}              get, update, delete (GET, PUT, DELETE)
/// /eligibility-criteria/{id}/evaluate     evaluate stored criteria (POST)
///
/// /eligibility-fields                     field catalog, ?category= filter (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(criteria::router())
        .merge(fields::router())
}
