use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod doc;
pub mod form;
pub mod health;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .merge(products::router())
}
