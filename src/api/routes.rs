use axum::Router;

use crate::api::state::AppState;

pub mod index;
pub mod portfolio;
pub mod system;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(portfolio::routes())
        .merge(index::routes())
        .merge(system::routes())
}
