use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::api::handlers::portfolio;
use crate::api::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/portfolios",
            get(portfolio::list_portfolios).post(portfolio::create_portfolio),
        )
        .route(
            "/portfolios/{id}",
            get(portfolio::get_portfolio)
                .put(portfolio::update_portfolio)
                .delete(portfolio::delete_portfolio),
        )
        .route("/portfolios/{id}/holdings", post(portfolio::add_stock))
        .route(
            "/portfolios/{id}/holdings/{holding_id}",
            delete(portfolio::remove_holding),
        )
        .route("/portfolios/{id}/value", get(portfolio::portfolio_value))
}
