use axum::{routing::get, Router};

use crate::api::handlers::index;
use crate::api::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/index/constituents",
            get(index::list_constituents).put(index::replace_constituents),
        )
        .route("/index/constituents/{ticker}", get(index::get_constituent))
}
