use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::{DeploymentImpl, routes};

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .merge(routes::ranks::router(&deployment))
        .merge(routes::members::router(&deployment))
        .merge(routes::jobs::router(&deployment));

    Router::new()
        .route("/health", get(routes::health::health_check))
        .nest("/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
