/*
 * Responsibility
 * - URL layout of v1
 * - /health is public, everything else goes through the constructor middleware
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, whoami::whoami};
use crate::middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/whoami", get(whoami));
    let protected = middleware::auth::constructor::apply(protected, state);

    Router::new().route("/health", get(health)).merge(protected)
}
