use axum::{routing::post, Router};

use crate::{handlers::*, AppState};

pub fn create_api_routes() -> Router<AppState> {
    Router::new().route("/contact", post(submit_contact))
}
