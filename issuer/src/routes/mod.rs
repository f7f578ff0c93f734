mod docs;
pub mod generate_sas;
pub mod health;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};

/// Creates the router with all API routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route("/generate-sas", post(generate_sas::generate_sas))
}
