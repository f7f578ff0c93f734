//! Generated API reference, hidden in production

use aide::{axum::ApiRouter, openapi::OpenApi, scalar::Scalar};
use axum::{http::StatusCode, routing::get, Extension, Json};

use crate::types::Environment;

const OPENAPI_PATH: &str = "/openapi.json";

pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .route(
            "/docs",
            Scalar::new(OPENAPI_PATH)
                .with_title("Upload Grant Issuer API")
                .axum_route(),
        )
        .route(OPENAPI_PATH, get(openapi_document))
}

/// The document the docs page renders; 404 where `APP_ENV` hides it
#[allow(clippy::unused_async)]
async fn openapi_document(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<OpenApi>,
) -> Result<Json<OpenApi>, StatusCode> {
    environment
        .show_api_docs()
        .then(|| Json(openapi))
        .ok_or(StatusCode::NOT_FOUND)
}
