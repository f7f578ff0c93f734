use std::path::Path;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use issuer::{blob_storage::BlobStore, server, types::Environment};
use tower::ServiceExt;

use super::FakeBlobStore;

/// Setup test logging
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Router wired to an in-memory store
pub struct TestSetup {
    pub router: Router,
    pub store: Arc<FakeBlobStore>,
}

impl TestSetup {
    pub fn new() -> Self {
        Self::with_store(FakeBlobStore::new())
    }

    pub fn with_store(store: FakeBlobStore) -> Self {
        Self::build(store, Environment::Development, Path::new("public"))
    }

    pub fn build(store: FakeBlobStore, environment: Environment, static_dir: &Path) -> Self {
        setup_test_env();

        let store = Arc::new(store);
        let shared: Arc<dyn BlobStore> = store.clone();
        let router = server::router(environment, shared, static_dir);

        Self { router, store }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(route, Some("application/json"), payload.to_string())
            .await
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        content_type: Option<&str>,
        body: String,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut request = Request::builder().uri(route).method("POST");
        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }

        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::from(body))?)
            .await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read response body as text
pub async fn response_text(response: Response) -> String {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}
