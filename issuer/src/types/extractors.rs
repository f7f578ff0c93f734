//! Custom extractors for request parsing

use aide::operation::OperationInput;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    Json,
};
use common_types::INVALID_JSON_BODY;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use crate::types::error::AppError;

/// JSON extractor whose rejections use the API's error envelope
///
/// A body that is empty or only whitespace reads as `{}`, with or without a
/// `Content-Type`, so absent fields surface through normal validation. Any other
/// body must be declared as JSON and parse as `T`.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let declared_json = has_json_content_type(req.headers());

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|err| invalid_body().with_cause(err))?;

        let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
            &b"{}"[..]
        } else if declared_json {
            &bytes[..]
        } else {
            return Err(invalid_body().with_cause("body is not declared as application/json"));
        };

        let Json(payload) =
            Json::<T>::from_bytes(body).map_err(|err| invalid_body().with_cause(err))?;

        Ok(Self(payload))
    }
}

const fn invalid_body() -> AppError {
    AppError::new(StatusCode::BAD_REQUEST, INVALID_JSON_BODY)
}

/// `application/json` or any `application/*+json`
fn has_json_content_type(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|mime| {
            mime.type_() == "application"
                && (mime.subtype() == "json" || mime.suffix().is_some_and(|name| name == "json"))
        })
}

impl<T> OperationInput for JsonBody<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        // Same wire shape as Json<T>
        Json::<T>::operation_input(ctx, operation);
    }
}
