//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::ApiError;

/// JSON document decoded by the body-parsing stage.
#[derive(Debug, Clone)]
pub struct ParsedBody(pub Arc<Value>);

/// Typed view of the already-parsed JSON body.
///
/// Syntax errors were rejected by the body-parsing stage; this only reports
/// shape mismatches (missing fields, wrong types) as 400.
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequestParts<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ParsedBody(value) = parts
            .extensions
            .get::<ParsedBody>()
            .cloned()
            .ok_or_else(|| ApiError::BadRequest("Request body must be JSON".into()))?;

        T::deserialize(value.as_ref())
            .map(JsonBody)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

/// Query string extractor whose failures go through [`ApiError`]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}
