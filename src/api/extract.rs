/// Request body extraction
use crate::error::CmsError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// A `Json<T>` wrapper whose rejections become `CmsError::Validation`,
/// so malformed bodies get the same 400 error shape as every other
/// invalid request.
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = CmsError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| CmsError::Validation(e.body_text()))?;
        Ok(ApiJson(value))
    }
}
