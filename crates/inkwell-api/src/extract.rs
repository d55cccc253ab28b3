use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// `Path` for numeric row ids. A segment that does not parse names no row,
/// so it is a 404 like any other missing row instead of axum's 400.
pub struct IdPath<T>(pub T);

impl<S, T> FromRequestParts<S> for IdPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(IdPath(value)),
            Err(rejection) => {
                debug!("Unparseable id in {}: {}", parts.uri.path(), rejection);
                Err(ApiError::NotFound)
            }
        }
    }
}
