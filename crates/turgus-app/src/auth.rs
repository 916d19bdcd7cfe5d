use crate::error::ApiError;

/// Identity of the authenticated user for the current request.
///
/// The authentication layer in front of this router validates credentials and
/// inserts `CurrentUser` into request extensions; handlers that mutate data
/// extract it and get a 401 when it is missing.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub i64);

impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(ApiError::Unauthorized)
    }
}
