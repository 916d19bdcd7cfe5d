use axum::{Json, extract::Path, response::IntoResponse, routing::post};
use http::StatusCode;
use serde::Serialize;
use turgus_dal::bookmark::{Bookmark, BookmarkRepository};
use turgus_dal::product::ProductRepository;

use crate::{auth::CurrentUser, error::ApiResult, repository_from_request, state::AppState};

repository_from_request!(BookmarkRepository);

#[derive(Debug, Serialize)]
struct BookmarkResponse {
    status: &'static str,
    message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Bookmark>,
}

/// Bookmarking is idempotent: a repeated add reports the existing bookmark.
async fn add_bookmark(
    Path(product_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    product_repo: ProductRepository,
    bookmark_repo: BookmarkRepository,
) -> ApiResult<impl IntoResponse> {
    // 404 when the product does not exist
    product_repo.get(product_id).await?;

    if let Some(existing) = bookmark_repo.find(user_id, product_id).await? {
        return Ok((
            StatusCode::OK,
            Json(BookmarkResponse {
                status: "success",
                message: "Product already bookmarked",
                data: Some(existing),
            }),
        ));
    }

    // a concurrent add may win the race between find and create; the unique
    // constraint then reports the existing bookmark instead of failing
    let bookmark = match bookmark_repo.create(user_id, product_id).await {
        Ok(bookmark) => bookmark,
        Err(e) if e.is_unique_violation() => {
            let existing = bookmark_repo
                .find(user_id, product_id)
                .await?
                .ok_or_else(|| turgus_dal::Error::RecordNotFound("Bookmark".to_string()))?;
            return Ok((
                StatusCode::OK,
                Json(BookmarkResponse {
                    status: "success",
                    message: "Product already bookmarked",
                    data: Some(existing),
                }),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    Ok((
        StatusCode::CREATED,
        Json(BookmarkResponse {
            status: "success",
            message: "Product bookmarked successfully",
            data: Some(bookmark),
        }),
    ))
}

async fn remove_bookmark(
    Path(product_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    bookmark_repo: BookmarkRepository,
) -> ApiResult<impl IntoResponse> {
    bookmark_repo.delete(user_id, product_id).await?;

    Ok((
        StatusCode::OK,
        Json(BookmarkResponse {
            status: "success",
            message: "Bookmark removed successfully",
            data: None,
        }),
    ))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BookmarkStatus {
    status: &'static str,
    is_bookmarked: bool,
}

async fn bookmark_status(
    Path(product_id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    bookmark_repo: BookmarkRepository,
) -> ApiResult<impl IntoResponse> {
    let bookmark = bookmark_repo.find(user_id, product_id).await?;

    Ok((
        StatusCode::OK,
        Json(BookmarkStatus {
            status: "success",
            is_bookmarked: bookmark.is_some(),
        }),
    ))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new().route(
        "/{product_id}",
        post(add_bookmark)
            .delete(remove_bookmark)
            .get(bookmark_status),
    )
}
