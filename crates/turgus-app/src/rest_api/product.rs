use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_valid::Garde;
use futures::try_join;
use http::StatusCode;
use serde::Serialize;
use time::OffsetDateTime;
use turgus_dal::{
    product::{CreateProduct, Product, ProductRepository, UpdateProduct},
    rating::{Rating, RatingRepository},
    user::UserRepository,
};

use crate::{
    error::ApiResult,
    listing::{
        EnrichedProduct, PageParams, Pagination, RangeFilter, SortField, SortOrder, aggregate,
        enrich_one, filter_by_range, paginate, pick_hot, seller_rating_summary, sort_products,
    },
    repository_from_request,
    rest_api::{DataPage, ListingQuery, ProductPage, StatusData},
    state::AppState,
};
use crate::auth::CurrentUser;

repository_from_request!(ProductRepository);
repository_from_request!(RatingRepository);
repository_from_request!(UserRepository);

const HOT_MIN_AVG: f64 = 4.5;
const HOT_COUNT: usize = 4;

fn product_ids(products: &[Product]) -> Vec<i64> {
    products.iter().map(|p| p.id).collect()
}

/// Global listing: enrich, range-filter on price and date, sort, paginate.
/// Defaults to newest first.
async fn list_products(
    State(state): State<AppState>,
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
    Garde(Query(query)): Garde<Query<ListingQuery>>,
) -> ApiResult<impl IntoResponse> {
    let products = product_repo.list_all().await?;
    let ratings = rating_repo.list_for_products(&product_ids(&products)).await?;

    let mut enriched = aggregate(products, &ratings);
    enriched = filter_by_range(
        enriched,
        &RangeFilter::Price {
            min: query.min_price,
            max: query.max_price,
        },
    );
    enriched = filter_by_range(
        enriched,
        &RangeFilter::Created {
            min: query.min_date,
            max: query.max_date,
        },
    );

    let field = SortField::resolve(query.sort.as_deref());
    let order = SortOrder::resolve(query.order.as_deref().or(Some("DESC")));
    let sorted = sort_products(enriched, field, order);

    let params = PageParams::new(query.page, query.limit, state.config().default_page_size);
    let page = paginate(sorted, params);

    Ok((StatusCode::OK, Json(ProductPage::from(page))))
}

/// Name-substring search, scoped in the store before enrichment, then the
/// same sort and paginate steps.
async fn search_products(
    State(state): State<AppState>,
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
    Garde(Query(query)): Garde<Query<ListingQuery>>,
) -> ApiResult<impl IntoResponse> {
    let needle = query.q.as_deref().unwrap_or("");
    let products = product_repo.search(needle).await?;
    let ratings = rating_repo.list_for_products(&product_ids(&products)).await?;

    let enriched = aggregate(products, &ratings);
    let field = SortField::resolve(query.sort.as_deref());
    let order = SortOrder::resolve(query.order.as_deref());
    let sorted = sort_products(enriched, field, order);

    let params = PageParams::new(query.page, query.limit, state.config().default_page_size);
    let page = paginate(sorted, params);

    Ok((StatusCode::OK, Json(DataPage::from(page))))
}

/// Seller-scoped listing. An unknown seller id simply yields an empty page.
async fn seller_products(
    Path(user_id): Path<i64>,
    State(state): State<AppState>,
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
    Garde(Query(query)): Garde<Query<ListingQuery>>,
) -> ApiResult<impl IntoResponse> {
    let products = product_repo.list_by_seller(user_id).await?;
    let ratings = rating_repo.list_for_products(&product_ids(&products)).await?;

    let enriched = aggregate(products, &ratings);
    let field = SortField::resolve(query.sort.as_deref());
    let order = SortOrder::resolve(query.order.as_deref());
    let sorted = sort_products(enriched, field, order);

    let params = PageParams::new(query.page, query.limit, state.config().default_page_size);
    let page = paginate(sorted, params);

    Ok((StatusCode::OK, Json(DataPage::from(page))))
}

#[derive(Debug, Serialize)]
struct RatingComment {
    username: String,
    comment: String,
    stars: i64,
    timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct SellerProduct {
    #[serde(flatten)]
    product: EnrichedProduct,
    comments: Vec<RatingComment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SellerPage {
    avg_user_rating: f64,
    total_ratings: u32,
    data: Vec<SellerProduct>,
    pagination: Pagination,
}

fn comments_by_product(
    ratings: &[Rating],
    usernames: &HashMap<i64, String>,
) -> HashMap<i64, Vec<RatingComment>> {
    let mut comments: HashMap<i64, Vec<RatingComment>> = HashMap::new();
    for rating in ratings {
        if !rating.is_review() {
            continue;
        }
        comments
            .entry(rating.product_id)
            .or_default()
            .push(RatingComment {
                username: usernames
                    .get(&rating.user_id)
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                comment: rating.comment.clone().unwrap_or_default(),
                stars: rating.stars,
                timestamp: rating.created,
            });
    }
    comments
}

/// Seller profile listing: products with their review comments plus the
/// seller-wide rating aggregate. 404 only when the username does not exist.
async fn seller_products_by_username(
    Path(username): Path<String>,
    State(state): State<AppState>,
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
    user_repo: UserRepository,
    Garde(Query(query)): Garde<Query<ListingQuery>>,
) -> ApiResult<impl IntoResponse> {
    let seller = user_repo.find_by_username(&username).await?;
    let products = product_repo.list_by_seller(seller.id).await?;
    let ratings = rating_repo.list_for_products(&product_ids(&products)).await?;

    let mut rater_ids: Vec<i64> = ratings.iter().map(|r| r.user_id).collect();
    rater_ids.sort_unstable();
    rater_ids.dedup();
    let raters = user_repo.list_by_ids(&rater_ids).await?;
    let usernames: HashMap<i64, String> =
        raters.into_iter().map(|u| (u.id, u.username)).collect();

    let mut comments = comments_by_product(&ratings, &usernames);

    let enriched = aggregate(products, &ratings);
    let (avg_user_rating, total_ratings) = seller_rating_summary(&enriched);
    let items: Vec<SellerProduct> = enriched
        .into_iter()
        .map(|product| {
            let comments = comments.remove(&product.product.id).unwrap_or_default();
            SellerProduct { product, comments }
        })
        .collect();

    let params = PageParams::new(query.page, query.limit, state.config().default_page_size);
    let page = paginate(items, params);

    Ok((
        StatusCode::OK,
        Json(SellerPage {
            avg_user_rating,
            total_ratings,
            data: page.items,
            pagination: page.pagination,
        }),
    ))
}

#[derive(Debug, Serialize)]
struct RatedProduct {
    #[serde(flatten)]
    product: Product,
    #[serde(rename = "userRating")]
    user_rating: i64,
    #[serde(rename = "userComment")]
    user_comment: Option<String>,
}

/// Products a given user has rated, each carrying that user's own score and
/// comment. 404 only when the username does not exist; a user with no
/// ratings gets an empty list.
async fn rated_products_by_username(
    Path(username): Path<String>,
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
    user_repo: UserRepository,
) -> ApiResult<impl IntoResponse> {
    let rater = user_repo.find_by_username(&username).await?;
    let ratings = rating_repo.list_by_rater(rater.id).await?;

    let mut ids: Vec<i64> = ratings.iter().map(|r| r.product_id).collect();
    ids.sort_unstable();
    ids.dedup();
    let by_id: HashMap<i64, Product> = product_repo
        .list_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    // a rating whose product was deleted since is simply skipped
    let items: Vec<RatedProduct> = ratings
        .into_iter()
        .filter_map(|rating| {
            by_id.get(&rating.product_id).cloned().map(|product| RatedProduct {
                product,
                user_rating: rating.stars,
                user_comment: rating.comment,
            })
        })
        .collect();

    Ok((StatusCode::OK, Json(StatusData::success(items))))
}

#[derive(Debug, Serialize)]
struct SellerInfo {
    username: String,
    contacts: Option<String>,
}

#[derive(Debug, Serialize)]
struct ProductDetail {
    #[serde(flatten)]
    product: EnrichedProduct,
    user: SellerInfo,
}

async fn product_detail(
    Path(id): Path<i64>,
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
    user_repo: UserRepository,
) -> ApiResult<impl IntoResponse> {
    // both loads are keyed by the product id, issue them concurrently
    let (product, ratings) = try_join!(product_repo.get(id), rating_repo.list_for_product(id))?;
    let seller = user_repo.get(product.user_id).await?;

    let detail = ProductDetail {
        product: enrich_one(product, &ratings),
        user: SellerInfo {
            username: seller.username,
            contacts: seller.contacts,
        },
    };
    Ok((StatusCode::OK, Json(detail)))
}

/// Top rated products: average of at least 4.5, ordered by rating count.
async fn hot_products(
    product_repo: ProductRepository,
    rating_repo: RatingRepository,
) -> ApiResult<impl IntoResponse> {
    let products = product_repo.list_all().await?;
    let ratings = rating_repo.list_for_products(&product_ids(&products)).await?;

    let hot = pick_hot(aggregate(products, &ratings), HOT_MIN_AVG, HOT_COUNT);
    Ok((StatusCode::OK, Json(StatusData::success(hot))))
}

async fn product_count(product_repo: ProductRepository) -> ApiResult<impl IntoResponse> {
    let count = product_repo.count().await?;
    Ok((StatusCode::OK, Json(StatusData::success(count))))
}

async fn create_product(
    CurrentUser(user_id): CurrentUser,
    repository: ProductRepository,
    Garde(Json(payload)): Garde<Json<CreateProduct>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.create(user_id, payload).await?;

    Ok((StatusCode::CREATED, Json(StatusData::success(record))))
}

async fn edit_product(
    Path(id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    repository: ProductRepository,
    Garde(Json(payload)): Garde<Json<UpdateProduct>>,
) -> ApiResult<impl IntoResponse> {
    let record = repository.update(id, user_id, payload).await?;

    Ok((StatusCode::OK, Json(StatusData::success(record))))
}

async fn delete_product(
    Path(id): Path<i64>,
    CurrentUser(user_id): CurrentUser,
    repository: ProductRepository,
) -> ApiResult<impl IntoResponse> {
    repository.delete(id, user_id).await?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/", get(list_products))
        .route("/search", get(search_products))
        .route("/hot", get(hot_products))
        .route("/count", get(product_count))
        .route("/selected/{id}", get(product_detail))
        .route("/u/{username}", get(seller_products_by_username))
        .route("/rated/{username}", get(rated_products_by_username))
        .route("/user/{id}", get(seller_products))
        .route("/user", post(create_product))
        .route("/user/p/{id}", patch(edit_product).delete(delete_product))
}
