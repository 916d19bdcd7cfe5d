pub mod bookmark;
pub mod product;

use garde::Validate;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::listing::{PageSlice, Pagination};

/// Query parameters shared by the listing endpoints. Numeric and date bounds
/// are typed, so a malformed value is rejected with 400 instead of silently
/// filtering everything out.
#[derive(Debug, Clone, Validate, Deserialize)]
#[garde(allow_unvalidated)]
pub struct ListingQuery {
    pub page: Option<i64>,
    #[garde(range(max = 1000))]
    pub limit: Option<i64>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<f64>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<f64>,
    #[serde(rename = "minDate", default, with = "time::serde::rfc3339::option")]
    pub min_date: Option<OffsetDateTime>,
    #[serde(rename = "maxDate", default, with = "time::serde::rfc3339::option")]
    pub max_date: Option<OffsetDateTime>,
    #[garde(length(max = 255))]
    pub sort: Option<String>,
    #[garde(length(max = 16))]
    pub order: Option<String>,
    #[garde(length(max = 255))]
    pub q: Option<String>,
}

/// Envelope of the global listing; the UI expects the rows under `products`
/// here and under `data` on the scoped variants.
#[derive(Debug, Serialize)]
pub struct ProductPage<T> {
    pub products: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<PageSlice<T>> for ProductPage<T> {
    fn from(slice: PageSlice<T>) -> Self {
        Self {
            products: slice.items,
            pagination: slice.pagination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DataPage<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<PageSlice<T>> for DataPage<T> {
    fn from(slice: PageSlice<T>) -> Self {
        Self {
            data: slice.items,
            pagination: slice.pagination,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatusData<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T> StatusData<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}
