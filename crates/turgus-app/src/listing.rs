//! In-memory listing pipeline: rating aggregation, range filtering, sorting
//! and pagination. Every listing endpoint composes these in the same order:
//! load, enrich, filter, sort, paginate.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use time::OffsetDateTime;
use turgus_dal::{product::Product, rating::Rating};

/// Product joined with its rating aggregate, computed at read time.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedProduct {
    #[serde(flatten)]
    pub product: Product,
    #[serde(rename = "ratingCount")]
    pub rating_count: u32,
    #[serde(rename = "avgRating")]
    pub avg_rating: f64,
}

/// Joins rating aggregates onto products, keeping the input product order.
/// A product without ratings gets `rating_count = 0` and `avg_rating = 0.0`.
pub fn aggregate(products: Vec<Product>, ratings: &[Rating]) -> Vec<EnrichedProduct> {
    let mut totals: HashMap<i64, (u32, i64)> = HashMap::new();
    for rating in ratings {
        let entry = totals.entry(rating.product_id).or_default();
        entry.0 += 1;
        entry.1 += rating.stars;
    }

    products
        .into_iter()
        .map(|product| {
            let (rating_count, stars) = totals.get(&product.id).copied().unwrap_or((0, 0));
            let avg_rating = if rating_count > 0 {
                stars as f64 / rating_count as f64
            } else {
                0.0
            };
            EnrichedProduct {
                product,
                rating_count,
                avg_rating,
            }
        })
        .collect()
}

/// Single-product variant of [`aggregate`], for the detail endpoint.
pub fn enrich_one(product: Product, ratings: &[Rating]) -> EnrichedProduct {
    let own: Vec<&Rating> = ratings
        .iter()
        .filter(|r| r.product_id == product.id)
        .collect();
    let rating_count = own.len() as u32;
    let avg_rating = if rating_count > 0 {
        own.iter().map(|r| r.stars).sum::<i64>() as f64 / rating_count as f64
    } else {
        0.0
    };
    EnrichedProduct {
        product,
        rating_count,
        avg_rating,
    }
}

/// Inclusive range predicate on a single product field. An absent bound
/// leaves that side open.
#[derive(Debug, Clone, Copy)]
pub enum RangeFilter {
    Price {
        min: Option<f64>,
        max: Option<f64>,
    },
    Created {
        min: Option<OffsetDateTime>,
        max: Option<OffsetDateTime>,
    },
}

impl RangeFilter {
    pub fn is_bounded(&self) -> bool {
        match self {
            RangeFilter::Price { min, max } => min.is_some() || max.is_some(),
            RangeFilter::Created { min, max } => min.is_some() || max.is_some(),
        }
    }

    fn keeps(&self, item: &EnrichedProduct) -> bool {
        match *self {
            RangeFilter::Price { min, max } => {
                let value = item.product.price;
                min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
            }
            RangeFilter::Created { min, max } => {
                let value = item.product.created;
                min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
            }
        }
    }
}

/// Returns the subset inside the bounds; a filter with no bounds is a no-op.
pub fn filter_by_range(items: Vec<EnrichedProduct>, range: &RangeFilter) -> Vec<EnrichedProduct> {
    if !range.is_bounded() {
        return items;
    }
    items.into_iter().filter(|item| range.keeps(item)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    /// Creation time, requested as `timestamp`.
    #[default]
    Created,
    Price,
    Name,
    AvgRating,
}

impl SortField {
    /// Resolves the requested sort field against the allow list. Anything
    /// unknown or absent falls back to creation time.
    pub fn resolve(requested: Option<&str>) -> Self {
        match requested {
            Some("timestamp") => SortField::Created,
            Some("price") => SortField::Price,
            Some("name") => SortField::Name,
            Some("avgRating") => SortField::AvgRating,
            _ => SortField::Created,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Only a case insensitive `desc` yields descending order.
    pub fn resolve(requested: Option<&str>) -> Self {
        match requested {
            Some(order) if order.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

/// Stable sort by the resolved field; equal keys keep their relative order.
pub fn sort_products(
    mut items: Vec<EnrichedProduct>,
    field: SortField,
    order: SortOrder,
) -> Vec<EnrichedProduct> {
    let apply = |ordering: Ordering| match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    };
    match field {
        SortField::Created => items.sort_by(|a, b| apply(a.product.created.cmp(&b.product.created))),
        SortField::Price => items.sort_by(|a, b| apply(a.product.price.total_cmp(&b.product.price))),
        SortField::AvgRating => items.sort_by(|a, b| apply(a.avg_rating.total_cmp(&b.avg_rating))),
        SortField::Name => {
            // lowercase once per item, not twice per comparison
            let mut keyed: Vec<(String, EnrichedProduct)> = items
                .drain(..)
                .map(|item| (item.product.name.to_lowercase(), item))
                .collect();
            keyed.sort_by(|a, b| apply(a.0.cmp(&b.0)));
            items.extend(keyed.into_iter().map(|(_, item)| item));
        }
    }
    items
}

#[derive(Debug, Clone, Copy)]
pub struct PageParams {
    pub page: u32,
    pub limit: u32,
}

impl PageParams {
    /// Coerces page and limit to at least 1; an absent limit uses the
    /// endpoint default.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, u32::MAX as i64) as u32,
            limit: limit
                .unwrap_or(default_limit as i64)
                .clamp(1, u32::MAX as i64) as u32,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
}

#[derive(Debug)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// Cuts the page out of an already filtered and sorted collection. A page
/// past the end yields an empty slice, not an error.
pub fn paginate<T>(items: Vec<T>, params: PageParams) -> PageSlice<T> {
    let total_products = items.len() as u64;
    let limit = params.limit as u64;
    let total_pages = ((total_products + limit - 1) / limit) as u32;
    let offset = (params.page as u64 - 1) * limit;

    let items = items
        .into_iter()
        .skip(offset as usize)
        .take(params.limit as usize)
        .collect();

    PageSlice {
        items,
        pagination: Pagination {
            current_page: params.page,
            total_pages,
            total_products,
        },
    }
}

/// Highly rated products with at least one rating, most rated first.
pub fn pick_hot(enriched: Vec<EnrichedProduct>, min_avg: f64, take: usize) -> Vec<EnrichedProduct> {
    let mut hot: Vec<_> = enriched
        .into_iter()
        .filter(|p| p.avg_rating >= min_avg && p.rating_count > 0)
        .collect();
    hot.sort_by(|a, b| b.rating_count.cmp(&a.rating_count));
    hot.truncate(take);
    hot
}

/// Seller level aggregate: mean of per-product averages over products that
/// have at least one rating, rounded to two decimals. Returns the average and
/// the number of rated products.
pub fn seller_rating_summary(enriched: &[EnrichedProduct]) -> (f64, u32) {
    let mut total_ratings = 0u32;
    let mut total_stars = 0f64;
    for item in enriched {
        if item.rating_count > 0 {
            total_ratings += 1;
            total_stars += item.avg_rating;
        }
    }
    if total_ratings == 0 {
        return (0.0, 0);
    }
    let avg = total_stars / total_ratings as f64;
    ((avg * 100.0).round() / 100.0, total_ratings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: i64, price: f64, name: &str, created_secs: i64) -> Product {
        Product {
            id,
            user_id: 1,
            category_id: 1,
            subcategory_id: None,
            name: name.to_string(),
            price,
            description: None,
            amount_in_stock: 1,
            image_url: None,
            created: OffsetDateTime::from_unix_timestamp(created_secs).unwrap(),
        }
    }

    fn rating(product_id: i64, stars: i64) -> Rating {
        Rating {
            id: 0,
            user_id: 1,
            product_id,
            stars,
            comment: None,
            created: OffsetDateTime::from_unix_timestamp(0).unwrap(),
        }
    }

    fn sample() -> (Vec<Product>, Vec<Rating>) {
        let products = vec![
            product(1, 10.0, "A", 100),
            product(2, 30.0, "B", 200),
            product(3, 20.0, "C", 300),
        ];
        let ratings = vec![rating(1, 5), rating(1, 3), rating(2, 4)];
        (products, ratings)
    }

    #[test]
    fn aggregation_matches_rating_sets() {
        let (products, ratings) = sample();
        let enriched = aggregate(products, &ratings);

        assert_eq!(enriched[0].rating_count, 2);
        assert_eq!(enriched[0].avg_rating, 4.0);
        assert_eq!(enriched[1].rating_count, 1);
        assert_eq!(enriched[1].avg_rating, 4.0);
        assert_eq!(enriched[2].rating_count, 0);
        assert_eq!(enriched[2].avg_rating, 0.0);
        // input order preserved
        let ids: Vec<_> = enriched.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn range_filter_is_inclusive_and_monotone() {
        let (products, ratings) = sample();
        let enriched = aggregate(products, &ratings);

        let narrow = filter_by_range(
            enriched.clone(),
            &RangeFilter::Price {
                min: Some(20.0),
                max: Some(30.0),
            },
        );
        let narrow_ids: Vec<_> = narrow.iter().map(|p| p.product.id).collect();
        assert_eq!(narrow_ids, vec![2, 3]);

        // widening the bounds never shrinks the kept set
        let wide = filter_by_range(
            enriched.clone(),
            &RangeFilter::Price {
                min: Some(0.0),
                max: Some(100.0),
            },
        );
        assert!(wide.len() >= narrow.len());
        assert_eq!(wide.len(), 3);

        // absent bounds leave the side open
        let open = filter_by_range(
            enriched.clone(),
            &RangeFilter::Price {
                min: Some(20.0),
                max: None,
            },
        );
        assert_eq!(open.len(), 2);

        let unbounded = filter_by_range(enriched, &RangeFilter::Price { min: None, max: None });
        assert_eq!(unbounded.len(), 3);
    }

    #[test]
    fn date_range_filter() {
        let (products, ratings) = sample();
        let enriched = aggregate(products, &ratings);

        let kept = filter_by_range(
            enriched,
            &RangeFilter::Created {
                min: Some(OffsetDateTime::from_unix_timestamp(200).unwrap()),
                max: None,
            },
        );
        let ids: Vec<_> = kept.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn sort_field_falls_back_to_timestamp() {
        assert_eq!(SortField::resolve(Some("bogus_field")), SortField::Created);
        assert_eq!(SortField::resolve(None), SortField::Created);
        assert_eq!(SortField::resolve(Some("price")), SortField::Price);
        assert_eq!(SortField::resolve(Some("avgRating")), SortField::AvgRating);

        let (products, ratings) = sample();
        let enriched = aggregate(products, &ratings);
        let by_bogus = sort_products(
            enriched.clone(),
            SortField::resolve(Some("bogus_field")),
            SortOrder::Asc,
        );
        let by_created = sort_products(enriched, SortField::Created, SortOrder::Asc);
        let a: Vec<_> = by_bogus.iter().map(|p| p.product.id).collect();
        let b: Vec<_> = by_created.iter().map(|p| p.product.id).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn sort_order_resolution() {
        assert_eq!(SortOrder::resolve(Some("DESC")), SortOrder::Desc);
        assert_eq!(SortOrder::resolve(Some("desc")), SortOrder::Desc);
        assert_eq!(SortOrder::resolve(Some("ascending")), SortOrder::Asc);
        assert_eq!(SortOrder::resolve(None), SortOrder::Asc);
    }

    #[test]
    fn sort_is_stable_on_equal_keys() {
        let products = vec![
            product(1, 10.0, "A", 100),
            product(2, 10.0, "B", 200),
            product(3, 10.0, "C", 300),
        ];
        let sorted = sort_products(aggregate(products, &[]), SortField::Price, SortOrder::Asc);
        let ids: Vec<_> = sorted.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        // reversing the comparator must not reorder ties either
        let products = vec![
            product(1, 10.0, "A", 100),
            product(2, 10.0, "B", 200),
            product(3, 10.0, "C", 300),
        ];
        let sorted = sort_products(aggregate(products, &[]), SortField::Price, SortOrder::Desc);
        let ids: Vec<_> = sorted.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn name_sort_ignores_case_and_keeps_ties_stable() {
        let products = vec![
            product(1, 10.0, "zebra print", 100),
            product(2, 20.0, "Apple stand", 200),
            product(3, 30.0, "apple stand", 300),
            product(4, 40.0, "Mug", 400),
        ];
        let sorted = sort_products(aggregate(products, &[]), SortField::Name, SortOrder::Asc);
        let ids: Vec<_> = sorted.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![2, 3, 4, 1]);

        let products = vec![
            product(1, 10.0, "zebra print", 100),
            product(2, 20.0, "Apple stand", 200),
            product(3, 30.0, "apple stand", 300),
            product(4, 40.0, "Mug", 400),
        ];
        let sorted = sort_products(aggregate(products, &[]), SortField::Name, SortOrder::Desc);
        let ids: Vec<_> = sorted.iter().map(|p| p.product.id).collect();
        // the equal "apple stand" pair keeps its relative order under desc too
        assert_eq!(ids, vec![1, 4, 2, 3]);
    }

    #[test]
    fn pagination_covers_the_whole_set_once() {
        let items: Vec<i64> = (1..=10).collect();
        let params = PageParams::new(Some(1), Some(3), 8);
        let first = paginate(items.clone(), params);
        assert_eq!(first.pagination.total_pages, 4);
        assert_eq!(first.pagination.total_products, 10);

        let mut collected = Vec::new();
        for page in 1..=first.pagination.total_pages {
            let slice = paginate(items.clone(), PageParams::new(Some(page as i64), Some(3), 8));
            assert!(slice.items.len() <= 3);
            collected.extend(slice.items);
        }
        assert_eq!(collected, items);

        // page past the end is empty, not an error
        let past = paginate(items, PageParams::new(Some(99), Some(3), 8));
        assert!(past.items.is_empty());
        assert_eq!(past.pagination.current_page, 99);
    }

    #[test]
    fn page_params_are_floored_at_one() {
        let params = PageParams::new(Some(0), Some(-5), 8);
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 1);

        let slice = paginate(vec![1, 2, 3], params);
        assert_eq!(slice.items, vec![1]);
        assert_eq!(slice.pagination.current_page, 1);
        assert_eq!(slice.pagination.total_pages, 3);

        let defaults = PageParams::new(None, None, 8);
        assert_eq!(defaults.page, 1);
        assert_eq!(defaults.limit, 8);
    }

    #[test]
    fn full_pipeline_example() {
        let (products, ratings) = sample();

        let enriched = aggregate(products, &ratings);
        let filtered = filter_by_range(
            enriched,
            &RangeFilter::Price {
                min: Some(15.0),
                max: Some(100.0),
            },
        );
        let sorted = sort_products(filtered, SortField::Price, SortOrder::Desc);
        let page = paginate(sorted, PageParams::new(Some(1), Some(1), 8));

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].product.id, 2);
        assert_eq!(page.items[0].product.price, 30.0);
        assert_eq!(
            page.pagination,
            Pagination {
                current_page: 1,
                total_pages: 2,
                total_products: 2,
            }
        );
    }

    #[test]
    fn empty_set_is_a_normal_result() {
        let enriched = aggregate(Vec::new(), &[]);
        let sorted = sort_products(enriched, SortField::Created, SortOrder::Desc);
        let page = paginate(sorted, PageParams::new(None, None, 8));

        assert!(page.items.is_empty());
        assert_eq!(
            page.pagination,
            Pagination {
                current_page: 1,
                total_pages: 0,
                total_products: 0,
            }
        );
    }

    #[test]
    fn hot_products_selection() {
        let products = vec![
            product(1, 10.0, "A", 100),
            product(2, 20.0, "B", 200),
            product(3, 30.0, "C", 300),
        ];
        let ratings = vec![
            rating(1, 5),
            rating(1, 5),
            rating(1, 4),
            rating(2, 5),
            rating(3, 3),
        ];
        // P1 avg 4.67 count 3, P2 avg 5 count 1, P3 avg 3
        let hot = pick_hot(aggregate(products, &ratings), 4.5, 4);
        let ids: Vec<_> = hot.iter().map(|p| p.product.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn seller_summary_averages_rated_products() {
        let (products, ratings) = sample();
        let enriched = aggregate(products, &ratings);
        // P1 avg 4, P2 avg 4, P3 unrated
        let (avg, rated) = seller_rating_summary(&enriched);
        assert_eq!(avg, 4.0);
        assert_eq!(rated, 2);

        assert_eq!(seller_rating_summary(&[]), (0.0, 0));
    }
}
