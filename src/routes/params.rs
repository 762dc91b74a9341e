use serde::{Deserialize, Deserializer};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    #[serde(default, deserialize_with = "number_or_string")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "number_or_string")]
    pub per_page: Option<i64>,
}

// Flattened query structs hand their fields over as strings.
fn number_or_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(n)),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s.trim().parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    /// Category slug; ignored when `category_id` is given.
    pub category: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CheckupListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
    /// Only applications assigned to the calling doctor.
    #[serde(default)]
    pub mine: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DoctorListQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
        let p = Pagination {
            page: Some(3),
            per_page: Some(500),
        };
        assert_eq!(p.normalize(), (3, 100, 200));
        let p = Pagination {
            page: Some(-4),
            per_page: Some(0),
        };
        assert_eq!(p.normalize(), (1, 1, 0));
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        let (page, per_page, offset) = p.normalize();
        assert_eq!((page, per_page), (i64::MAX, 100));
        assert_eq!(offset, i64::MAX);
    }

    #[test]
    fn flattened_pagination_parses_from_query_string() {
        let uri: axum::http::Uri = "/products?page=2&per_page=5&min_price=100&sort_by=price&in_stock=true"
            .parse()
            .unwrap();
        let axum::extract::Query(query) =
            axum::extract::Query::<ProductQuery>::try_from_uri(&uri).unwrap();
        assert_eq!(query.pagination.normalize(), (2, 5, 5));
        assert_eq!(query.min_price, Some(100));
        assert_eq!(query.in_stock, Some(true));
        assert!(matches!(query.sort_by, Some(ProductSortBy::Price)));
    }
}
