use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PAGE_SIZE: u64 = 100;
pub const MAX_PAGE_SIZE: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub available: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Exact category to match.
    pub categoria: Option<String>,
    /// Availability flag, 0 or 1.
    pub disponible: Option<i32>,
    /// Number of products to skip, default 0.
    pub skip: Option<i64>,
    /// Page size, default 100, at most 500. Zero yields an empty page.
    pub limit: Option<i64>,
}

impl ProductQuery {
    pub fn normalize(&self) -> (ProductFilter, Page) {
        let filter = ProductFilter {
            category: self.categoria.clone().filter(|c| !c.is_empty()),
            available: self.disponible,
        };
        let skip = self.skip.unwrap_or(0).max(0) as u64;
        let limit = self
            .limit
            .map(|l| l.clamp(0, MAX_PAGE_SIZE as i64) as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);
        (filter, Page { skip, limit })
    }
}
