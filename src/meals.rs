//! Meal catalogue helpers: the browse page's search, category, price and sort filters,
//! and review averages for the meal details page. Pure functions over backend listings.

use chrono::DateTime;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cart::MealSummary;

/// Upper end of the default price filter.
pub const DEFAULT_MAX_PRICE: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// A meal's category as the backend sends it: sometimes a bare name, sometimes an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MealCategory {
    Name(String),
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl MealCategory {
    pub fn name(&self) -> Option<&str> {
        match self {
            MealCategory::Name(n) => Some(n.as_str()),
            MealCategory::Object { name, .. } => name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub rating: Decimal,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One meal from `GET /meals` or `GET /meals/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeal {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<MealCategory>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub provider: Option<ProviderInfo>,
    #[serde(default)]
    pub reviews: Vec<Review>,
}

impl CatalogMeal {
    pub fn category_name(&self) -> Option<&str> { self.category.as_ref().and_then(MealCategory::name) }

    /// Creation time in epoch milliseconds; missing or unparseable dates sort as 0.
    pub fn created_millis(&self) -> i64 {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.timestamp_millis())
            .unwrap_or(0)
    }

    /// Mean review rating to one decimal place, `"0.0"` with no reviews.
    pub fn average_rating(&self) -> String { average_rating(&self.reviews) }
}

impl From<&CatalogMeal> for MealSummary {
    fn from(m: &CatalogMeal) -> Self {
        MealSummary {
            id: m.id.clone(),
            name: m.name.clone(),
            price: m.price,
            image_url: m.image_url.clone(),
            provider_name: m.provider.as_ref().map(|p| p.name.clone()),
        }
    }
}

pub fn average_rating(reviews: &[Review]) -> String {
    if reviews.is_empty() {
        return "0.0".to_string();
    }
    let sum: Decimal = reviews.iter().map(|r| r.rating).sum();
    let mean = (sum / Decimal::from(reviews.len())).round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.1}", mean)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    #[default]
    Newest,
    PriceLow,
    PriceHigh,
}

impl SortOption {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "newest" => Some(SortOption::Newest),
            "price-low" => Some(SortOption::PriceLow),
            "price-high" => Some(SortOption::PriceHigh),
            _ => None,
        }
    }
}

/// Browse page filter state. `Default` is the reset state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealFilter {
    pub search: String,
    /// Category names; empty means every category.
    pub categories: Vec<String>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub sort: SortOption,
}

impl Default for MealFilter {
    fn default() -> Self {
        Self { search: String::new(), categories: Vec::new(), min_price: Decimal::ZERO, max_price: DEFAULT_MAX_PRICE, sort: SortOption::Newest }
    }
}

impl MealFilter {
    /// Filter preselected from a `?category=` link.
    pub fn for_category(category: &str) -> Self {
        Self { categories: vec![category.to_string()], ..Self::default() }
    }

    pub fn matches(&self, meal: &CatalogMeal) -> bool {
        let search = self.search.to_lowercase();
        let by_name = meal.name.to_lowercase().contains(&search);
        let by_category = self.categories.is_empty()
            || self.categories.iter().any(|c| c == meal.category_name().unwrap_or(""));
        let by_price = meal.price >= self.min_price && meal.price <= self.max_price;
        by_name && by_category && by_price
    }

    /// Matching meals in display order. Ties keep the listing order.
    pub fn apply(&self, meals: &[CatalogMeal]) -> Vec<CatalogMeal> {
        let mut out: Vec<CatalogMeal> = meals.iter().filter(|m| self.matches(m)).cloned().collect();
        match self.sort {
            SortOption::PriceLow => out.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOption::PriceHigh => out.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOption::Newest => out.sort_by_key(|m| std::cmp::Reverse(m.created_millis())),
        }
        out
    }
}
