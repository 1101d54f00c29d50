use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const PLACEHOLDER_IMAGE: &str = "/placeholder-food.jpg";
pub const DEFAULT_PROVIDER_NAME: &str = "Local Provider";
/// Flat fee charged on any non-empty cart.
pub const DELIVERY_FEE: Decimal = Decimal::from_parts(500, 0, 0, false, 2);

/// One cart line. Serialized exactly as the browser stores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub provider_name: String,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal { self.price * Decimal::from(self.quantity) }
}

/// The parts of a meal listing the cart needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSummary {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

impl CartTotals {
    pub fn of(items: &[CartItem]) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();
        let delivery_fee = if items.is_empty() { Decimal::ZERO } else { DELIVERY_FEE };
        CartTotals { subtotal, delivery_fee, total: subtotal + delivery_fee }
    }
}

/// Asset host for uploaded images: the API base without its trailing `/api`.
pub fn asset_base_from_api(api_url: &str) -> String {
    let trimmed = api_url.trim_end_matches('/');
    trimmed.strip_suffix("/api").unwrap_or(trimmed).to_string()
}

/// Absolute image URL for a stored image path. Windows-style separators are normalised,
/// absolute and `data:` URLs pass through, and a missing image gets the placeholder.
pub fn resolve_image_url(asset_base: &str, image_path: Option<&str>) -> String {
    let path = match image_path.map(|p| p.trim()).filter(|p| !p.is_empty()) {
        Some(p) => p.replace('\\', "/"),
        None => return PLACEHOLDER_IMAGE.to_string(),
    };
    if path.starts_with("http://") || path.starts_with("https://") || path.starts_with("data:") {
        return path;
    }
    format!("{}/{}", asset_base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item(id: &str, price: &str, qty: u32) -> CartItem {
        CartItem { id: id.into(), name: id.into(), price: Decimal::from_str(price).unwrap(), quantity: qty, image: String::new(), provider_name: String::new() }
    }

    #[test]
    fn totals_add_fee_only_when_non_empty() {
        let empty = CartTotals::of(&[]);
        assert_eq!(empty.total, Decimal::ZERO);
        assert_eq!(empty.delivery_fee, Decimal::ZERO);

        let t = CartTotals::of(&[item("a", "12.50", 2), item("b", "3.25", 1)]);
        assert_eq!(t.subtotal, Decimal::from_str("28.25").unwrap());
        assert_eq!(t.delivery_fee, Decimal::from_str("5.00").unwrap());
        assert_eq!(t.total, Decimal::from_str("33.25").unwrap());
    }

    #[test]
    fn image_resolution() {
        let base = asset_base_from_api("http://localhost:5000/api");
        assert_eq!(base, "http://localhost:5000");
        assert_eq!(resolve_image_url(&base, Some("uploads\\meals\\p.jpg")), "http://localhost:5000/uploads/meals/p.jpg");
        assert_eq!(resolve_image_url(&base, Some("https://res.cloudinary.com/x.png")), "https://res.cloudinary.com/x.png");
        assert_eq!(resolve_image_url(&base, None), PLACEHOLDER_IMAGE);
        assert_eq!(resolve_image_url(&base, Some("  ")), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn stored_shape_matches_browser_cart() {
        let json = r#"[{"id":"m1","name":"Pad Thai","price":9.5,"quantity":2,"image":"/p.jpg","providerName":"Thai Corner"}]"#;
        let items: Vec<CartItem> = serde_json::from_str(json).unwrap();
        assert_eq!(items[0].provider_name, "Thai Corner");
        assert_eq!(items[0].line_total(), Decimal::from(19));
        let back = serde_json::to_value(&items).unwrap();
        assert_eq!(back[0]["providerName"], "Thai Corner");
        assert!(back[0]["price"].is_number());
    }
}
