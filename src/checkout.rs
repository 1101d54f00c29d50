//! Checkout: turn the stored cart into backend orders.
//!
//! One order request per cart line, all sent concurrently through an [`OrderSink`].
//! Only when every order was accepted are the ordered lines removed from the cart.

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backend::BackendClient;
use crate::cart::{CartError, CartItem, CartStore, CartTotals};

/// Page to show once the orders are in.
pub const SUCCESS_PAGE: &str = "/orders/success";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "cod")]
    CashOnDelivery,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub phone: String,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

impl CheckoutForm {
    /// Names of required fields that are blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.first_name.trim().is_empty() { missing.push("firstName"); }
        if self.address.trim().is_empty() { missing.push("address"); }
        if self.city.trim().is_empty() { missing.push("city"); }
        if self.phone.trim().is_empty() { missing.push("phone"); }
        missing
    }

    pub fn delivery_address(&self) -> String { format!("{}, {}", self.address.trim(), self.city.trim()) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub meal_id: String,
    pub quantity: u32,
    pub address: String,
}

/// Lifecycle states a provider moves an order through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(OrderStatus::Pending),
            "PREPARING" => Some(OrderStatus::Preparing),
            "READY" => Some(OrderStatus::Ready),
            "DELIVERED" => Some(OrderStatus::Delivered),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("{message}")]
    Rejected { message: String },
    #[error("Unauthorized! Please login again.")]
    Unauthorized,
    #[error("Connection failed: {0}")]
    Transport(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("no cart to check out")]
    NoCart,
    #[error("cart is empty")]
    EmptyCart,
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl CheckoutError {
    /// Where to send the user instead of the checkout page, if anywhere.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            CheckoutError::NoCart => Some("/meals"),
            CheckoutError::EmptyCart => Some("/cart"),
            _ => None,
        }
    }
}

/// Receives order requests; the backend in production, a recorder in tests.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn create_order(&self, order: &OrderRequest) -> Result<serde_json::Value, OrderError>;
}

/// Posts orders to the backend on behalf of the browser whose cookie is given.
pub struct BackendOrderSink {
    backend: BackendClient,
    cookie: Option<String>,
}

impl BackendOrderSink {
    pub fn new(backend: BackendClient, cookie: Option<String>) -> Self { Self { backend, cookie } }
}

#[async_trait]
impl OrderSink for BackendOrderSink {
    async fn create_order(&self, order: &OrderRequest) -> Result<serde_json::Value, OrderError> {
        self.backend.create_order(self.cookie.as_deref(), order).await
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutReceipt {
    pub orders: Vec<serde_json::Value>,
    pub totals: CartTotals,
    pub next: &'static str,
}

pub fn build_orders(items: &[CartItem], form: &CheckoutForm) -> Vec<OrderRequest> {
    let address = form.delivery_address();
    items
        .iter()
        .map(|i| OrderRequest { meal_id: i.id.clone(), quantity: i.quantity, address: address.clone() })
        .collect()
}

/// Place one order per cart line. On any failure the first error is returned and the
/// cart is left as it was. On success the ordered lines leave the cart; a line added
/// while the orders were in flight stays for the next checkout.
pub async fn place_order(cart: &CartStore, sink: &dyn OrderSink, form: &CheckoutForm) -> Result<CheckoutReceipt, CheckoutError> {
    if !cart.exists()? {
        return Err(CheckoutError::NoCart);
    }
    let items = cart.items()?;
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let missing = form.missing_fields();
    if !missing.is_empty() {
        return Err(CheckoutError::MissingFields(missing));
    }

    let totals = CartTotals::of(&items);
    let requests = build_orders(&items, form);
    let results = join_all(requests.iter().map(|r| sink.create_order(r))).await;

    let mut orders = Vec::with_capacity(results.len());
    for r in results {
        orders.push(r?);
    }

    let ordered: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
    let kept = cart.settle(&ordered)?;
    info!(target: "checkout", orders = orders.len(), kept, total = %totals.total, "order placed");
    Ok(CheckoutReceipt { orders, totals, next: SUCCESS_PAGE })
}
