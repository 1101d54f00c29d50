//! Checkout flow with a recording order sink and against a fake backend.

mod support;

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use mealgate::backend::BackendClient;
use mealgate::cart::{CartStore, MealSummary, MemoryStore};
use mealgate::checkout::{
    place_order, BackendOrderSink, CheckoutError, CheckoutForm, OrderError, OrderRequest, OrderSink, SUCCESS_PAGE,
};

/// Records every order; rejects meals listed in `reject`.
#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<OrderRequest>>,
    reject: Vec<&'static str>,
}

#[async_trait]
impl OrderSink for RecordingSink {
    async fn create_order(&self, order: &OrderRequest) -> Result<Value, OrderError> {
        self.seen.lock().push(order.clone());
        if self.reject.contains(&order.meal_id.as_str()) {
            return Err(OrderError::Rejected { message: format!("{} is sold out", order.meal_id) });
        }
        Ok(json!({"id": format!("order-{}", order.meal_id), "status": "PENDING"}))
    }
}

fn meal(id: &str, price: &str) -> MealSummary {
    MealSummary { id: id.into(), name: id.into(), price: Decimal::from_str(price).unwrap(), image_url: None, provider_name: None }
}

fn form() -> CheckoutForm {
    CheckoutForm {
        first_name: "Rafi".into(),
        last_name: "Ahmed".into(),
        address: "12 Lake Rd".into(),
        city: "Dhaka".into(),
        phone: "0123".into(),
        ..Default::default()
    }
}

fn cart_with(meals: &[(&str, &str)]) -> CartStore {
    let cart = CartStore::new(Arc::new(MemoryStore::new()), "http://localhost:5000");
    for (id, price) in meals {
        cart.add_meal(&meal(id, price)).unwrap();
    }
    cart
}

#[tokio::test]
async fn no_stored_cart_sends_user_to_meals() {
    let cart = CartStore::new(Arc::new(MemoryStore::new()), "http://localhost:5000");
    let sink = RecordingSink::default();
    let err = place_order(&cart, &sink, &form()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::NoCart));
    assert_eq!(err.redirect_target(), Some("/meals"));
    assert!(sink.seen.lock().is_empty());
}

#[tokio::test]
async fn empty_cart_sends_user_to_cart() {
    let cart = cart_with(&[("a", "1")]);
    cart.remove("a").unwrap();
    let err = place_order(&cart, &RecordingSink::default(), &form()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(err.redirect_target(), Some("/cart"));
}

#[tokio::test]
async fn blank_fields_block_submission() {
    let cart = cart_with(&[("a", "1")]);
    let sink = RecordingSink::default();
    let bad = CheckoutForm { phone: "".into(), city: "  ".into(), ..form() };
    let err = place_order(&cart, &sink, &bad).await.unwrap_err();
    assert_eq!(err.to_string(), "Please fill in all required fields: city, phone");
    assert!(sink.seen.lock().is_empty());
    assert_eq!(cart.items().unwrap().len(), 1);
}

#[tokio::test]
async fn success_places_one_order_per_line_and_clears_cart() {
    let cart = cart_with(&[("a", "12.50"), ("b", "3.25")]);
    cart.update_quantity("a", 1).unwrap();
    let mut events = cart.subscribe();
    let sink = RecordingSink::default();

    let receipt = place_order(&cart, &sink, &form()).await.unwrap();
    assert_eq!(receipt.next, SUCCESS_PAGE);
    assert_eq!(receipt.orders.len(), 2);
    assert_eq!(receipt.totals.total, Decimal::from_str("33.25").unwrap());

    let mut seen = sink.seen.lock().clone();
    seen.sort_by(|x, y| x.meal_id.cmp(&y.meal_id));
    assert_eq!(seen[0], OrderRequest { meal_id: "a".into(), quantity: 2, address: "12 Lake Rd, Dhaka".into() });
    assert_eq!(seen[1].quantity, 1);

    assert!(!cart.exists().unwrap());
    assert_eq!(events.try_recv().unwrap().lines(), 0);
}

#[tokio::test]
async fn any_rejection_keeps_the_cart() {
    let cart = cart_with(&[("a", "1"), ("b", "2")]);
    let sink = RecordingSink { reject: vec!["b"], ..Default::default() };
    let err = place_order(&cart, &sink, &form()).await.unwrap_err();
    assert_eq!(err.to_string(), "b is sold out");
    assert_eq!(sink.seen.lock().len(), 2, "all lines are submitted");
    assert_eq!(cart.items().unwrap().len(), 2);
}

/// Accepts every order, and adds a meal to the cart while the first one is in flight.
struct BusyTabSink {
    cart: Arc<CartStore>,
}

#[async_trait]
impl OrderSink for BusyTabSink {
    async fn create_order(&self, order: &OrderRequest) -> Result<Value, OrderError> {
        if order.meal_id == "a" {
            self.cart.add_meal(&meal("late", "4.00")).unwrap();
        }
        Ok(json!({"id": format!("order-{}", order.meal_id)}))
    }
}

#[tokio::test]
async fn lines_added_during_checkout_survive() {
    let cart = Arc::new(cart_with(&[("a", "12.50"), ("b", "3.25")]));
    let sink = BusyTabSink { cart: cart.clone() };

    let receipt = place_order(&cart, &sink, &form()).await.unwrap();
    assert_eq!(receipt.orders.len(), 2);
    let left: Vec<String> = cart.items().unwrap().into_iter().map(|i| i.id).collect();
    assert_eq!(left, vec!["late".to_string()]);
    assert_eq!(cart.totals().unwrap().total, Decimal::from_str("9.00").unwrap());
}

/// Backend that accepts orders only with the right cookie and refuses meal `x`.
fn orders_backend() -> Router {
    Router::new().route(
        "/api/orders",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).unwrap_or("");
            if cookie != "token=ok" {
                return (StatusCode::UNAUTHORIZED, Json(json!({"success": false, "message": "Unauthorized"})));
            }
            if body["mealId"] == "x" {
                return (StatusCode::BAD_REQUEST, Json(json!({"success": false, "message": "Meal unavailable"})));
            }
            if body["mealId"] == "y" {
                return (StatusCode::BAD_REQUEST, Json(json!({"success": false})));
            }
            (StatusCode::CREATED, Json(json!({"success": true, "data": {"mealId": body["mealId"], "address": body["address"]}})))
        }),
    )
}

#[tokio::test]
async fn backend_sink_maps_responses() {
    let base = support::spawn_upstream(orders_backend()).await;
    let backend = BackendClient::new(&format!("{}/api", base), &format!("{}/api/auth", base)).unwrap();
    let order = |id: &str| OrderRequest { meal_id: id.into(), quantity: 1, address: "1 Main St, Sylhet".into() };

    let sink = BackendOrderSink::new(backend.clone(), Some("token=ok".into()));
    let data = sink.create_order(&order("m1")).await.unwrap();
    assert_eq!(data, json!({"mealId": "m1", "address": "1 Main St, Sylhet"}));
    assert_eq!(
        sink.create_order(&order("x")).await.unwrap_err(),
        OrderError::Rejected { message: "Meal unavailable".into() }
    );
    assert_eq!(
        sink.create_order(&order("y")).await.unwrap_err(),
        OrderError::Rejected { message: "Failed to create order".into() }
    );

    let anonymous = BackendOrderSink::new(backend, None);
    assert_eq!(anonymous.create_order(&order("m1")).await.unwrap_err(), OrderError::Unauthorized);

    let dead = support::dead_upstream().await;
    let offline = BackendOrderSink::new(BackendClient::new(&dead, &dead).unwrap(), None);
    assert!(matches!(offline.create_order(&order("m1")).await.unwrap_err(), OrderError::Transport(_)));
}
