use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use storefront_recs::{
    db::{MemoryCatalog, MemoryOrderHistory},
    models::{Order, OrderItem, Product, ProductId, UserId},
    routes::{create_router, AppState},
    services::{cache::DEFAULT_TTL, RecommendationCache, RecommendationGateway},
};

fn product(name: &str, category: &str, brand: &str, price: f64, rating: f64, reviews: i64) -> Product {
    Product {
        id: ProductId::new(),
        name: name.to_string(),
        description: format!("{} {} {}", brand, category, name).to_lowercase(),
        category: category.to_string(),
        brand: brand.to_string(),
        price,
        rating,
        num_reviews: reviews,
        count_in_stock: 5,
    }
}

fn paid_order(user: UserId, products: &[&Product]) -> Order {
    Order {
        id: Uuid::new_v4(),
        user,
        items: products
            .iter()
            .map(|p| OrderItem {
                product: Some(p.id),
                quantity: 1,
                price: p.price,
            })
            .collect(),
        is_paid: true,
        paid_at: Some(Utc::now()),
    }
}

struct Fixture {
    server: TestServer,
    products: Vec<Product>,
    buyer: UserId,
}

fn create_test_server() -> Fixture {
    let products = vec![
        product("Headphones", "Electronics", "Acme", 100.0, 4.6, 210),
        product("Earbuds", "Electronics", "Acme", 110.0, 4.2, 95),
        product("Speaker", "Electronics", "Boom", 80.0, 4.6, 400),
        product("Novel", "Books", "Penguin", 15.0, 4.9, 30),
        product("Cookbook", "Books", "Vintage", 25.0, 3.8, 12),
    ];

    let buyer = UserId::new();
    let neighbour = UserId::new();
    let orders = vec![
        paid_order(buyer, &[&products[0]]),
        paid_order(neighbour, &[&products[0], &products[2]]),
    ];

    let gateway = RecommendationGateway::new(
        Arc::new(MemoryCatalog::new(products.clone())),
        Arc::new(MemoryOrderHistory::new(orders)),
        Arc::new(RecommendationCache::in_memory(DEFAULT_TTL)),
    );
    let state = Arc::new(AppState {
        gateway: Arc::new(gateway),
        admin_role: "admin".to_string(),
    });

    Fixture {
        server: TestServer::new(create_router(state)).unwrap(),
        products,
        buyer,
    }
}

fn user_header(user: &UserId) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&user.to_string()).unwrap(),
    )
}

fn admin_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-user-role"),
        HeaderValue::from_static("admin"),
    )
}

#[tokio::test]
async fn test_health_check() {
    let fixture = create_test_server();
    let response = fixture.server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let fixture = create_test_server();
    let response = fixture.server.get("/health").await;
    let request_id = response.header("x-request-id");
    assert!(Uuid::parse_str(request_id.to_str().unwrap()).is_ok());
}

#[tokio::test]
async fn test_product_recommendations() {
    let fixture = create_test_server();
    let target = &fixture.products[0];

    let response = fixture
        .server
        .get(&format!("/api/recommendations/product/{}", target.id))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["product"]["id"], target.id.to_string());
    assert_eq!(body["product"]["name"], "Headphones");
    assert_eq!(body["product"]["category"], "Electronics");
    assert_eq!(body["product"]["brand"], "Acme");

    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 4);
    assert_eq!(recommendations[0]["name"], "Earbuds");
    assert!(recommendations
        .iter()
        .all(|p| p["id"] != target.id.to_string()));
}

#[tokio::test]
async fn test_product_recommendations_unknown_product() {
    let fixture = create_test_server();
    let response = fixture
        .server
        .get(&format!("/api/recommendations/product/{}", ProductId::new()))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_recommendations_malformed_id() {
    let fixture = create_test_server();
    let response = fixture
        .server
        .get("/api/recommendations/product/not-an-id")
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not-an-id"));
}

#[tokio::test]
async fn test_user_recommendations_require_authentication() {
    let fixture = create_test_server();
    let response = fixture
        .server
        .get(&format!("/api/recommendations/user/{}", fixture.buyer))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_recommendations_malformed_id() {
    let fixture = create_test_server();
    let (name, value) = user_header(&fixture.buyer);
    let response = fixture
        .server
        .get("/api/recommendations/user/12345")
        .add_header(name, value)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_personalized_user_recommendations() {
    let fixture = create_test_server();
    let (name, value) = user_header(&fixture.buyer);

    let response = fixture
        .server
        .get(&format!("/api/recommendations/user/{}", fixture.buyer))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["user"], fixture.buyer.to_string());
    assert_eq!(body["type"], "personalized");
    let recommendations = body["recommendations"].as_array().unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0]["name"], "Speaker");
}

#[tokio::test]
async fn test_new_user_gets_popular_products() {
    let fixture = create_test_server();
    let newcomer = UserId::new();
    let (name, value) = user_header(&newcomer);

    let response = fixture
        .server
        .get(&format!("/api/recommendations/user/{}", newcomer))
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["type"], "popular");
    assert_eq!(body["recommendations"][0]["name"], "Novel");
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_profile_recommendations_skip_owned_products() {
    let fixture = create_test_server();
    let (name, value) = user_header(&fixture.buyer);

    let response = fixture
        .server
        .get(&format!("/api/recommendations/user/{}/profile", fixture.buyer))
        .add_header(name, value)
        .add_query_param("limit", 2)
        .await;

    response.assert_status_ok();
    let products: Vec<Product> = response.json();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Earbuds", "Speaker"]);
}

#[tokio::test]
async fn test_popular_products_with_limit() {
    let fixture = create_test_server();
    let response = fixture
        .server
        .get("/api/recommendations/popular")
        .add_query_param("limit", 3)
        .await;

    response.assert_status_ok();
    let products: Vec<Product> = response.json();
    let names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Novel", "Speaker", "Headphones"]);
}

#[tokio::test]
async fn test_cache_admin_endpoints() {
    let fixture = create_test_server();
    let admin = UserId::new();
    let target = fixture.products[3].id;

    fixture
        .server
        .get(&format!("/api/recommendations/product/{}", target))
        .await
        .assert_status_ok();
    fixture
        .server
        .get(&format!("/api/recommendations/product/{}", target))
        .await
        .assert_status_ok();

    let (id_name, id_value) = user_header(&admin);
    let (role_name, role_value) = admin_header();
    let response = fixture
        .server
        .get("/api/recommendations/cache-stats")
        .add_header(id_name.clone(), id_value.clone())
        .add_header(role_name.clone(), role_value.clone())
        .await;
    response.assert_status_ok();
    let stats: Value = response.json();
    assert_eq!(stats["hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["cacheSize"], 1);
    assert_eq!(stats["hitRate"], 0.5);

    let response = fixture
        .server
        .delete("/api/recommendations/cache")
        .add_header(id_name, id_value)
        .add_header(role_name, role_value)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Cache cleared. 1 entries removed.");
}

#[tokio::test]
async fn test_cache_endpoints_reject_non_admins() {
    let fixture = create_test_server();
    let (name, value) = user_header(&fixture.buyer);

    let response = fixture
        .server
        .get("/api/recommendations/cache-stats")
        .add_header(name.clone(), value.clone())
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = fixture.server.delete("/api/recommendations/cache").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
