//! Integration tests for the SACCO backend
//!
//! These tests require the backend server to be running on localhost:8080
//! with a reachable database. Start it with `cargo run` before running tests.

use reqwest;
use serde_json::json;
use std::time::Duration;

const BASE_URL: &str = "http://localhost:8080";

async fn check_server_available() -> bool {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();

    client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .is_ok()
}

macro_rules! require_server {
    () => {
        if !check_server_available().await {
            eprintln!("\n⚠️  Backend server is not running on {}", BASE_URL);
            eprintln!("   Start the server with: cargo run");
            eprintln!("   Then run tests with: cargo test --test integration_test\n");
            return;
        }
    };
}

fn cookie_client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .unwrap()
}

// registering with a unique email so the tests can run repeatedly
fn unique_email(prefix: &str) -> String {
    format!(
        "{}+{}@villagesacco.com",
        prefix,
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

async fn register_member(client: &reqwest::Client, email: &str) {
    let response = client
        .post(format!("{}/api/auth/register", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "member123",
            "first_name": "Test",
            "last_name": "Member",
            "phone": "+256 700 000 099"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_health_check() {
    require_server!();

    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_unauthenticated_savings_request_is_401() {
    require_server!();

    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/savings", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_garbage_token_is_401_invalid_token() {
    require_server!();

    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/transactions", BASE_URL))
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Invalid token");
}

#[tokio::test]
async fn test_register_then_login_sets_session() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("login");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "member123" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], email);
    assert_eq!(body["user"]["role"], "MEMBER");
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_401() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("wrongpw");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": "not-the-password" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_deposit_then_overdraw_reports_available_balance() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("withdraw");

    register_member(&client, &email).await;

    for amount in [500.00, 250.00] {
        let response = client
            .post(format!("{}/api/savings", BASE_URL))
            .json(&json!({ "amount": amount }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    let response = client
        .post(format!("{}/api/savings/withdraw", BASE_URL))
        .json(&json!({ "amount": 1000.00 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Insufficient savings balance");
    assert_eq!(body["available_balance"], "750.00");
}

#[tokio::test]
async fn test_withdrawal_within_balance_succeeds() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("covered");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/savings", BASE_URL))
        .json(&json!({ "amount": 100.00 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let response = client
        .post(format!("{}/api/savings/withdraw", BASE_URL))
        .json(&json!({ "amount": 40.00 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["success"], true);
    assert_eq!(body["remaining_balance"], "60.00");
    assert_eq!(body["transaction"]["transaction_type"], "WITHDRAWAL");
    assert_eq!(body["transaction"]["status"], "COMPLETED");
}

#[tokio::test]
async fn test_zero_amount_deposit_is_rejected() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("zerodep");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/savings", BASE_URL))
        .json(&json!({ "amount": 0 }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_transactions_are_newest_first_and_bounded() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("txlist");

    register_member(&client, &email).await;

    // 12 deposits; the listing must cap at the page size of 10
    for i in 1..=12 {
        let response = client
            .post(format!("{}/api/savings", BASE_URL))
            .json(&json!({ "amount": i }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 201);
    }

    let response = client
        .get(format!("{}/api/transactions", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let transactions = body["transactions"].as_array().expect("array");
    assert_eq!(transactions.len(), 10);
}

#[tokio::test]
async fn test_member_cannot_reach_admin_api() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("notadmin");

    register_member(&client, &email).await;

    let response = client
        .get(format!("{}/api/admin/members", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["error"], "Forbidden");
}

#[tokio::test]
async fn test_loan_request_starts_pending() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("loan");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/loans", BASE_URL))
        .json(&json!({ "amount": 200.00, "reason": "Small business expansion" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["loan"]["status"], "PENDING");
}

#[tokio::test]
async fn test_card_request_starts_pending() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("card");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/cards", BASE_URL))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["card"]["status"], "PENDING");
}

#[tokio::test]
async fn test_logout_clears_session() {
    require_server!();

    let client = cookie_client();
    let email = unique_email("logout");

    register_member(&client, &email).await;

    let response = client
        .post(format!("{}/api/auth/logout", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{}/api/savings", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}
