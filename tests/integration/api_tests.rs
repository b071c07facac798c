//! API integration tests
//!
//! These tests run against a live server (with its database and Redis)
//! listening on localhost:8080. The admin-only tests additionally expect
//! an admin account with the credentials below.

use reqwest::Client;
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080/api/v1";

const ADMIN_EMAIL: &str = "admin@libris.local";
const ADMIN_PASSWORD: &str = "libris-admin";

/// Short unique suffix for emails, usernames and book fields
fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Register a fresh user and return (email, username, password)
async fn register_user(client: &Client) -> (String, String, String) {
    let suffix = unique();
    let email = format!("user-{}@example.com", suffix);
    let username = format!("user_{}", suffix);
    let password = "a-strong-password".to_string();

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": email,
            "username": username,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send registration request");
    assert_eq!(response.status(), 201);

    (email, username, password)
}

/// Login and return the bearer token
async fn login_token(client: &Client, email: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": password
        }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Create a book with a unique identity triple; returns the response body
async fn create_book(client: &Client, token: &str, barcode: Option<&str>) -> Value {
    let suffix = unique();
    let mut payload = json!({
        "name": format!("Book {}", suffix),
        "summary": "A test summary",
        "author": format!("Author {}", suffix),
        "genre": "Fiction"
    });
    if let Some(barcode) = barcode {
        payload["barcode"] = json!(barcode);
    }

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&payload)
        .send()
        .await
        .expect("Failed to send create book request");
    assert_eq!(response.status(), 201);

    response.json().await.expect("Failed to parse book response")
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_register_and_login() {
    let client = Client::new();
    let (email, username, password) = register_user(&client).await;

    let token = login_token(&client, &email, &password).await;

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["username"], username.as_str());
    assert_eq!(body["email"], email.as_str());
    // The password hash never leaves the server
    assert!(body.get("password").is_none());
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();
    let (email, _, _) = register_user(&client).await;

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": email,
            "password": "not-the-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_email_registration_conflicts() {
    let client = Client::new();
    let (email, _, _) = register_user(&client).await;

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": email,
            "username": format!("other_{}", unique()),
            "password": "a-strong-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_registration_rejects_short_phone_number() {
    let client = Client::new();
    let suffix = unique();

    let response = client
        .post(format!("{}/users", BASE_URL))
        .json(&json!({
            "email": format!("user-{}@example.com", suffix),
            "username": format!("user_{}", suffix),
            "password": "a-strong-password",
            "phone_number": "1234567"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_book_conflicts_unless_genre_differs() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let book = create_book(&client, &token, None).await;

    // Same identity triple conflicts
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": book["name"],
            "author": book["author"],
            "genre": book["genre"]
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // A different genre makes it a different book
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": book["name"],
            "author": book["author"],
            "genre": "Poetry"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);
}

#[tokio::test]
#[ignore]
async fn test_create_book_rejects_blank_name() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": "   ",
            "author": "Somebody",
            "genre": "Fiction"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_summary_only_update_keeps_other_fields() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let barcode = format!("BC-{}", unique());
    let book = create_book(&client, &token, Some(barcode.as_str())).await;
    let book_id = book["id"].as_str().expect("No book ID");

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "summary": "A brand new synopsis" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let updated: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(updated["summary"], "A brand new synopsis");
    assert_eq!(updated["name"], book["name"]);
    assert_eq!(updated["author"], book["author"]);
    assert_eq!(updated["genre"], book["genre"]);
    assert_eq!(updated["barcode"], book["barcode"]);
    assert_eq!(updated["last_updated_by"], email.as_str());
}

#[tokio::test]
#[ignore]
async fn test_update_inactive_book_forbidden() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let book = create_book(&client, &token, None).await;
    let book_id = book["id"].as_str().expect("No book ID");

    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Updates are rejected until the book is restored
    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "summary": "Should not apply" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);

    let response = client
        .post(format!("{}/books/{}/restore", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let response = client
        .put(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "summary": "Applies after restore" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);
}

#[tokio::test]
#[ignore]
async fn test_soft_delete_and_restore_are_idempotent() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let book = create_book(&client, &token, None).await;
    let book_id = book["id"].as_str().expect("No book ID");

    for _ in 0..2 {
        let response = client
            .delete(format!("{}/books/{}", BASE_URL, book_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 204);
    }

    let response = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["is_active"], false);

    for _ in 0..2 {
        let response = client
            .post(format!("{}/books/{}/restore", BASE_URL, book_id))
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.expect("Failed to parse response");
        assert_eq!(body["is_active"], true);
    }
}

#[tokio::test]
#[ignore]
async fn test_barcode_conflict() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let barcode = format!("BC-{}", unique());
    create_book(&client, &token, Some(barcode.as_str())).await;

    let suffix = unique();
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "name": format!("Book {}", suffix),
            "author": format!("Author {}", suffix),
            "genre": "Fiction",
            "barcode": barcode
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_get_book_by_barcode() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let barcode = format!("BC-{}", unique());
    let book = create_book(&client, &token, Some(barcode.as_str())).await;

    let response = client
        .get(format!("{}/books/barcode/{}", BASE_URL, barcode))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], book["id"]);

    let response = client
        .get(format!("{}/books/barcode/no-such-barcode", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[ignore]
async fn test_email_change_noop_mismatch_and_conflict() {
    let client = Client::new();
    let (email_a, _, password) = register_user(&client).await;
    let (email_b, _, _) = register_user(&client).await;
    let token = login_token(&client, &email_a, &password).await;

    // Changing to the current email is a no-op success
    let response = client
        .put(format!("{}/users/me/email", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "old_email": email_a, "new_email": email_a }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // A wrong old email is a mismatch
    let response = client
        .put(format!("{}/users/me/email", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "old_email": "wrong@example.com",
            "new_email": format!("new-{}@example.com", unique())
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    // An email owned by another account conflicts
    let response = client
        .put(format!("{}/users/me/email", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "old_email": email_a, "new_email": email_b }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_username_change_mismatch() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let response = client
        .put(format!("{}/users/me/username", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "old_username": "not_the_username",
            "new_username": format!("user_{}", unique())
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);
}

#[tokio::test]
#[ignore]
async fn test_password_change_verifies_old_password() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    // Wrong old password is rejected, nothing changes
    let response = client
        .put(format!("{}/users/me/password", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "old_password": "not-the-password",
            "new_password": "another-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let response = client
        .put(format!("{}/users/me/password", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "old_password": password,
            "new_password": "another-password"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // The old password no longer works, the new one does
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    login_token(&client, &email, "another-password").await;
}

#[tokio::test]
#[ignore]
async fn test_deactivation_revokes_the_live_session() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let response = client
        .put(format!("{}/users/activation", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "email": email, "action": "deactivate" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["is_active"], false);

    // The issued token was revoked with the account
    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);

    // And the inactive account cannot log back in
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_activation_forbidden_for_another_account() {
    let client = Client::new();
    let (email_a, _, password) = register_user(&client).await;
    let (email_b, _, _) = register_user(&client).await;
    let token = login_token(&client, &email_a, &password).await;

    let response = client
        .put(format!("{}/users/activation", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "email": email_b, "action": "deactivate" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_admin_access_requires_admin() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let response = client
        .put(format!("{}/users/{}/admin-access", BASE_URL, email))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "permission": "grant" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_admin_access_on_inactive_account() {
    let client = Client::new();
    let admin_token = login_token(&client, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (email, _, _) = register_user(&client).await;

    let response = client
        .put(format!("{}/users/activation", BASE_URL))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "email": email, "action": "deactivate" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    // Granting admin access to an inactive account is rejected
    let response = client
        .put(format!("{}/users/{}/admin-access", BASE_URL, email))
        .header("Authorization", format!("Bearer {}", admin_token))
        .json(&json!({ "permission": "GRANT" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 422);

    // The admin flag is untouched
    let response = client
        .get(format!("{}/users/by-email/{}", BASE_URL, email))
        .header("Authorization", format!("Bearer {}", admin_token))
        .send()
        .await
        .expect("Failed to send request");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["is_admin"], false);
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/books", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let (email, _, password) = register_user(&client).await;
    let token = login_token(&client, &email, &password).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}
