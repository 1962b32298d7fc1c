//! End-to-end tests over the full HTTP surface.
//!
//! Each test builds the real router on an in-memory database and drives it
//! in-process, carrying the session cookie between requests like a browser.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

use estante_server::{
    config::AppConfig,
    models::book::BookForm,
    repository::{self, Repository},
    services::Services,
    web, AppState,
};

async fn test_app(admin_emails: &[&str]) -> (Router, Repository) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    repository::ensure_schema(&pool)
        .await
        .expect("Failed to create schema");

    let mut config = AppConfig::default();
    config.users.admin_emails = admin_emails.iter().map(|e| e.to_string()).collect();

    let session_layer = web::session_layer(&pool, &config.server)
        .await
        .expect("Failed to build session layer");

    let repository = Repository::new(pool);
    let services = Services::new(repository.clone(), config.users.clone());
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    (web::router(state, session_layer), repository)
}

async fn get(app: &Router, path: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::empty()).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

async fn post_form(
    app: &Router,
    path: &str,
    cookie: Option<&str>,
    fields: &[(&str, &str)],
) -> Response<Body> {
    let body = serde_urlencoded::to_string(fields).unwrap();
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = builder.body(Body::from(body)).unwrap();
    app.clone().oneshot(request).await.unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("expected a redirect Location header")
        .to_str()
        .unwrap()
}

fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("expected a Set-Cookie header")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn register_user(app: &Router, name: &str, email: &str, password: &str) {
    let response = post_form(
        app,
        "/register",
        None,
        &[
            ("name", name),
            ("email", email),
            ("password", password),
            ("confirm", password),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

async fn login_user(app: &Router, email: &str, password: &str) -> String {
    let response = post_form(app, "/login", None, &[("email", email), ("password", password)]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/livros");
    session_cookie(&response)
}

async fn book_count(repository: &Repository) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM books")
        .fetch_one(&repository.pool)
        .await
        .unwrap()
}

fn sample_book(title: &str) -> BookForm {
    BookForm {
        title: title.to_string(),
        author: Some("Machado de Assis".to_string()),
        year: Some(1881),
        description: Some("Memoirs, posthumously narrated.".to_string()),
    }
}

#[tokio::test]
async fn landing_page_is_public() {
    let (app, _) = test_app(&[]).await;

    let response = get(&app, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Estante"));
}

#[tokio::test]
async fn guarded_routes_redirect_anonymous_users() {
    let (app, _) = test_app(&[]).await;

    for path in ["/livros", "/livros/novo", "/logout"] {
        let response = get(&app, path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "path {}", path);
        assert_eq!(location(&response), "/login");
    }
}

#[tokio::test]
async fn registration_stores_hashed_credential() {
    let (app, repository) = test_app(&[]).await;

    register_user(&app, "Ana", "ana@example.com", "secret1").await;

    let user = repository
        .users
        .get_by_email("ana@example.com")
        .await
        .unwrap()
        .expect("user should exist after registration");
    assert_ne!(user.password_hash, "secret1");
    assert!(user.password_hash.starts_with("$argon2"));
    assert!(!user.is_admin);
}

#[tokio::test]
async fn duplicate_registration_creates_no_second_row() {
    let (app, repository) = test_app(&[]).await;

    register_user(&app, "Ana", "ana@example.com", "secret1").await;

    let response = post_form(
        &app,
        "/register",
        None,
        &[
            ("name", "Impostor"),
            ("email", "ana@example.com"),
            ("password", "other-secret"),
            ("confirm", "other-secret"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'ana@example.com'")
        .fetch_one(&repository.pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn invalid_registration_rerenders_with_field_errors() {
    let (app, repository) = test_app(&[]).await;

    let response = post_form(
        &app,
        "/register",
        None,
        &[
            ("name", "Ana"),
            ("email", "ana@example.com"),
            ("password", "secret1"),
            ("confirm", "different"),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Passwords do not match"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&repository.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn login_grants_access_to_book_list() {
    let (app, _) = test_app(&[]).await;

    register_user(&app, "Ana", "ana@example.com", "secret1").await;
    let cookie = login_user(&app, "ana@example.com", "secret1").await;

    let response = get(&app, "/livros", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("Logged in successfully."));
    assert!(body.contains("No books in the catalog yet."));
}

#[tokio::test]
async fn failed_logins_share_a_generic_message() {
    let (app, _) = test_app(&[]).await;

    register_user(&app, "Ana", "ana@example.com", "secret1").await;

    let wrong_password = post_form(
        &app,
        "/login",
        None,
        &[("email", "ana@example.com"), ("password", "nope")],
    )
    .await;
    let unknown_email = post_form(
        &app,
        "/login",
        None,
        &[("email", "ghost@example.com"), ("password", "secret1")],
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::OK);
    assert_eq!(unknown_email.status(), StatusCode::OK);

    let wrong_password = body_string(wrong_password).await;
    let unknown_email = body_string(unknown_email).await;
    assert!(wrong_password.contains("Incorrect email or password"));
    assert!(unknown_email.contains("Incorrect email or password"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let (app, _) = test_app(&[]).await;

    register_user(&app, "Ana", "ana@example.com", "secret1").await;
    let cookie = login_user(&app, "ana@example.com", "secret1").await;

    let response = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = get(&app, "/livros", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn non_admin_mutations_never_write() {
    let (app, repository) = test_app(&[]).await;
    let seeded = repository.books.create(&sample_book("Untouchable")).await.unwrap();

    register_user(&app, "Ana", "ana@example.com", "secret1").await;
    let cookie = login_user(&app, "ana@example.com", "secret1").await;

    let create = post_form(
        &app,
        "/livros/novo",
        Some(&cookie),
        &[("title", "Forbidden"), ("author", ""), ("year", ""), ("description", "")],
    )
    .await;
    assert_eq!(create.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&create), "/livros");

    let edit_path = format!("/livros/editar/{}", seeded.id);
    let edit = post_form(
        &app,
        &edit_path,
        Some(&cookie),
        &[("title", "Defaced"), ("author", ""), ("year", ""), ("description", "")],
    )
    .await;
    assert_eq!(edit.status(), StatusCode::SEE_OTHER);

    let delete_path = format!("/livros/excluir/{}", seeded.id);
    let delete = post_form(&app, &delete_path, Some(&cookie), &[]).await;
    assert_eq!(delete.status(), StatusCode::SEE_OTHER);

    assert_eq!(book_count(&repository).await, 1);
    let book = repository.books.get_by_id(seeded.id).await.unwrap();
    assert_eq!(book.title, "Untouchable");
}

#[tokio::test]
async fn admin_can_create_books() {
    let (app, repository) = test_app(&["chief@example.com"]).await;

    register_user(&app, "Chief", "chief@example.com", "secret1").await;
    let cookie = login_user(&app, "chief@example.com", "secret1").await;

    let response = post_form(
        &app,
        "/livros/novo",
        Some(&cookie),
        &[
            ("title", "Dom Casmurro"),
            ("author", "Machado de Assis"),
            ("year", "1899"),
            ("description", ""),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/livros");
    assert_eq!(book_count(&repository).await, 1);

    let response = get(&app, "/livros", Some(&cookie)).await;
    let body = body_string(response).await;
    assert!(body.contains("Book added."));
    assert!(body.contains("Dom Casmurro"));
    assert!(body.contains("1899"));
}

#[tokio::test]
async fn edit_rewrites_row_in_place() {
    let (app, repository) = test_app(&["chief@example.com"]).await;
    let seeded = repository.books.create(&sample_book("Old Title")).await.unwrap();

    register_user(&app, "Chief", "chief@example.com", "secret1").await;
    let cookie = login_user(&app, "chief@example.com", "secret1").await;

    // Edit form is pre-populated from the existing record
    let edit_path = format!("/livros/editar/{}", seeded.id);
    let page = get(&app, &edit_path, Some(&cookie)).await;
    assert_eq!(page.status(), StatusCode::OK);
    let body = body_string(page).await;
    assert!(body.contains("Old Title"));
    assert!(body.contains("Machado de Assis"));

    let response = post_form(
        &app,
        &edit_path,
        Some(&cookie),
        &[
            ("title", "New Title"),
            ("author", "Machado de Assis"),
            ("year", "1881"),
            ("description", "Memoirs, posthumously narrated."),
        ],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert_eq!(book_count(&repository).await, 1);
    let book = repository.books.get_by_id(seeded.id).await.unwrap();
    assert_eq!(book.title, "New Title");
    assert_eq!(book.author.as_deref(), Some("Machado de Assis"));
    assert_eq!(book.year, Some(1881));
}

#[tokio::test]
async fn missing_book_yields_not_found() {
    let (app, repository) = test_app(&["chief@example.com"]).await;
    repository.books.create(&sample_book("Survivor")).await.unwrap();

    register_user(&app, "Chief", "chief@example.com", "secret1").await;
    let cookie = login_user(&app, "chief@example.com", "secret1").await;

    let response = get(&app, "/livros/editar/999", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_form(&app, "/livros/excluir/999", Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(book_count(&repository).await, 1);
}

#[tokio::test]
async fn admin_can_delete_books() {
    let (app, repository) = test_app(&["chief@example.com"]).await;
    let seeded = repository.books.create(&sample_book("Doomed")).await.unwrap();

    register_user(&app, "Chief", "chief@example.com", "secret1").await;
    let cookie = login_user(&app, "chief@example.com", "secret1").await;

    let delete_path = format!("/livros/excluir/{}", seeded.id);
    let response = post_form(&app, &delete_path, Some(&cookie), &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/livros");
    assert_eq!(book_count(&repository).await, 0);

    let response = get(&app, "/livros", Some(&cookie)).await;
    let body = body_string(response).await;
    assert!(body.contains("Book removed."));
}

#[tokio::test]
async fn non_admin_end_to_end_flow() {
    let (app, repository) = test_app(&[]).await;

    // Register a regular user and log in
    register_user(&app, "Ana", "ana@example.com", "secret1").await;
    let cookie = login_user(&app, "ana@example.com", "secret1").await;

    // The list is reachable and empty
    let response = get(&app, "/livros", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("No books in the catalog yet."));

    // A create attempt bounces with a danger notice and writes nothing
    let response = post_form(
        &app,
        "/livros/novo",
        Some(&cookie),
        &[("title", "Forbidden"), ("author", ""), ("year", ""), ("description", "")],
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/livros");

    let response = get(&app, "/livros", Some(&cookie)).await;
    let body = body_string(response).await;
    assert!(body.contains("Only administrators can add books."));
    assert_eq!(book_count(&repository).await, 0);
}
