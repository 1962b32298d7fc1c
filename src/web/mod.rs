//! HTTP surface: router, session wiring, and authentication extractors

pub mod auth;
pub mod books;
pub mod flash;

use std::collections::HashMap;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use sha2::{Digest, Sha512};
use sqlx::{Pool, Sqlite};
use tower_http::trace::TraceLayer;
use tower_sessions::{
    cookie::{time::Duration, Key, SameSite},
    service::SignedCookie,
    Expiry, Session, SessionManagerLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use validator::ValidationErrors;

use crate::{
    config::ServerConfig,
    error::{AppError, AppResult},
    models::user::CurrentUser,
    AppState,
};

/// Session cookie name
pub const SESSION_COOKIE_NAME: &str = "estante_session";

/// Session expiry on inactivity
const SESSION_EXPIRY_DAYS: i64 = 7;

/// Session key under which the authenticated user snapshot is stored
const CURRENT_USER_KEY: &str = "current_user";

/// Create the application router with all routes
pub fn router(state: AppState, session_layer: SessionManagerLayer<SqliteStore, SignedCookie>) -> Router {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/livros", get(books::list_books))
        .route("/livros/novo", get(books::new_book_page).post(books::create_book))
        .route("/livros/editar/{id}", get(books::edit_book_page).post(books::update_book))
        .route("/livros/excluir/{id}", post(books::delete_book))
        .with_state(state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

/// Create the session layer backed by the application database.
///
/// The cookie is signed with a key derived from the configured secret, so a
/// forged session identifier is rejected before the store is consulted.
pub async fn session_layer(
    pool: &Pool<Sqlite>,
    config: &ServerConfig,
) -> AppResult<SessionManagerLayer<SqliteStore, SignedCookie>> {
    let store = SqliteStore::new(pool.clone());
    store.migrate().await?;

    let digest = Sha512::digest(config.secret_key.as_bytes());
    let key = Key::try_from(digest.as_slice())
        .map_err(|e| AppError::Internal(format!("Failed to derive session key: {}", e)))?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_secure(false)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}

/// Extractor that requires an authenticated user.
///
/// Unauthenticated requests are redirected to the login page.
pub struct AuthenticatedUser(pub CurrentUser);

/// Rejection for unauthenticated access to guarded pages
pub struct RedirectToLogin;

impl IntoResponse for RedirectToLogin {
    fn into_response(self) -> Response {
        Redirect::to("/login").into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = RedirectToLogin;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // The session is placed in extensions by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(RedirectToLogin)?;

        let user: CurrentUser = session
            .get(CURRENT_USER_KEY)
            .await
            .ok()
            .flatten()
            .ok_or(RedirectToLogin)?;

        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user without rejecting
/// anonymous requests.
pub struct OptionalUser(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(CURRENT_USER_KEY)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the authenticated user in the session (login)
pub async fn set_current_user(session: &Session, user: &CurrentUser) -> AppResult<()> {
    session.insert(CURRENT_USER_KEY, user).await?;
    Ok(())
}

/// Remove the authenticated user from the session (logout)
pub async fn clear_current_user(session: &Session) -> AppResult<()> {
    session.remove::<CurrentUser>(CURRENT_USER_KEY).await?;
    Ok(())
}

/// Per-field validation messages for inline display on a re-rendered form
#[derive(Debug, Default)]
pub struct FieldErrors(HashMap<String, Vec<String>>);

impl FieldErrors {
    /// Messages for one field; empty when the field validated cleanly
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl From<&ValidationErrors> for FieldErrors {
    fn from(errors: &ValidationErrors) -> Self {
        let mut map = HashMap::new();
        for (field, field_errors) in errors.field_errors() {
            let messages = field_errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            map.insert(field.to_string(), messages);
        }
        Self(map)
    }
}
