//! Account route handlers: landing page, login, logout, registration

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use tower_sessions::Session;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{CurrentUser, LoginForm, RegisterForm},
    AppState,
};

use super::{
    clear_current_user,
    flash::{flash, take_flashes, FlashMessage},
    set_current_user,
    AuthenticatedUser, FieldErrors, OptionalUser,
};

/// Landing page template
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub flashes: Vec<FlashMessage>,
    pub current_user: Option<CurrentUser>,
}

/// Login page template
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub flashes: Vec<FlashMessage>,
    pub form: LoginForm,
    pub errors: FieldErrors,
}

/// Registration page template
#[derive(Template, WebTemplate)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub flashes: Vec<FlashMessage>,
    pub form: RegisterForm,
    pub errors: FieldErrors,
}

/// Display the landing page
pub async fn index(
    OptionalUser(current_user): OptionalUser,
    session: Session,
) -> AppResult<IndexTemplate> {
    Ok(IndexTemplate {
        flashes: take_flashes(&session).await?,
        current_user,
    })
}

/// Display the login page
pub async fn login_page(session: Session) -> AppResult<LoginTemplate> {
    Ok(LoginTemplate {
        flashes: take_flashes(&session).await?,
        form: LoginForm::default(),
        errors: FieldErrors::default(),
    })
}

/// Handle login form submission
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok(LoginTemplate {
            flashes: Vec::new(),
            errors: FieldErrors::from(&errors),
            form,
        }
        .into_response());
    }

    match state.services.users.authenticate(&form.email, &form.password).await {
        Ok(user) => {
            set_current_user(&session, &CurrentUser::from(&user)).await?;
            flash(&session, FlashMessage::success("Logged in successfully.")).await?;
            Ok(Redirect::to("/livros").into_response())
        }
        Err(AppError::Authentication(message)) => {
            tracing::debug!("Login failed for {}", form.email);
            Ok(LoginTemplate {
                flashes: vec![FlashMessage::danger(message)],
                form,
                errors: FieldErrors::default(),
            }
            .into_response())
        }
        Err(e) => Err(e),
    }
}

/// End the current session
pub async fn logout(
    AuthenticatedUser(_user): AuthenticatedUser,
    session: Session,
) -> AppResult<Response> {
    clear_current_user(&session).await?;
    flash(&session, FlashMessage::info("Logged out.")).await?;
    Ok(Redirect::to("/login").into_response())
}

/// Display the registration page
pub async fn register_page(session: Session) -> AppResult<RegisterTemplate> {
    Ok(RegisterTemplate {
        flashes: take_flashes(&session).await?,
        form: RegisterForm::default(),
        errors: FieldErrors::default(),
    })
}

/// Handle registration form submission
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok(RegisterTemplate {
            flashes: Vec::new(),
            errors: FieldErrors::from(&errors),
            form,
        }
        .into_response());
    }

    match state.services.users.register(&form).await {
        Ok(user) => {
            tracing::info!("Registered user {}", user.email);
            flash(&session, FlashMessage::success("Account created successfully.")).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(AppError::Conflict(_)) => {
            flash(&session, FlashMessage::warning("Email is already registered.")).await?;
            Ok(Redirect::to("/register").into_response())
        }
        Err(e) => Err(e),
    }
}
