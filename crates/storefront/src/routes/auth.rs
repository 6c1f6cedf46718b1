//! Authentication route handlers.
//!
//! Handles registration, login, and logout. Login issues the signed access
//! token cookie and mirrors the identity into the session for display.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_access_token, clear_current_user, set_access_token, set_current_user};
use crate::routes::{MessageQuery, redirect_with_msg};
use crate::services::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub msg: Option<String>,
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub msg: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        msg: query.msg,
        error: query.error,
    }
}

/// Handle login form submission.
///
/// Admins land on the admin dashboard, everyone else on `/dashboard`.
/// Bad credentials re-render the form with 401, deactivated accounts with 403.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(
        state.pool(),
        state.token_keys(),
        state.config().admin.as_ref(),
    );

    let success = match auth.login(&form.username, &form.password).await {
        Ok(success) => success,
        Err(err @ (AuthError::InvalidCredentials | AuthError::AccountDisabled)) => {
            tracing::warn!(error = %err, "Login failed");
            let (status, message) = if matches!(err, AuthError::AccountDisabled) {
                (StatusCode::FORBIDDEN, "Your account has been deactivated")
            } else {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            };
            let page = LoginTemplate {
                msg: None,
                error: Some(message.to_string()),
            };
            return Ok((status, page).into_response());
        }
        Err(err) => return Err(err.into()),
    };

    // New identity, new session id
    session.cycle_id().await?;
    set_current_user(&session, &success.session_user).await?;
    set_sentry_user(&success.session_user.username);

    Ok((
        set_access_token(&success.token, state.secure_cookies()),
        Redirect::to(success.landing_page()),
    )
        .into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        msg: query.msg,
        error: query.error,
    }
}

/// Handle registration form submission.
///
/// Validation failures re-render the form with 400, taken usernames or
/// emails with 409.
#[instrument(skip_all, fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    let auth = AuthService::new(
        state.pool(),
        state.token_keys(),
        state.config().admin.as_ref(),
    );

    match auth.register(&form.username, &form.email, &form.password).await {
        Ok(_) => Ok(redirect_with_msg("/login", "Registration successful").into_response()),
        Err(
            err @ (AuthError::InvalidUsername(_)
            | AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::UserAlreadyExists),
        ) => {
            let status = if matches!(err, AuthError::UserAlreadyExists) {
                StatusCode::CONFLICT
            } else {
                StatusCode::BAD_REQUEST
            };
            let message = match &err {
                AuthError::UserAlreadyExists => "Username or email already registered".to_string(),
                other => capitalize(&other.to_string()),
            };
            let page = RegisterTemplate {
                msg: None,
                error: Some(message),
            };
            Ok((status, page).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Log out: drop the session and delete the token cookie.
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok((
        clear_access_token(state.secure_cookies()),
        redirect_with_msg("/login", "Successfully logged out"),
    )
        .into_response())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("invalid email: empty"), "Invalid email: empty");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_login_page_shows_message() {
        let html = LoginTemplate {
            msg: Some("Registration successful".to_string()),
            error: None,
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("Registration successful"));
    }

    #[test]
    fn test_register_page_shows_error() {
        let html = RegisterTemplate {
            msg: None,
            error: Some("Username or email already registered".to_string()),
        }
        .render()
        .unwrap_or_default();
        assert!(html.contains("Username or email already registered"));
    }
}
