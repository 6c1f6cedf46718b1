//! Authentication extractors and the `access_token` cookie.
//!
//! Identity comes only from the signed token in the `access_token` cookie.
//! The session's [`SessionUser`] is a display mirror and never authorizes
//! anything.
//!
//! | Extractor | Missing/invalid token | Other rejections |
//! |---|---|---|
//! | [`RequireUser`] | 401 | 401 unknown user, 403 deactivated |
//! | [`OptionalUser`] | `None` | `None` |
//! | [`RequireAdmin`] | redirect to login | 403 non-admin |
//! | [`RequireAdminApi`] | 401 | 403 non-admin |

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{
        HeaderMap, HeaderName, StatusCode,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};
use tracing::debug;

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::models::{SessionUser, User, session_keys};
use crate::services::auth::token::TOKEN_TTL_HOURS;
use crate::services::{Claims, TokenError, TokenKeys};
use crate::state::AppState;

/// Cookie carrying the signed access token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Where admin pages send anonymous visitors.
pub const ADMIN_LOGIN_REDIRECT: &str = "/login?msg=Admin%20login%20required";

// =============================================================================
// Cookie helpers
// =============================================================================

/// Read the access token from the request's `Cookie` headers.
#[must_use]
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == ACCESS_TOKEN_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// `Set-Cookie` header storing `token` for the token's lifetime.
#[must_use]
pub fn set_access_token(token: &str, secure: bool) -> [(HeaderName, String); 1] {
    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.to_string()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .max_age(Duration::hours(TOKEN_TTL_HOURS))
        .build();

    [(SET_COOKIE, cookie.to_string())]
}

/// `Set-Cookie` header deleting the access token.
#[must_use]
pub fn clear_access_token(secure: bool) -> [(HeaderName, String); 1] {
    let mut cookie = Cookie::build((ACCESS_TOKEN_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .build();
    cookie.make_removal();

    [(SET_COOKIE, cookie.to_string())]
}

fn verify_request(headers: &HeaderMap, keys: &TokenKeys) -> Result<Claims, AppError> {
    let token = access_token_from_headers(headers)
        .ok_or_else(|| AppError::Unauthorized("Token missing".to_string()))?;

    keys.verify(&token).map_err(|err| {
        debug!(error = %err, "Rejected access token");
        let message = match err {
            TokenError::Expired => "Token expired",
            _ => "Invalid token",
        };
        AppError::Unauthorized(message.to_string())
    })
}

// =============================================================================
// Extractors
// =============================================================================

/// Extractor for the active account named by the token.
///
/// Rejects with 401 when the account no longer exists and 403 when it has
/// been deactivated since the token was issued.
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verify_request(&parts.headers, state.token_keys())?;
        let user = load_user(state, &claims).await?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        set_sentry_user(user.username.as_str());
        Ok(Self(user))
    }
}

/// Extractor for the caller's account when there is one.
///
/// Anonymous, invalid, unknown, and deactivated callers all yield `None`.
/// Only a failing database lookup rejects the request.
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Ok(claims) = verify_request(&parts.headers, state.token_keys()) else {
            return Ok(Self(None));
        };

        match load_user(state, &claims).await {
            Ok(user) if user.is_active => Ok(Self(Some(user))),
            Ok(_) | Err(AppError::Unauthorized(_)) => Ok(Self(None)),
            Err(err) => Err(err),
        }
    }
}

async fn load_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    UserRepository::new(state.pool())
        .get_by_username(&claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))
}

/// Rejection for admin pages.
#[derive(Debug)]
pub enum AdminRejection {
    /// No usable token: send the browser to the login page.
    RedirectToLogin,
    /// Logged in without the admin role.
    Forbidden,
}

impl IntoResponse for AdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to(ADMIN_LOGIN_REDIRECT).into_response(),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Admin access required").into_response(),
        }
    }
}

/// Extractor for admin HTML pages and form posts.
pub struct RequireAdmin(pub Claims);

impl<S> FromRequestParts<S> for RequireAdmin
where
    TokenKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        let claims =
            verify_request(&parts.headers, &keys).map_err(|_| AdminRejection::RedirectToLogin)?;

        if !claims.is_admin() {
            return Err(AdminRejection::Forbidden);
        }
        Ok(Self(claims))
    }
}

/// Extractor for admin JSON endpoints.
pub struct RequireAdminApi(pub Claims);

impl<S> FromRequestParts<S> for RequireAdminApi
where
    TokenKeys: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = TokenKeys::from_ref(state);
        let claims = verify_request(&parts.headers, &keys)?;

        if !claims.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        Ok(Self(claims))
    }
}

// =============================================================================
// Session mirror
// =============================================================================

/// Store the display copy of the logged-in identity.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Read the display copy of the logged-in identity.
pub async fn current_user(session: &Session) -> Option<SessionUser> {
    session
        .get::<SessionUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Drop all session state (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, Request, header::LOCATION};
    use bazaar_core::UserRole;
    use chrono::Utc;
    use secrecy::SecretString;

    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("k7Hq2mZp9XvL4wTn8RbY3cJf6GdS1aEu"))
    }

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/admin/dashboard");
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, cookie);
        }
        builder.body(()).unwrap().into_parts().0
    }

    fn token_cookie(role: UserRole) -> String {
        let token = keys().issue("jane_doe", role).unwrap();
        format!("theme=dark; {ACCESS_TOKEN_COOKIE}={token}")
    }

    #[test]
    fn test_access_token_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("a=1; b=2"));
        headers.append(COOKIE, HeaderValue::from_static("access_token=abc.def.ghi"));
        assert_eq!(
            access_token_from_headers(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn test_empty_access_token_is_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(access_token_from_headers(&headers), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let [(name, value)] = set_access_token("abc.def.ghi", true);
        assert_eq!(name, SET_COOKIE);
        assert!(value.starts_with("access_token=abc.def.ghi"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Secure"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=86400"));

        let [(_, insecure)] = set_access_token("abc.def.ghi", false);
        assert!(!insecure.contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let [(_, value)] = clear_access_token(false);
        assert!(value.starts_with("access_token=;"));
        assert!(value.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_require_admin_api_accepts_admin_claims() {
        let mut parts = parts_with_cookie(Some(&token_cookie(UserRole::Admin)));
        let RequireAdminApi(claims) = RequireAdminApi::from_request_parts(&mut parts, &keys())
            .await
            .unwrap();
        assert_eq!(claims.sub, "jane_doe");
    }

    #[tokio::test]
    async fn test_require_admin_api_rejects_tampered_token() {
        let token = keys().issue("jane_doe", UserRole::Admin).unwrap();
        let tampered = format!("{ACCESS_TOKEN_COOKIE}={token}x");
        let mut parts = parts_with_cookie(Some(&tampered));

        let err = RequireAdminApi::from_request_parts(&mut parts, &keys())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_require_admin_api_rejects_expired_token() {
        let issued = Utc::now() - chrono::Duration::days(2);
        let token = keys()
            .issue_at("jane_doe", UserRole::Admin, issued)
            .unwrap();
        let mut parts = parts_with_cookie(Some(&format!("{ACCESS_TOKEN_COOKIE}={token}")));

        let err = RequireAdminApi::from_request_parts(&mut parts, &keys())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Unauthorized(ref msg) if msg == "Token expired"));
    }

    #[tokio::test]
    async fn test_require_admin_redirects_anonymous() {
        let mut parts = parts_with_cookie(None);
        let rejection = RequireAdmin::from_request_parts(&mut parts, &keys())
            .await
            .err()
            .unwrap();

        let response = rejection.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            ADMIN_LOGIN_REDIRECT
        );
    }

    #[tokio::test]
    async fn test_require_admin_forbids_regular_user() {
        let mut parts = parts_with_cookie(Some(&token_cookie(UserRole::User)));
        let rejection = RequireAdmin::from_request_parts(&mut parts, &keys())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_require_admin_accepts_admin() {
        let mut parts = parts_with_cookie(Some(&token_cookie(UserRole::Admin)));
        let RequireAdmin(claims) = RequireAdmin::from_request_parts(&mut parts, &keys())
            .await
            .unwrap();
        assert!(claims.is_admin());
    }

    #[tokio::test]
    async fn test_require_admin_api_statuses() {
        let mut anonymous = parts_with_cookie(None);
        let err = RequireAdminApi::from_request_parts(&mut anonymous, &keys())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);

        let mut user = parts_with_cookie(Some(&token_cookie(UserRole::User)));
        let err = RequireAdminApi::from_request_parts(&mut user, &keys())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);

        let mut admin = parts_with_cookie(Some(&token_cookie(UserRole::Admin)));
        assert!(
            RequireAdminApi::from_request_parts(&mut admin, &keys())
                .await
                .is_ok()
        );
    }
}
