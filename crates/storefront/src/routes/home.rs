//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tower_sessions::Session;

use crate::filters;
use crate::middleware::current_user;
use crate::models::SessionUser;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub current_user: Option<SessionUser>,
}

/// Display the home page, greeting the session's user when there is one.
pub async fn home(session: Session) -> impl IntoResponse {
    HomeTemplate {
        current_user: current_user(&session).await,
    }
}
