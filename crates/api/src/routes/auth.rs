//! Shared-password login and logout.

use axum::{
    Form, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::{SignedCookieJar, cookie::Cookie};
use chrono::Utc;
use imagegate_shared::AppError;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::ApiError,
    middleware::session::{LOGIN_PATH, SESSION_COOKIE},
};

/// Login form fields.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// The shared password.
    #[serde(default)]
    pub password: String,
}

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_page).post(login))
        .route("/logout", post(logout))
}

fn render_login(message: Option<&str>) -> Html<String> {
    let notice = message
        .map(|m| format!(r#"<p class="error">{m}</p>"#))
        .unwrap_or_default();
    Html(format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>imagegate - login</title></head>
<body>
<h1>Sign in</h1>
{notice}
<form method="post" action="{LOGIN_PATH}">
<input type="password" name="password" autofocus required>
<button type="submit">Sign in</button>
</form>
</body>
</html>
"#
    ))
}

/// GET /login - the login form.
async fn login_page() -> Html<String> {
    render_login(None)
}

/// POST /login - check the password and start a session.
async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    match state.password.verify(&form.password) {
        Ok(true) => {
            info!("Login succeeded");
            let jar = jar.add(state.session.issue(Utc::now()));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Ok(false) => {
            warn!("Login failed: wrong password");
            Ok((StatusCode::UNAUTHORIZED, render_login(Some("Invalid password"))).into_response())
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            Err(AppError::Internal("could not verify password".to_string()).into())
        }
    }
}

/// POST /logout - end the session.
async fn logout(jar: SignedCookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(LOGIN_PATH))
}
