use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

use crate::auth::extractor::CurrentUser;
use crate::auth::{reset_token, session};
use crate::csrf;
use crate::db;
use crate::error::AppError;
use crate::redirect::safe_next;
use crate::state::SharedState;
use crate::views::login_messages;

#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub identity: String,
    pub next: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub error: Option<String>,
    pub notice: Option<String>,
    pub email: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub error: Option<String>,
    pub token: String,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "auth/reauthenticate.html")]
pub struct ReauthenticateTemplate {
    pub error: Option<String>,
    pub next: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub msg: Option<String>,
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn login_page(
    State(state): State<SharedState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Response {
    // An already-authenticated visitor goes straight home.
    if let Some(cookie) = jar.get(session::SESSION_COOKIE) {
        if session::decode_token(cookie.value(), &state.config.session_secret).is_ok() {
            return Redirect::to("/").into_response();
        }
    }

    let (error, notice) = login_messages(query.msg.as_deref());
    let next = safe_next(query.next.as_deref(), &state.config.base_url).unwrap_or_default();

    let (jar, csrf_token) = csrf::issue(jar);
    let template = LoginTemplate {
        error,
        notice,
        identity: String::new(),
        next,
        csrf_token,
    };
    (jar, Html(template.render().unwrap_or_default())).into_response()
}

pub async fn forgot_password_page(jar: CookieJar) -> Response {
    // An authenticated visitor is signed out before recovery starts.
    let jar = if jar.get(session::SESSION_COOKIE).is_some() {
        jar.add(session::destroy())
    } else {
        jar
    };

    let (jar, csrf_token) = csrf::issue(jar);
    let template = ForgotPasswordTemplate {
        error: None,
        notice: None,
        email: String::new(),
        csrf_token,
    };
    (jar, Html(template.render().unwrap_or_default())).into_response()
}

pub async fn reset_password_page(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    // An authenticated visitor is signed out before recovery starts.
    let jar = if jar.get(session::SESSION_COOKIE).is_some() {
        jar.add(session::destroy())
    } else {
        jar
    };

    // Token must still be live before the form is shown at all.
    let user = db::users::find_by_valid_reset_token(&state.pool, &reset_token::hash(&token))
        .await?;

    if user.is_none() {
        return Ok((jar, Redirect::to("/login?msg=invalid_token")).into_response());
    }

    let (jar, csrf_token) = csrf::issue(jar);
    let template = ResetPasswordTemplate {
        error: None,
        token,
        csrf_token,
    };
    Ok((jar, Html(template.render().unwrap_or_default())).into_response())
}

pub async fn reauthenticate_page(
    State(state): State<SharedState>,
    _current: CurrentUser,
    Query(query): Query<NextQuery>,
    jar: CookieJar,
) -> Response {
    let next = safe_next(query.next.as_deref(), &state.config.base_url).unwrap_or_default();

    let (jar, csrf_token) = csrf::issue(jar);
    let template = ReauthenticateTemplate {
        error: None,
        next,
        csrf_token,
    };
    (jar, Html(template.render().unwrap_or_default())).into_response()
}
