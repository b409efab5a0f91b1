use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;

use crate::auth::extractor::CurrentUser;
use crate::auth::session;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: String,
    pub email: String,
    pub locale: String,
    pub timezone: String,
    pub roles: Vec<String>,
    pub fresh: bool,
}

pub async fn home(
    State(state): State<SharedState>,
    current: CurrentUser,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let Some(user) = db::users::find_by_id(&state.pool, current.user_id).await? else {
        // Session references a user that no longer exists.
        let jar = jar.add(session::destroy());
        return Ok((jar, Redirect::to("/login")).into_response());
    };

    let roles = db::roles::names_for_user(&state.pool, user.id).await?;

    let template = HomeTemplate {
        username: user.username,
        email: user.email,
        locale: user.locale,
        timezone: user.timezone,
        roles,
        fresh: current.fresh,
    };
    Ok(Html(template.render().unwrap_or_default()).into_response())
}
