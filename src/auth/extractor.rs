use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::session::{self, SESSION_COOKIE};
use crate::error::AppError;
use crate::state::SharedState;

/// The authenticated session, extracted from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: Uuid,
    /// Recently confirmed by a direct password check.
    pub fresh: bool,
    /// Session persists beyond the browser session (remember me).
    pub remember: bool,
}

impl FromRequestParts<SharedState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        let cookie = jar.get(SESSION_COOKIE).ok_or_else(|| {
            AppError::Unauthorized("Authentication required".to_string())
        })?;

        let claims = session::decode_token(cookie.value(), &state.config.session_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired session".to_string()))?;

        Ok(CurrentUser {
            user_id: claims.sub,
            fresh: claims.is_fresh(),
            remember: claims.rem,
        })
    }
}
