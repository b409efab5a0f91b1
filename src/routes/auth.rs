use askama::Template;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::auth::extractor::CurrentUser;
use crate::auth::reset_token::{self, RESET_TOKEN_HOURS};
use crate::auth::session::{self, Claims};
use crate::auth::password;
use crate::csrf;
use crate::db;
use crate::error::AppError;
use crate::redirect::safe_next;
use crate::state::SharedState;
use crate::views::auth::{ForgotPasswordTemplate, LoginTemplate, ReauthenticateTemplate, ResetPasswordTemplate};

/// One message for every credential failure: unknown identity, wrong
/// password, inactive account. Distinguishing them would allow enumeration.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// One message whether or not the email is registered.
const RESET_REQUESTED: &str = "If the email is registered, a password reset link has been sent";

#[derive(Deserialize)]
pub struct LoginForm {
    pub identity: String,
    pub password: String,
    pub remember: Option<String>,
    pub next: Option<String>,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ReauthenticateForm {
    pub password: String,
    pub next: Option<String>,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
    pub csrf_token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordForm {
    pub password: String,
    pub retype_password: String,
    pub csrf_token: String,
}

fn render<T: Template>(jar: CookieJar, template: T) -> Response {
    (jar, Html(template.render().unwrap_or_default())).into_response()
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    csrf::verify(&jar, &form.csrf_token)?;

    let next = safe_next(form.next.as_deref(), &state.config.base_url).unwrap_or_default();
    let (jar, csrf_token) = csrf::issue(jar);

    let form_error = |jar: CookieJar, csrf_token: String, error: &str| {
        render(
            jar,
            LoginTemplate {
                error: Some(error.to_string()),
                notice: None,
                identity: form.identity.clone(),
                next: next.clone(),
                csrf_token,
            },
        )
    };

    if form.identity.is_empty() {
        return Ok(form_error(jar, csrf_token, "Identity is required"));
    }
    if form.password.is_empty() {
        return Ok(form_error(jar, csrf_token, "Password is required"));
    }

    if state.login_limiter.check(&form.identity).is_err() {
        return Ok(form_error(
            jar,
            csrf_token,
            "Too many failed attempts, please try again later",
        ));
    }

    let user = db::users::find_by_identity(&state.pool, &form.identity).await?;

    // Verify against a dummy hash when no user matched, keeping the timing
    // of the two failure paths comparable.
    let hash = user
        .as_ref()
        .map(|u| u.password_hash.as_str())
        .unwrap_or_else(|| password::dummy_hash());
    let valid = password::verify(&form.password, hash).map_err(AppError::Internal)?;

    let Some(user) = user.filter(|u| valid && u.is_active) else {
        state.login_limiter.record_failure(&form.identity);
        return Ok(form_error(jar, csrf_token, INVALID_CREDENTIALS));
    };

    let claims = Claims::new(user.id, form.remember.is_some());
    let cookie = session::establish(
        &claims,
        &state.config.session_secret,
        state.config.base_url.starts_with("https"),
    )
    .map_err(AppError::Internal)?;
    let jar = jar.add(cookie);

    tracing::info!(username = %user.username, "User logged in");

    let dest = if next.is_empty() { "/".to_string() } else { next };
    Ok((jar, Redirect::to(&dest)).into_response())
}

/// Destroys the session unconditionally; a visitor without one still ends up
/// at the login page.
pub async fn logout(jar: CookieJar) -> Response {
    let jar = jar.add(session::destroy());
    (jar, Redirect::to("/login?msg=logged_out")).into_response()
}

pub async fn reauthenticate(
    State(state): State<SharedState>,
    current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<ReauthenticateForm>,
) -> Result<Response, AppError> {
    csrf::verify(&jar, &form.csrf_token)?;

    let next = safe_next(form.next.as_deref(), &state.config.base_url).unwrap_or_default();
    let (jar, csrf_token) = csrf::issue(jar);

    let Some(user) = db::users::find_by_id(&state.pool, current.user_id).await? else {
        let jar = jar.add(session::destroy());
        return Ok((jar, Redirect::to("/login")).into_response());
    };

    let valid = password::verify(&form.password, &user.password_hash).map_err(AppError::Internal)?;

    if !valid || !user.is_active {
        return Ok(render(
            jar,
            ReauthenticateTemplate {
                error: Some(INVALID_CREDENTIALS.to_string()),
                next,
                csrf_token,
            },
        ));
    }

    // Re-issue the session with a renewed fresh-confirmation window.
    let claims = Claims::new(user.id, current.remember);
    let cookie = session::establish(
        &claims,
        &state.config.session_secret,
        state.config.base_url.starts_with("https"),
    )
    .map_err(AppError::Internal)?;
    let jar = jar.add(cookie);

    let dest = if next.is_empty() { "/".to_string() } else { next };
    Ok((jar, Redirect::to(&dest)).into_response())
}

/// Issue a reset token for an active account and email the link.
///
/// The rendered notice is identical whether or not the email is registered,
/// and identical again when the token write fails; every internal outcome is
/// only distinguishable in the logs. The email send is spawned after the
/// write commits and is never awaited by the request path.
pub async fn forgot_password(
    State(state): State<SharedState>,
    jar: CookieJar,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response, AppError> {
    csrf::verify(&jar, &form.csrf_token)?;

    // An authenticated visitor cannot request resets while signed in.
    let jar = if jar.get(session::SESSION_COOKIE).is_some() {
        jar.add(session::destroy())
    } else {
        jar
    };

    let (jar, csrf_token) = csrf::issue(jar);

    if form.email.is_empty() {
        return Ok(render(
            jar,
            ForgotPasswordTemplate {
                error: Some("Email is required".to_string()),
                notice: None,
                email: form.email,
                csrf_token,
            },
        ));
    }
    if !form.email.contains('@') {
        return Ok(render(
            jar,
            ForgotPasswordTemplate {
                error: Some("Invalid email".to_string()),
                notice: None,
                email: form.email,
                csrf_token,
            },
        ));
    }

    match db::users::find_active_by_email(&state.pool, &form.email).await {
        Ok(Some(user)) => {
            let token = reset_token::generate();
            let token_hash = reset_token::hash(&token);
            let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_HOURS);

            match db::users::set_reset_token(&state.pool, user.id, &token_hash, expires_at).await {
                Ok(true) => {
                    let reset_url = format!(
                        "{}/reset-password/{token}",
                        state.config.base_url.trim_end_matches('/')
                    );

                    if let Some(mailer) = state.mailer.clone() {
                        let email = user.email.clone();
                        tokio::spawn(async move {
                            if let Err(e) = mailer.send_password_reset(&email, &reset_url).await {
                                tracing::error!("Failed to send password reset email: {e}");
                            }
                        });
                    } else {
                        tracing::warn!(
                            username = %user.username,
                            "SMTP not configured, password reset link: {reset_url}"
                        );
                    }
                }
                Ok(false) => {
                    tracing::warn!(username = %user.username, "Reset token refused, account inactive");
                }
                Err(e) => {
                    tracing::error!(username = %user.username, "Failed to store reset token: {e}");
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("Reset lookup failed: {e}");
        }
    }

    Ok(render(
        jar,
        ForgotPasswordTemplate {
            error: None,
            notice: Some(RESET_REQUESTED.to_string()),
            email: form.email,
            csrf_token,
        },
    ))
}

/// Redeem a reset token and set a new password.
///
/// Token matching, expiry check, password swap and token clearing happen in
/// one conditional UPDATE, so a replayed or concurrently redeemed token
/// loses cleanly. The confirmation email is best effort; the password change
/// stands even if it fails.
pub async fn reset_password(
    State(state): State<SharedState>,
    Path(token): Path<String>,
    jar: CookieJar,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response, AppError> {
    csrf::verify(&jar, &form.csrf_token)?;

    // An authenticated visitor cannot reset passwords while signed in.
    let jar = if jar.get(session::SESSION_COOKIE).is_some() {
        jar.add(session::destroy())
    } else {
        jar
    };

    let (jar, csrf_token) = csrf::issue(jar);

    let form_error = |jar: CookieJar, csrf_token: String, error: &str| {
        render(
            jar,
            ResetPasswordTemplate {
                error: Some(error.to_string()),
                token: token.clone(),
                csrf_token,
            },
        )
    };

    // Checked before any store access.
    if form.password.is_empty() {
        return Ok(form_error(jar, csrf_token, "Password is required"));
    }
    if form.password != form.retype_password {
        return Ok(form_error(jar, csrf_token, "Passwords did not match"));
    }

    let new_hash = match password::hash(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("Password hashing failed: {e}");
            return Ok(form_error(
                jar,
                csrf_token,
                "Error updating password, contact an administrator",
            ));
        }
    };

    match db::users::consume_reset_token(&state.pool, &reset_token::hash(&token), &new_hash).await {
        Ok(Some(user)) => {
            tracing::info!(username = %user.username, "Password reset completed");

            if let Some(mailer) = state.mailer.clone() {
                let email = user.email.clone();
                tokio::spawn(async move {
                    if let Err(e) = mailer.send_password_changed(&email).await {
                        tracing::error!("Failed to send password change notification: {e}");
                    }
                });
            }

            Ok((jar, Redirect::to("/login?msg=password_updated")).into_response())
        }
        Ok(None) => Ok((jar, Redirect::to("/login?msg=invalid_token")).into_response()),
        Err(e) => {
            // The failed statement is the one that clears the token, so the
            // token is still live and the user may retry.
            tracing::error!("Failed to reset password: {e}");
            Ok(form_error(
                jar,
                csrf_token,
                "Error updating password, contact an administrator",
            ))
        }
    }
}
