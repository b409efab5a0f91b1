use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

/// How long a session counts as "freshly confirmed" after a direct password
/// check (login or reauthentication). Sensitive actions gate on this window.
const FRESH_WINDOW_MINUTES: i64 = 10;

/// Lifetime of a non-remembered session token. The cookie itself expires
/// with the browser; this bounds how long a leaked token stays valid.
const SESSION_HOURS: i64 = 12;

/// Lifetime of a remembered session, cookie and token alike.
const REMEMBER_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    /// Unix timestamp until which the session counts as freshly confirmed.
    pub fsh: i64,
    /// Whether this session outlives the browser (remember me).
    pub rem: bool,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, remember: bool) -> Self {
        let now = Utc::now();
        let lifetime = if remember {
            Duration::days(REMEMBER_DAYS)
        } else {
            Duration::hours(SESSION_HOURS)
        };

        Self {
            sub: user_id,
            fsh: (now + Duration::minutes(FRESH_WINDOW_MINUTES)).timestamp(),
            rem: remember,
            exp: (now + lifetime).timestamp(),
        }
    }

    pub fn is_fresh(&self) -> bool {
        Utc::now().timestamp() <= self.fsh
    }
}

pub fn encode_token(claims: &Claims, secret: &str) -> Result<String, String> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| format!("Session encode failed: {e}"))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| format!("Session decode failed: {e}"))
}

/// Build the session cookie. Remembered sessions get an explicit max-age;
/// otherwise the cookie lives until the browser closes.
pub fn establish(claims: &Claims, secret: &str, secure: bool) -> Result<Cookie<'static>, String> {
    let token = encode_token(claims, secret)?;

    let mut builder = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    if claims.rem {
        builder = builder.max_age(time::Duration::days(REMEMBER_DAYS));
    }

    Ok(builder.build())
}

/// Expired replacement cookie. Destroying an absent session is a no-op.
pub fn destroy() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}
