use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use subtle::ConstantTimeEq;

use crate::error::AppError;

pub const CSRF_COOKIE: &str = "csrf_token";

/// Double-submit cookie: form pages embed the token as a hidden field and
/// every state-mutating POST must echo the cookie value back in that field.
///
/// Returns the (possibly updated) jar together with the token to embed.
/// An existing cookie is reused so repeated page loads stay comparable.
pub fn issue(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(CSRF_COOKIE) {
        let token = cookie.value().to_string();
        if token.len() == 64 && token.chars().all(|c| c.is_ascii_hexdigit()) {
            return (jar, token);
        }
    }

    let bytes: [u8; 32] = rand::random();
    let token = hex::encode(bytes);

    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (jar.add(cookie), token)
}

/// Constant-time comparison of the submitted field against the cookie.
pub fn verify(jar: &CookieJar, submitted: &str) -> Result<(), AppError> {
    let cookie = jar
        .get(CSRF_COOKIE)
        .ok_or_else(|| AppError::Forbidden("Missing CSRF token".to_string()))?;

    let expected = cookie.value().as_bytes();
    let got = submitted.as_bytes();

    if expected.len() == got.len() && bool::from(expected.ct_eq(got)) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Invalid CSRF token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let (jar, token) = issue(CookieJar::new());
        assert!(verify(&jar, &token).is_ok());
    }

    #[test]
    fn wrong_token_rejected() {
        let (jar, _) = issue(CookieJar::new());
        assert!(verify(&jar, "not-the-token").is_err());
    }

    #[test]
    fn missing_cookie_rejected() {
        assert!(verify(&CookieJar::new(), "anything").is_err());
    }

    #[test]
    fn existing_cookie_is_reused() {
        let (jar, first) = issue(CookieJar::new());
        let (_, second) = issue(jar);
        assert_eq!(first, second);
    }
}
