pub mod auth;
pub mod home;

/// Map a redirect message code from the query string to user-facing text.
/// Unknown codes render nothing, so the query parameter cannot be used to
/// inject arbitrary content.
pub(crate) fn login_messages(code: Option<&str>) -> (Option<String>, Option<String>) {
    match code {
        Some("password_updated") => (
            None,
            Some("Password updated, you may now sign in".to_string()),
        ),
        Some("logged_out") => (None, Some("Signed out successfully".to_string())),
        Some("invalid_token") => (
            Some("Invalid password reset token provided".to_string()),
            None,
        ),
        _ => (None, None),
    }
}
