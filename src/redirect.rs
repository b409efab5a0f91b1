use url::Url;

/// Validate a caller-supplied post-login destination.
///
/// The target is resolved against the application's own base URL and is
/// honored only when the result stays on the same scheme and host. Foreign
/// absolute URLs, protocol-relative targets and non-http schemes are all
/// refused, which closes the open-redirect hole. Accepted targets come back
/// normalized to a same-origin path (plus query).
pub fn safe_next(target: Option<&str>, base_url: &str) -> Option<String> {
    let target = target?.trim();
    if target.is_empty() {
        return None;
    }

    let base = Url::parse(base_url).ok()?;
    let joined = base.join(target).ok()?;

    if !matches!(joined.scheme(), "http" | "https") {
        return None;
    }

    if joined.host_str() != base.host_str()
        || joined.port_or_known_default() != base.port_or_known_default()
    {
        return None;
    }

    let mut path = joined.path().to_string();
    if let Some(query) = joined.query() {
        path.push('?');
        path.push_str(query);
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://app.example.com";

    #[test]
    fn relative_path_is_honored() {
        assert_eq!(safe_next(Some("/dashboard"), BASE), Some("/dashboard".to_string()));
        assert_eq!(
            safe_next(Some("/reports?year=2026"), BASE),
            Some("/reports?year=2026".to_string())
        );
    }

    #[test]
    fn same_origin_absolute_is_honored() {
        assert_eq!(
            safe_next(Some("https://app.example.com/settings"), BASE),
            Some("/settings".to_string())
        );
    }

    #[test]
    fn foreign_origin_is_refused() {
        assert_eq!(safe_next(Some("https://evil.example/"), BASE), None);
        assert_eq!(safe_next(Some("http://app.example.com.evil.example/x"), BASE), None);
    }

    #[test]
    fn protocol_relative_is_refused() {
        assert_eq!(safe_next(Some("//evil.example/x"), BASE), None);
    }

    #[test]
    fn non_http_scheme_is_refused() {
        assert_eq!(safe_next(Some("javascript:alert(1)"), BASE), None);
    }

    #[test]
    fn different_port_is_refused() {
        assert_eq!(safe_next(Some("https://app.example.com:8443/x"), BASE), None);
    }

    #[test]
    fn empty_and_missing_are_refused() {
        assert_eq!(safe_next(Some(""), BASE), None);
        assert_eq!(safe_next(Some("   "), BASE), None);
        assert_eq!(safe_next(None, BASE), None);
    }
}
