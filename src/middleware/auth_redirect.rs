use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

/// Middleware that turns 401 responses into a redirect to `/login` for
/// browser routes, carrying the original destination in `next`.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string());

    let response = next.run(req).await;

    if response.status() == StatusCode::UNAUTHORIZED {
        let location = match target.as_deref() {
            Some(t) if t != "/" && t != "/login" => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(t.as_bytes()).collect();
                format!("/login?next={encoded}")
            }
            _ => "/login".to_string(),
        };
        Redirect::to(&location).into_response()
    } else {
        response
    }
}
