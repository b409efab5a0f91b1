pub mod auth;

use axum::routing::get;
use axum::Router;

use crate::state::SharedState;
use crate::views;

pub fn app_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(views::home::home))
        .route("/login", get(views::auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route(
            "/reauthenticate",
            get(views::auth::reauthenticate_page).post(auth::reauthenticate),
        )
        .route(
            "/forgot-password",
            get(views::auth::forgot_password_page).post(auth::forgot_password),
        )
        .route(
            "/reset-password/{token}",
            get(views::auth::reset_password_page).post(auth::reset_password),
        )
}
