use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use groundwork::auth::password;
use groundwork::config::Config;
use groundwork::db;
use groundwork::models::User;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Insert a user directly into the store.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        active: bool,
    ) -> User {
        let hash = password::hash(password).expect("hash failed");
        db::users::create(&self.pool, username, email, &hash, active)
            .await
            .expect("create user failed")
    }

    /// Fetch a form page and pull the CSRF token out of the hidden field.
    /// The matching cookie lands in the client's cookie store.
    pub async fn csrf_token(&self, path: &str) -> String {
        let body = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("csrf page request failed")
            .text()
            .await
            .expect("csrf page body failed");
        extract_between(&body, "name=\"csrf_token\" value=\"", "\"")
            .expect("no csrf token in page")
    }

    /// Submit the login form, returning the raw response.
    pub async fn login_raw(
        &self,
        identity: &str,
        password: &str,
        remember: bool,
        next: Option<&str>,
    ) -> reqwest::Response {
        let csrf = self.csrf_token("/login").await;
        let mut form = vec![
            ("identity", identity.to_string()),
            ("password", password.to_string()),
            ("csrf_token", csrf),
        ];
        if remember {
            form.push(("remember", "on".to_string()));
        }
        if let Some(next) = next {
            form.push(("next", next.to_string()));
        }
        self.client
            .post(self.url("/login"))
            .form(&form)
            .send()
            .await
            .expect("login request failed")
    }

    /// Log in and assert it succeeded.
    pub async fn login(&self, identity: &str, password: &str) {
        let resp = self.login_raw(identity, password, false, None).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "login did not redirect");
    }

    pub async fn logout(&self) {
        let resp = self
            .client
            .get(self.url("/logout"))
            .send()
            .await
            .expect("logout request failed");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    /// Submit the forgot-password form, returning the response body.
    pub async fn forgot_password(&self, email: &str) -> String {
        let csrf = self.csrf_token("/forgot-password").await;
        self.client
            .post(self.url("/forgot-password"))
            .form(&[("email", email), ("csrf_token", &csrf)])
            .send()
            .await
            .expect("forgot-password request failed")
            .text()
            .await
            .expect("forgot-password body failed")
    }

    /// Submit the reset-password form for the given raw token.
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        retype: &str,
    ) -> reqwest::Response {
        let csrf = self.csrf_token("/forgot-password").await;
        self.client
            .post(self.url(&format!("/reset-password/{token}")))
            .form(&[
                ("password", password),
                ("retype_password", retype),
                ("csrf_token", &csrf),
            ])
            .send()
            .await
            .expect("reset-password request failed")
    }

    /// Plant a live reset token for a user, as request_reset would.
    pub async fn plant_reset_token(&self, user_id: Uuid) -> String {
        let token = groundwork::auth::reset_token::generate();
        let hash = groundwork::auth::reset_token::hash(&token);
        let expires = chrono::Utc::now() + chrono::Duration::hours(24);
        let written = db::users::set_reset_token(&self.pool, user_id, &hash, expires)
            .await
            .expect("set reset token failed");
        assert!(written, "token not written, user inactive?");
        token
    }

    pub async fn expire_reset_token(&self, user_id: Uuid) {
        sqlx::query("UPDATE users SET reset_expiration = now() - interval '1 hour' WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .expect("expire token failed");
    }

    pub async fn reset_token_hash_of(&self, user_id: Uuid) -> Option<String> {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT reset_token_hash FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .expect("token lookup failed")
    }
}

pub fn extract_between(haystack: &str, start: &str, end: &str) -> Option<String> {
    let from = haystack.find(start)? + start.len();
    let to = haystack[from..].find(end)? + from;
    Some(haystack[from..to].to_string())
}

pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "groundwork_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        session_secret: "test-session-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost".to_string(),
        log_level: "warn".to_string(),
        smtp: None,
    };

    let app = groundwork::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        addr,
        pool,
        client,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
