use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A stored credential record.
///
/// `reset_token_hash` holds the SHA-256 of the opaque recovery token; the
/// raw token is never persisted. Both reset columns are null whenever no
/// recovery is in flight.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub reset_token_hash: Option<String>,
    pub reset_expiration: Option<DateTime<Utc>>,
    pub locale: String,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}
