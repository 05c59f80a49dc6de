use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{password::verify_password, roles::Role},
    users::repo::User,
};

/// Minimal identity handed to the session issuer after a successful
/// credential check. Never carries the password hash.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
        }
    }
}

/// Credential check against the stored record. Unknown email, wrong
/// password, and an unusable stored hash all yield `Ok(None)` so the caller
/// cannot tell which branch was taken.
pub async fn verify_credentials(
    db: &PgPool,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<Identity>> {
    let user = match User::find_by_email(db, email).await? {
        Some(u) => u,
        None => {
            warn!("sign-in with unknown email");
            return Ok(None);
        }
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = %user.id, "sign-in with invalid password");
        return Ok(None);
    }

    Ok(Some(user.into()))
}
