use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::{AdminSession, Session},
        handlers::is_valid_email,
        password::hash_password,
        roles::Role,
    },
    error::ApiError,
    extract::Json,
    state::AppState,
    users::{
        dto::{
            CreateUserRequest, DeleteResponse, PublicUser, RecentUser, StatsResponse,
            ToggleStatusRequest, UpdateProfileRequest, UpdateUserRequest,
        },
        repo::{NewUser, User},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/admin/users/:id/toggle-status", patch(toggle_status))
        .route("/user/me", get(get_me).put(update_me))
}

/// Dashboard aggregates: counts plus the five newest accounts.
#[instrument(skip(state, _session))]
pub async fn stats(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<StatsResponse>, ApiError> {
    let (total, active) = User::count_by_activity(&state.db).await?;
    let recent = User::recent(&state.db, 5).await?;
    Ok(Json(StatsResponse {
        total_users: total,
        active_users: active,
        inactive_users: total - active,
        recent_users: recent.into_iter().map(RecentUser::from).collect(),
    }))
}

#[instrument(skip(state, _session))]
pub async fn list_users(
    State(state): State<AppState>,
    _session: AdminSession,
) -> Result<Json<Vec<PublicUser>>, ApiError> {
    let users = User::list_non_admin(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// Admin-initiated creation; unlike self-registration the role is
/// selectable and optional profile fields default to empty strings.
#[instrument(skip(state, session, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    session: AdminSession,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let (Some(email), Some(password), Some(full_name)) =
        (payload.email, payload.password, payload.full_name)
    else {
        return Err(ApiError::Validation(
            "Email, password, and full name are required".into(),
        ));
    };
    let email = email.trim().to_string();
    if email.is_empty() || password.is_empty() || full_name.trim().is_empty() {
        return Err(ApiError::Validation(
            "Email, password, and full name are required".into(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!("admin create with duplicate email");
        return Err(ApiError::Conflict(
            "User with this email already exists".into(),
        ));
    }

    let new = NewUser {
        email,
        password_hash: hash_password(&password)?,
        full_name,
        father_name: payload.father_name.unwrap_or_default(),
        educational_qualification: payload.educational_qualification.unwrap_or_default(),
        profession: payload.profession.unwrap_or_default(),
        village: payload.village.unwrap_or_default(),
        union_name: payload.union_name.unwrap_or_default(),
        upazila: payload.upazila.unwrap_or_default(),
        district: payload.district.unwrap_or_default(),
        election_seat_no: payload.election_seat_no.unwrap_or_default(),
        phone_number: payload.phone_number.unwrap_or_default(),
        favorite_party: payload.favorite_party.unwrap_or_default(),
        facebook_id: None,
        role: payload.role.unwrap_or(Role::User),
        is_active: payload.is_active.unwrap_or(true),
    };
    let user = User::create(&state.db, &new).await?;

    info!(user_id = %user.id, admin_id = %session.0.sub, "user created by admin");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, _session))]
pub async fn get_user(
    State(state): State<AppState>,
    _session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, session, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if User::find_by_id(&state.db, id).await?.is_none() {
        return Err(ApiError::not_found("User"));
    }

    let password_hash = match payload.password.as_deref() {
        Some(p) if !p.is_empty() => Some(hash_password(p)?),
        _ => None,
    };
    let update = payload.into_admin_update(password_hash);
    let user = User::admin_update(&state.db, id, &update).await?;

    info!(user_id = %id, admin_id = %session.0.sub, "user updated by admin");
    Ok(Json(user.into()))
}

#[instrument(skip(state, session))]
pub async fn delete_user(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if user.id == session.0.sub {
        warn!(admin_id = %session.0.sub, "admin attempted self-delete");
        return Err(ApiError::Validation(
            "Cannot delete your own account".into(),
        ));
    }

    // Check and delete are two statements with no transaction; a concurrent
    // request can race them. Known gap inherited from the original system.
    User::delete(&state.db, id).await?;

    info!(user_id = %id, admin_id = %session.0.sub, "user deleted");
    Ok(Json(DeleteResponse {
        message: "User deleted successfully".into(),
    }))
}

#[instrument(skip(state, session, payload))]
pub async fn toggle_status(
    State(state): State<AppState>,
    session: AdminSession,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleStatusRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let Some(is_active) = payload.is_active else {
        return Err(ApiError::Validation("isActive is required".into()));
    };

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;

    if user.id == session.0.sub && !is_active {
        warn!(admin_id = %session.0.sub, "admin attempted self-deactivate");
        return Err(ApiError::Validation(
            "Cannot deactivate your own account".into(),
        ));
    }

    let user = User::set_active(&state.db, id, is_active).await?;
    info!(user_id = %id, admin_id = %session.0.sub, is_active, "user status toggled");
    Ok(Json(user.into()))
}

/// Own profile, row derived from the session's subject id — never from a
/// caller-supplied id.
#[instrument(skip(state, session))]
pub async fn get_me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, session.0.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, session, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::update_profile(&state.db, session.0.sub, &payload.into()).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sqlx::PgPool;
    use time::{Duration, OffsetDateTime};

    use crate::auth::session::SessionClaims;
    use crate::config::{AppConfig, SessionConfig};
    use crate::users::repo::NewUser;

    fn test_state(pool: PgPool) -> AppState {
        AppState::from_parts(
            pool,
            Arc::new(AppConfig {
                database_url: String::new(),
                session: SessionConfig {
                    secret: "test-secret".into(),
                    issuer: "test-issuer".into(),
                    audience: "test-aud".into(),
                    ttl_minutes: 5,
                },
            }),
        )
    }

    fn admin_session(sub: Uuid) -> AdminSession {
        AdminSession(SessionClaims {
            sub,
            role: Role::Admin,
            iat: 0,
            exp: 0,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
        })
    }

    fn new_user(email: &str, role: Role, is_active: bool) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "$argon2id$placeholder".into(),
            full_name: "Test User".into(),
            father_name: String::new(),
            educational_qualification: String::new(),
            profession: String::new(),
            village: String::new(),
            union_name: String::new(),
            upazila: String::new(),
            district: String::new(),
            election_seat_no: String::new(),
            phone_number: String::new(),
            favorite_party: String::new(),
            facebook_id: None,
            role,
            is_active,
        }
    }

    #[sqlx::test]
    async fn self_delete_is_rejected_and_row_unchanged(pool: PgPool) {
        let admin = User::create(&pool, &new_user("admin@example.com", Role::Admin, true))
            .await
            .unwrap();

        let err = delete_user(
            State(test_state(pool.clone())),
            admin_session(admin.id),
            Path(admin.id),
        )
        .await
        .err()
        .expect("self-delete should be rejected");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let row = User::find_by_id(&pool, admin.id).await.unwrap();
        assert!(row.is_some(), "row must survive a rejected self-delete");
    }

    #[sqlx::test]
    async fn admin_can_delete_another_user(pool: PgPool) {
        let admin = User::create(&pool, &new_user("admin@example.com", Role::Admin, true))
            .await
            .unwrap();
        let target = User::create(&pool, &new_user("voter@example.com", Role::User, true))
            .await
            .unwrap();

        delete_user(
            State(test_state(pool.clone())),
            admin_session(admin.id),
            Path(target.id),
        )
        .await
        .expect("delete of another user should succeed");

        assert!(User::find_by_id(&pool, target.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn self_deactivate_is_rejected_and_row_unchanged(pool: PgPool) {
        let admin = User::create(&pool, &new_user("admin@example.com", Role::Admin, true))
            .await
            .unwrap();

        let err = toggle_status(
            State(test_state(pool.clone())),
            admin_session(admin.id),
            Path(admin.id),
            Json(ToggleStatusRequest {
                is_active: Some(false),
            }),
        )
        .await
        .err()
        .expect("self-deactivate should be rejected");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let row = User::find_by_id(&pool, admin.id).await.unwrap().unwrap();
        assert!(row.is_active, "row must stay active after a rejected toggle");
    }

    #[sqlx::test]
    async fn stats_reports_counts_and_recent_users_newest_first(pool: PgPool) {
        // 7 users at distinct creation times, 5 active and 2 inactive.
        let base = OffsetDateTime::now_utc() - Duration::minutes(10);
        for i in 0..7i64 {
            let email = format!("voter{i}@example.com");
            let user = User::create(&pool, &new_user(&email, Role::User, i < 5))
                .await
                .unwrap();
            sqlx::query("UPDATE users SET created_at = $2 WHERE id = $1")
                .bind(user.id)
                .bind(base + Duration::minutes(i))
                .execute(&pool)
                .await
                .unwrap();
        }

        let Json(stats) = stats(State(test_state(pool)), admin_session(Uuid::new_v4()))
            .await
            .expect("stats should succeed");

        assert_eq!(stats.total_users, 7);
        assert_eq!(stats.active_users, 5);
        assert_eq!(stats.inactive_users, 2);

        let emails: Vec<_> = stats.recent_users.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(
            emails,
            vec![
                "voter6@example.com",
                "voter5@example.com",
                "voter4@example.com",
                "voter3@example.com",
                "voter2@example.com",
            ],
        );
    }
}
