use axum::{
    extract::{FromRef, State},
    routing::post,
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        credentials::verify_credentials,
        dto::{AuthResponse, LoginRequest, OauthRequest, RegisterRequest, RegisterResponse, SessionUser},
        password::hash_password,
        roles::Role,
        session::{removal_cookie, SessionKeys},
    },
    error::ApiError,
    extract::Json,
    state::AppState,
    users::repo::{NewUser, User},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/oauth", post(oauth))
        .route("/auth/logout", post(logout))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Self-registration. Every profile field is mandatory and the role is
/// always forced to `user`.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    if !payload.has_all_required_fields() {
        warn!("register with missing fields");
        return Err(ApiError::Validation("All fields are required.".into()));
    }
    let email = payload.email.as_deref().unwrap_or_default().trim().to_string();
    let password = payload.password.unwrap_or_default();

    if !is_valid_email(&email) {
        warn!("register with invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if password.len() < 8 {
        warn!("register with short password");
        return Err(ApiError::Validation("Password too short".into()));
    }

    if User::find_by_email(&state.db, &email).await?.is_some() {
        warn!("register with duplicate email");
        return Err(ApiError::Conflict("Email already registered.".into()));
    }

    let new = NewUser {
        email,
        password_hash: hash_password(&password)?,
        full_name: payload.full_name.unwrap_or_default(),
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
        facebook_id: payload.facebook_id,
        role: Role::User,
        is_active: true,
    };
    let user = User::create(&state.db, &new).await?;

    info!(user_id = %user.id, "user registered");
    Ok(Json(RegisterResponse {
        success: true,
        user: SessionUser {
            id: user.id,
            email: user.email,
            name: user.full_name,
            role: user.role,
        },
    }))
}

/// Credential sign-in. The failure signal is identical for unknown email and
/// wrong password.
#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let identity = verify_credentials(&state.db, payload.email.trim(), &payload.password)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(identity.id, identity.role)?;
    let jar = jar.add(keys.session_cookie(token));

    info!(user_id = %identity.id, "user signed in");
    Ok((
        jar,
        Json(AuthResponse {
            user: SessionUser {
                id: identity.id,
                email: identity.email,
                name: identity.full_name,
                role: identity.role,
            },
        }),
    ))
}

/// Sign-in from a trusted external identity assertion. The asserted profile
/// is taken as-is; a first-time identity gets a `user`-role row with an
/// unusable password, so credential sign-in for it always fails closed.
#[instrument(skip(state, jar, payload))]
pub async fn oauth(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<OauthRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), ApiError> {
    let email = payload.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(u) => u,
        None => {
            let new = NewUser {
                email,
                password_hash: String::new(),
                full_name: payload.name,
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
                facebook_id: Some(payload.external_id),
                role: Role::User,
                is_active: true,
            };
            let user = User::create(&state.db, &new).await?;
            info!(user_id = %user.id, "user created from external identity");
            user
        }
    };

    let keys = SessionKeys::from_ref(&state);
    let token = keys.sign(user.id, user.role)?;
    let jar = jar.add(keys.session_cookie(token));

    info!(user_id = %user.id, "external identity signed in");
    Ok((
        jar,
        Json(AuthResponse {
            user: SessionUser {
                id: user.id,
                email: user.email,
                name: user.full_name,
                role: user.role,
            },
        }),
    ))
}

#[instrument(skip(jar))]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.remove(removal_cookie()),
        Json(serde_json::json!({ "success": true })),
    )
}
