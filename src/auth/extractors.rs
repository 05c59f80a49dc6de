use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::warn;

use crate::{
    auth::{
        roles::Role,
        session::{SessionClaims, SessionKeys, SESSION_COOKIE},
    },
    error::ApiError,
};

/// Any valid session. Denies with a uniform 401 before the handler body
/// runs when the cookie is absent, expired, or fails verification.
pub struct Session(pub SessionClaims);

/// Valid session with the admin role. Uniform 401 for no session, uniform
/// 403 for a non-admin session.
pub struct AdminSession(pub SessionClaims);

fn claims_from_parts<S>(parts: &Parts, state: &S) -> Result<SessionClaims, ApiError>
where
    SessionKeys: FromRef<S>,
{
    let keys = SessionKeys::from_ref(state);
    let jar = CookieJar::from_headers(&parts.headers);
    let cookie = jar.get(SESSION_COOKIE).ok_or(ApiError::Unauthorized)?;
    keys.verify(cookie.value()).map_err(|_| {
        warn!("invalid or expired session cookie");
        ApiError::Unauthorized
    })
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        claims_from_parts(parts, state).map(Session)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    SessionKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?;
        if claims.role != Role::Admin {
            warn!(user_id = %claims.sub, "admin endpoint denied for non-admin session");
            return Err(ApiError::Forbidden);
        }
        Ok(AdminSession(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::http::{header::COOKIE, Request, StatusCode};
    use uuid::Uuid;

    fn parts_with_cookie(token: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/admin/stats");
        if let Some(t) = token {
            builder = builder.header(COOKIE, format!("{SESSION_COOKIE}={t}"));
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(None);
        let err = Session::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("should deny");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_cookie_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_cookie(Some("not-a-token"));
        let err = Session::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("should deny");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_session_is_accepted() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, Role::User).unwrap();
        let mut parts = parts_with_cookie(Some(&token));
        let Session(claims) = Session::from_request_parts(&mut parts, &state)
            .await
            .expect("should allow");
        assert_eq!(claims.sub, user_id);
    }

    #[tokio::test]
    async fn user_session_is_forbidden_on_admin_extractor() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let token = keys.sign(Uuid::new_v4(), Role::User).unwrap();
        let mut parts = parts_with_cookie(Some(&token));
        let err = AdminSession::from_request_parts(&mut parts, &state)
            .await
            .err()
            .expect("should deny");
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn admin_session_passes_admin_extractor() {
        let state = AppState::fake();
        let keys = SessionKeys::from_ref(&state);
        let admin_id = Uuid::new_v4();
        let token = keys.sign(admin_id, Role::Admin).unwrap();
        let mut parts = parts_with_cookie(Some(&token));
        let AdminSession(claims) = AdminSession::from_request_parts(&mut parts, &state)
            .await
            .expect("should allow");
        assert_eq!(claims.sub, admin_id);
        assert_eq!(claims.role, Role::Admin);
    }
}
