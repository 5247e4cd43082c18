//! Authentication and role policy middleware
//!
//! [`auth_middleware`] turns a bearer token into a [`Session`] stored in the
//! request extensions; handlers receive it as `Extension<Session>`. The
//! `require_*` layers then check the session role against a [`Policy`].
//! Layer the policy check inside the authentication layer.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::{models::Role, token::Claims};
use tracing::{debug, error, warn};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub account_id: i32,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    /// `jti` of the presented token
    pub token_id: String,
}

impl Session {
    pub fn from_claims(claims: Claims) -> ApiResult<Self> {
        let account_id = claims.account_id().map_err(|_| ApiError::Unauthorized)?;

        Ok(Session {
            account_id,
            email: claims.email,
            full_name: claims.name,
            role: claims.role,
            token_id: claims.jti,
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Role-based authorization policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    RequireAdminRole,
    RequireStaffRole,
    RequireAdminOrStaffRole,
}

impl Policy {
    pub fn allows(self, role: Role) -> bool {
        match self {
            Policy::RequireAdminRole => role == Role::Admin,
            Policy::RequireStaffRole => role == Role::Staff,
            Policy::RequireAdminOrStaffRole => matches!(role, Role::Admin | Role::Staff),
        }
    }
}

/// Authentication middleware
///
/// Rejects missing, invalid, expired and revoked tokens with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state.jwt_service.validate(bearer.token()).map_err(|e| {
        debug!("Rejected bearer token: {}", e);
        ApiError::Unauthorized
    })?;

    let revoked = state
        .jwt_service
        .is_revoked(&state.redis_pool, &claims.jti)
        .await
        .map_err(|e| {
            error!("Failed to check token revocation: {}", e);
            ApiError::InternalServerError
        })?;

    if revoked {
        warn!("Revoked token {} presented by account {}", claims.jti, claims.sub);
        return Err(ApiError::Unauthorized);
    }

    let session = Session::from_claims(claims)?;
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

fn authorize(req: &Request<Body>, policy: Policy) -> ApiResult<()> {
    let session = req
        .extensions()
        .get::<Session>()
        .ok_or(ApiError::Unauthorized)?;

    if policy.allows(session.role) {
        Ok(())
    } else {
        debug!(
            "Account {} with role {} denied by {:?}",
            session.account_id, session.role, policy
        );
        Err(ApiError::Forbidden(
            "You do not have permission to perform this action".to_string(),
        ))
    }
}

pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    authorize(&req, Policy::RequireAdminRole)?;
    Ok(next.run(req).await)
}

pub async fn require_staff(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    authorize(&req, Policy::RequireStaffRole)?;
    Ok(next.run(req).await)
}

pub async fn require_admin_or_staff(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    authorize(&req, Policy::RequireAdminOrStaffRole)?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn session(role: Role) -> Session {
        Session {
            account_id: 7,
            email: "staff@newsdesk.test".to_string(),
            full_name: "Staff Member".to_string(),
            role,
            token_id: "jti".to_string(),
        }
    }

    fn guarded(role: Option<Role>) -> Router {
        let router = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(middleware::from_fn(require_admin));

        match role {
            Some(role) => router.layer(middleware::from_fn(
                move |mut req: Request<Body>, next: Next| async move {
                    req.extensions_mut().insert(session(role));
                    next.run(req).await
                },
            )),
            None => router,
        }
    }

    async fn status_for(role: Option<Role>) -> StatusCode {
        guarded(role)
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_policy_table() {
        assert!(Policy::RequireAdminRole.allows(Role::Admin));
        assert!(!Policy::RequireAdminRole.allows(Role::Staff));
        assert!(Policy::RequireStaffRole.allows(Role::Staff));
        assert!(!Policy::RequireStaffRole.allows(Role::Admin));
        assert!(Policy::RequireAdminOrStaffRole.allows(Role::Admin));
        assert!(Policy::RequireAdminOrStaffRole.allows(Role::Staff));
    }

    #[tokio::test]
    async fn test_admin_guard() {
        assert_eq!(status_for(Some(Role::Admin)).await, StatusCode::OK);
        assert_eq!(status_for(Some(Role::Staff)).await, StatusCode::FORBIDDEN);
        assert_eq!(status_for(None).await, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_session_requires_numeric_subject() {
        let claims = Claims {
            sub: "not-a-number".to_string(),
            email: "a@x.com".to_string(),
            name: "A".to_string(),
            role: Role::Staff,
            jti: "j".to_string(),
            iss: "newsdesk".to_string(),
            aud: "newsdesk-clients".to_string(),
            iat: 0,
            exp: 0,
        };
        assert!(matches!(
            Session::from_claims(claims),
            Err(ApiError::Unauthorized)
        ));
    }
}
