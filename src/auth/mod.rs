/*!
 * # Authentication and Authorization Module
 *
 * JWT bearer authentication for shop staff, owners, consignors and platform
 * administrators. Tokens carry the user's role, permissions and tenant
 * (organization) so handlers can scope every query without another lookup.
 */

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::user::{self, UserRole};
use crate::errors::ServiceError;

pub mod password;
mod permissions;

pub use permissions::*;

/// Claim structure for JWT tokens
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,                     // Subject (user ID)
    pub name: Option<String>,            // User's name
    pub email: Option<String>,           // User's email
    pub role: UserRole,                  // User's role
    pub permissions: Vec<String>,        // Permissions granted by the role
    pub organization_id: Option<String>, // Tenant
    pub consignor_id: Option<String>,    // Linked consignor for portal users
    pub jti: String,                     // JWT ID
    pub iat: i64,                        // Issued at time
    pub exp: i64,                        // Expiration time
    pub nbf: i64,                        // Not valid before time
    pub iss: String,                     // Issuer
    pub aud: String,                     // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: UserRole,
    pub permissions: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub consignor_id: Option<Uuid>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user has a specific permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == role
    }

    /// Check if the user is a platform admin
    pub fn is_admin(&self) -> bool {
        self.has_role(UserRole::Admin)
    }

    /// Organization the caller acts for.
    pub fn require_organization(&self) -> Result<Uuid, ServiceError> {
        self.organization_id.ok_or_else(|| {
            ServiceError::Forbidden("No organization associated with this account".to_string())
        })
    }

    /// Consignor record behind a portal login.
    pub fn require_consignor(&self) -> Result<Uuid, ServiceError> {
        self.consignor_id.ok_or_else(|| {
            ServiceError::Forbidden("No consignor associated with this account".to_string())
        })
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let parse = |value: Option<String>| -> Result<Option<Uuid>, AuthError> {
            value
                .map(|v| Uuid::parse_str(&v).map_err(|_| AuthError::InvalidToken))
                .transpose()
        };

        Ok(AuthUser {
            user_id: Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?,
            name: claims.name,
            email: claims.email,
            role: claims.role,
            permissions: claims.permissions,
            organization_id: parse(claims.organization_id)?,
            consignor_id: parse(claims.consignor_id)?,
            token_id: claims.jti,
        })
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.auth_audience.clone(),
            cfg.auth_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration_secs),
        )
    }
}

/// Authentication service that handles token issuance and validation
#[derive(Debug, Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    blacklisted_tokens: Arc<RwLock<Vec<BlacklistedToken>>>,
}

/// Token blacklist entry
#[derive(Clone, Debug)]
struct BlacklistedToken {
    jti: String,
    expiry: DateTime<Utc>,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config,
            blacklisted_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Issue an access token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<TokenPair, AuthError> {
        let now = Utc::now();
        let access_exp = now
            + ChronoDuration::from_std(self.config.access_token_expiration)
                .map_err(|_| AuthError::InternalError("Invalid token duration".to_string()))?;

        let claims = Claims {
            sub: user.id.to_string(),
            name: Some(user.full_name.clone()),
            email: Some(user.email.clone()),
            role: user.role,
            permissions: permissions_for_role(user.role),
            organization_id: user.organization_id.map(|id| id.to_string()),
            consignor_id: user.consignor_id.map(|id| id.to_string()),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: access_exp.timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenCreation(e.to_string()))?;

        Ok(TokenPair {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.access_token_expiration.as_secs() as i64,
        })
    }

    /// Validate a JWT token and extract the claims
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.jwt_audience]);
        validation.set_issuer(&[&self.config.jwt_issuer]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_token_blacklisted(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Revoke a token until it would have expired anyway
    pub async fn revoke_token(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.validate_token(token).await?;
        let expiry = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);

        let mut blacklist = self.blacklisted_tokens.write().await;
        blacklist.retain(|entry| entry.expiry > Utc::now());
        blacklist.push(BlacklistedToken {
            jti: claims.jti,
            expiry,
        });
        Ok(())
    }

    async fn is_token_blacklisted(&self, token_id: &str) -> bool {
        let blacklist = self.blacklisted_tokens.read().await;
        blacklist.iter().any(|entry| entry.jti == token_id)
    }
}

/// Token issued on login
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    /// Lifetime in seconds
    pub expires_in: i64,
}

/// Authentication error types
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Token creation failed: {0}")]
    TokenCreation(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            Self::MissingAuth => (StatusCode::UNAUTHORIZED, "AUTH_MISSING"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "AUTH_TOKEN_EXPIRED"),
            Self::RevokedToken => (StatusCode::UNAUTHORIZED, "AUTH_TOKEN_REVOKED"),
            Self::InsufficientPermissions => (StatusCode::FORBIDDEN, "AUTH_FORBIDDEN"),
            Self::TokenCreation(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_TOKEN_CREATION"),
            Self::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "authentication failure");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": status.canonical_reason().unwrap_or("Error"),
            "code": code,
            "message": message,
            "request_id": crate::tracing::current_request_id().map(|r| r.0),
            "timestamp": Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InsufficientPermissions => ServiceError::Forbidden(err.to_string()),
            AuthError::TokenCreation(msg) | AuthError::InternalError(msg) => {
                ServiceError::InternalError(msg)
            }
            other => ServiceError::Unauthorized(other.to_string()),
        }
    }
}

/// Handlers take `AuthUser` as an argument on routes behind `with_auth`.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Permission middleware to check if a user has the required permission
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    // Admins have all permissions
    if user.is_admin() || user.has_permission(&required_permission) {
        return Ok(next.run(request).await);
    }

    debug!(
        user_id = %user.user_id,
        permission = %required_permission,
        "permission denied"
    );
    Err(AuthError::InsufficientPermissions)
}

/// Role middleware to check if a user has the required role
pub async fn role_middleware(
    State(required_role): State<UserRole>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if !user.is_admin() && !user.has_role(required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("Authentication service not available".to_string())
                .into_response();
        }
    };

    match extract_auth_from_headers(request.headers(), &auth_service).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Bearer token from the Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let token = bearer_token(headers).ok_or(AuthError::MissingAuth)?;
    let claims = auth_service.validate_token(token).await?;
    AuthUser::try_from(claims)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
    fn with_role(self, role: UserRole) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }

    fn with_role(self, role: UserRole) -> Self {
        self.layer(axum::middleware::from_fn_with_state(role, role_middleware))
            .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ApprovalStatus;

    fn service() -> AuthService {
        AuthService::new(AuthConfig::new(
            "test_secret_that_is_long_enough_for_hs256".to_string(),
            "consignment-clients".to_string(),
            "consignment-api".to_string(),
            Duration::from_secs(3600),
        ))
    }

    fn owner() -> user::Model {
        user::Model {
            id: Uuid::new_v4(),
            organization_id: Some(Uuid::new_v4()),
            email: "owner@example.com".to_string(),
            full_name: "Shop Owner".to_string(),
            password_hash: String::new(),
            role: UserRole::Owner,
            approval_status: ApprovalStatus::Approved,
            approved_by: None,
            approved_at: None,
            rejected_reason: None,
            consignor_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn issued_token_round_trips_into_auth_user() {
        let service = service();
        let user = owner();
        let tokens = service.generate_token(&user).unwrap();

        let claims = service.validate_token(&tokens.access_token).await.unwrap();
        let auth_user = AuthUser::try_from(claims).unwrap();

        assert_eq!(auth_user.user_id, user.id);
        assert_eq!(auth_user.organization_id, user.organization_id);
        assert!(auth_user.has_permission(consts::PAYOUTS_CREATE));
        assert!(!auth_user.is_admin());
    }

    #[tokio::test]
    async fn token_from_other_issuer_is_rejected() {
        let tokens = service().generate_token(&owner()).unwrap();

        let mut other = service();
        other.config.jwt_issuer = "someone-else".to_string();
        let err = other.validate_token(&tokens.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn revoked_token_is_rejected() {
        let service = service();
        let tokens = service.generate_token(&owner()).unwrap();
        service.revoke_token(&tokens.access_token).await.unwrap();

        let err = service.validate_token(&tokens.access_token).await.unwrap_err();
        assert!(matches!(err, AuthError::RevokedToken));
    }

    #[test]
    fn require_organization_is_forbidden_without_tenant() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            name: None,
            email: None,
            role: UserRole::Admin,
            permissions: vec![],
            organization_id: None,
            consignor_id: None,
            token_id: "t".to_string(),
        };
        let err = user.require_organization().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bearer_token_requires_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc"));
    }
}
