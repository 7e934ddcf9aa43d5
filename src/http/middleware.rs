//! Authentication middleware - JWT verification and group gating

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use crate::app::AppState;

type HmacSha256 = Hmac<Sha256>;

/// The four account groups managed by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    User,
    Employee,
    Manager,
    Admin,
}

impl Group {
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::User => "user",
            Group::Employee => "employee",
            Group::Manager => "manager",
            Group::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Groups allowed through each route tier
pub const ACCOUNT_GROUPS: &[Group] = &[Group::User, Group::Employee, Group::Manager, Group::Admin];
pub const STAFF_GROUPS: &[Group] = &[Group::Employee, Group::Manager, Group::Admin];
pub const MANAGEMENT_GROUPS: &[Group] = &[Group::Manager, Group::Admin];
pub const ADMIN_GROUPS: &[Group] = &[Group::Admin];

/// JWT claims from the identity provider's access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Audience
    #[serde(default)]
    pub aud: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: u64,
    /// Email (if available)
    #[serde(default)]
    pub email: Option<String>,
    /// Application metadata set by the gateway's admin flows
    #[serde(default)]
    pub app_metadata: ClaimsMetadata,
}

/// The app_metadata claim slice the gateway cares about
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimsMetadata {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// Verify a JWT token and extract claims
pub fn verify_jwt(token: &str, secret: &str) -> Result<JwtClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken);
    }

    let header_b64 = parts[0];
    let payload_b64 = parts[1];
    let signature_b64 = parts[2];

    // Verify signature (HMAC-SHA256)
    let message = format!("{}.{}", header_b64, payload_b64);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(message.as_bytes());

    let expected_signature = mac.finalize().into_bytes();
    let provided_signature = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    if expected_signature.as_slice() != provided_signature.as_slice() {
        return Err(AuthError::InvalidToken);
    }

    // Decode payload
    let payload_json = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims: JwtClaims =
        serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

    // Check expiration
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(std::time::Duration::ZERO)
        .as_secs();

    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Extract JWT from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Linear scan of a caller's group claim against a tier's allowed list
pub fn is_member_of(groups: &[String], allowed: &[Group]) -> bool {
    groups
        .iter()
        .any(|g| allowed.iter().any(|a| a.as_str() == g))
}

/// Whether the group claim carries admin
pub fn is_admin(groups: &[String]) -> bool {
    groups.iter().any(|g| g == Group::Admin.as_str())
}

/// Authentication error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingHeader,

    #[error("Invalid authorization header format")]
    InvalidFormat,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("No username in token")]
    MissingUsername,

    #[error("Insufficient group membership")]
    Forbidden,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingHeader => StatusCode::UNAUTHORIZED,
            AuthError::InvalidFormat => StatusCode::BAD_REQUEST,
            AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::TokenExpired => StatusCode::UNAUTHORIZED,
            AuthError::MissingUsername => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Authenticated caller, inserted into request extensions
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub username: String,
    pub groups: Vec<String>,
    pub claims: JwtClaims,
}

impl AuthenticatedUser {
    fn from_claims(claims: JwtClaims) -> Result<Self, AuthError> {
        let username = claims
            .app_metadata
            .username
            .clone()
            .or_else(|| claims.email.clone())
            .ok_or(AuthError::MissingUsername)?;

        Ok(Self {
            user_id: claims.sub,
            username,
            groups: claims.app_metadata.groups.clone(),
            claims,
        })
    }
}

/// Shared verify-and-gate step behind the tier middlewares
async fn authorize(
    state: AppState,
    mut request: Request,
    next: Next,
    allowed: &'static [Group],
) -> Result<Response, AuthError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingHeader)?;

    let token = extract_bearer_token(auth_header).ok_or(AuthError::InvalidFormat)?;

    let claims = verify_jwt(token, &state.config.supabase_jwt_secret)?;
    let auth_user = AuthenticatedUser::from_claims(claims)?;

    if !is_member_of(&auth_user.groups, allowed) {
        return Err(AuthError::Forbidden);
    }

    // Insert into request extensions for handlers to access
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Middleware for routes open to any authenticated account
pub async fn require_account(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(state, request, next, ACCOUNT_GROUPS).await
}

/// Middleware for routes open to employees and above
pub async fn require_staff(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(state, request, next, STAFF_GROUPS).await
}

/// Middleware for routes open to managers and admins
pub async fn require_management(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(state, request, next, MANAGEMENT_GROUPS).await
}

/// Middleware for admin-only routes
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    authorize(state, request, next, ADMIN_GROUPS).await
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Sign an HS256 token over arbitrary claims, for exercising the
    /// verification path without the identity provider
    pub fn sign_token(secret: &str, claims: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&serde_json::json!({"alg": "HS256", "typ": "JWT"})).unwrap());
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).unwrap());
        let message = format!("{}.{}", header, payload);

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{}.{}", message, signature)
    }

    /// Claims for a caller in the given groups, expiring an hour from now
    pub fn claims_for(username: &str, groups: &[&str]) -> serde_json::Value {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();

        serde_json::json!({
            "sub": Uuid::new_v4(),
            "exp": now + 3600,
            "iat": now,
            "email": format!("{}@example.com", username),
            "app_metadata": { "groups": groups, "username": username },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{claims_for, sign_token};
    use super::*;

    const SECRET: &str = "test-jwt-secret";

    #[test]
    fn verify_accepts_signed_token() {
        let token = sign_token(SECRET, &claims_for("cashier1", &["employee"]));
        let claims = verify_jwt(&token, SECRET).expect("token should verify");

        assert_eq!(claims.app_metadata.groups, vec!["employee"]);
        assert_eq!(claims.app_metadata.username.as_deref(), Some("cashier1"));
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign_token("other-secret", &claims_for("cashier1", &["employee"]));
        assert!(matches!(
            verify_jwt(&token, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let token = sign_token(SECRET, &claims_for("cashier1", &["employee"]));
        let parts: Vec<&str> = token.split('.').collect();

        let forged_payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&claims_for("cashier1", &["admin"])).unwrap(),
        );
        let forged = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(
            verify_jwt(&forged, SECRET),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let mut claims = claims_for("cashier1", &["employee"]);
        claims["exp"] = serde_json::json!(1);
        let token = sign_token(SECRET, &claims);

        assert!(matches!(
            verify_jwt(&token, SECRET),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn verify_rejects_garbage() {
        assert!(verify_jwt("not-a-token", SECRET).is_err());
        assert!(verify_jwt("a.b", SECRET).is_err());
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
    }

    #[test]
    fn group_scans() {
        let groups = vec!["employee".to_string()];
        assert!(is_member_of(&groups, STAFF_GROUPS));
        assert!(!is_member_of(&groups, MANAGEMENT_GROUPS));
        assert!(!is_member_of(&groups, ADMIN_GROUPS));
        assert!(!is_admin(&groups));

        let groups = vec!["user".to_string(), "admin".to_string()];
        assert!(is_member_of(&groups, ADMIN_GROUPS));
        assert!(is_admin(&groups));

        assert!(!is_member_of(&[], ACCOUNT_GROUPS));
    }
}
