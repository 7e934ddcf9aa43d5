//! GoTrue identity-provider client
//!
//! Wraps the hosted auth API: password-grant login plus the admin user
//! endpoints the gateway needs (lookup, invite, delete, group membership).
//! Group membership lives in each user's `app_metadata.groups`; the
//! provider has no server-side group filter, so listing a group pages
//! through the user list and scans.

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::config::Config;

/// Page size for admin user listing
const USERS_PAGE_SIZE: usize = 200;

/// Identity provider client
#[derive(Clone)]
pub struct IdentityClient {
    client: Client,
    base_url: String,
    anon_key: String,
    service_role_key: String,
}

impl IdentityClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Admin request with the service-role key
    fn admin_request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    async fn check(response: Response) -> Result<Response, IdentityError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(IdentityError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Authenticate with email and password, returning the token pair
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenResponse, IdentityError> {
        let url = self.auth_url("token?grant_type=password");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .header("Content-Type", "application/json")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(IdentityError::Request)?;

        // The provider answers 400 for bad credentials
        if response.status() == StatusCode::BAD_REQUEST {
            return Err(IdentityError::InvalidCredentials);
        }

        let response = Self::check(response).await?;
        response.json().await.map_err(IdentityError::Parse)
    }

    /// Admin lookup of a single user
    pub async fn get_user(&self, user_id: Uuid) -> Result<AdminUser, IdentityError> {
        let url = self.auth_url(&format!("admin/users/{}", user_id));

        let response = self
            .admin_request(Method::GET, &url)
            .send()
            .await
            .map_err(IdentityError::Request)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound);
        }

        let response = Self::check(response).await?;
        response.json().await.map_err(IdentityError::Parse)
    }

    /// Create an account and deliver an invitation email
    pub async fn invite_user(&self, email: &str) -> Result<AdminUser, IdentityError> {
        let url = self.auth_url("invite");

        let response = self
            .admin_request(Method::POST, &url)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(IdentityError::Request)?;

        let response = Self::check(response).await?;
        response.json().await.map_err(IdentityError::Parse)
    }

    /// Admin delete of a user
    pub async fn delete_user(&self, user_id: Uuid) -> Result<(), IdentityError> {
        let url = self.auth_url(&format!("admin/users/{}", user_id));

        let response = self
            .admin_request(Method::DELETE, &url)
            .send()
            .await
            .map_err(IdentityError::Request)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound);
        }

        Self::check(response).await?;
        Ok(())
    }

    /// Replace a user's app_metadata
    async fn put_app_metadata(
        &self,
        user_id: Uuid,
        metadata: &AppMetadata,
    ) -> Result<AdminUser, IdentityError> {
        let url = self.auth_url(&format!("admin/users/{}", user_id));

        let response = self
            .admin_request(Method::PUT, &url)
            .json(&json!({ "app_metadata": metadata }))
            .send()
            .await
            .map_err(IdentityError::Request)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(IdentityError::UserNotFound);
        }

        let response = Self::check(response).await?;
        response.json().await.map_err(IdentityError::Parse)
    }

    /// Add a user to a group (read-modify-write of app_metadata)
    pub async fn add_to_group(&self, user_id: Uuid, group: &str) -> Result<AdminUser, IdentityError> {
        let mut user = self.get_user(user_id).await?;

        if user.app_metadata.groups.iter().any(|g| g == group) {
            // Already a member, nothing to write
            return Ok(user);
        }

        user.app_metadata.groups.push(group.to_string());
        self.put_app_metadata(user_id, &user.app_metadata).await
    }

    /// Remove a user from a group
    pub async fn remove_from_group(
        &self,
        user_id: Uuid,
        group: &str,
    ) -> Result<AdminUser, IdentityError> {
        let mut user = self.get_user(user_id).await?;
        user.app_metadata.groups.retain(|g| g != group);
        self.put_app_metadata(user_id, &user.app_metadata).await
    }

    /// Record the profile username on the provider side
    pub async fn set_username(
        &self,
        user_id: Uuid,
        username: &str,
    ) -> Result<AdminUser, IdentityError> {
        let mut user = self.get_user(user_id).await?;
        user.app_metadata.username = Some(username.to_string());
        self.put_app_metadata(user_id, &user.app_metadata).await
    }

    /// Current group memberships for a user
    pub async fn groups_for_user(&self, user_id: Uuid) -> Result<Vec<String>, IdentityError> {
        let user = self.get_user(user_id).await?;
        Ok(user.app_metadata.groups)
    }

    /// All users belonging to a group
    pub async fn users_in_group(&self, group: &str) -> Result<Vec<AdminUser>, IdentityError> {
        let mut members = Vec::new();
        let mut page = 1;

        loop {
            let url = self.auth_url(&format!(
                "admin/users?page={}&per_page={}",
                page, USERS_PAGE_SIZE
            ));

            let response = self
                .admin_request(Method::GET, &url)
                .send()
                .await
                .map_err(IdentityError::Request)?;

            let response = Self::check(response).await?;
            let listing: UserListing = response.json().await.map_err(IdentityError::Parse)?;
            let page_len = listing.users.len();

            members.extend(
                listing
                    .users
                    .into_iter()
                    .filter(|u| u.app_metadata.groups.iter().any(|g| g == group)),
            );

            if page_len < USERS_PAGE_SIZE {
                return Ok(members);
            }
            page += 1;
        }
    }
}

/// Token pair returned by a password grant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: String,
}

/// Identity-provider user record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub app_metadata: AppMetadata,
}

/// The slice of app_metadata the gateway reads and writes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Provider-managed keys we must not drop on read-modify-write
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Admin user listing page
#[derive(Debug, Deserialize)]
struct UserListing {
    #[serde(default)]
    users: Vec<AdminUser>,
}

/// Identity-provider errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Identity API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,
}
