//! User profile management
//!
//! Profiles supplement identity-provider records with the fields the
//! gateway owns: names, contact email, and store affiliation. They are
//! keyed by username, the handle carried in the provider's app_metadata.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::supabase::{SupabaseClient, SupabaseError};

/// User profile row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    /// Identity-provider subject id
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Store affiliation (employees/managers) or preferred store (users)
    pub store_id: i32,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// New profile for insertion
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub username: String,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub store_id: i32,
}

/// Partial profile update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<i32>,
}

/// Profile store operations
#[derive(Clone)]
pub struct ProfileStore {
    client: SupabaseClient,
}

impl ProfileStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    /// Get a profile by username
    pub async fn get_profile(&self, username: &str) -> Result<Option<Profile>, SupabaseError> {
        let query = format!("username=eq.{}", username);
        self.client.get_one("profiles", &query).await
    }

    /// Create a new profile
    pub async fn create_profile(&self, profile: NewProfile) -> Result<Profile, SupabaseError> {
        self.client.insert("profiles", &profile).await
    }

    /// Apply a partial update to a profile, returning the updated row
    pub async fn update_profile(
        &self,
        username: &str,
        update: ProfileUpdate,
    ) -> Result<Option<Profile>, SupabaseError> {
        let query = format!("username=eq.{}", username);
        let updated: Vec<Profile> = self
            .client
            .update_returning("profiles", &query, &update)
            .await?;
        Ok(updated.into_iter().next())
    }

    /// Delete a profile by username
    pub async fn delete_profile(&self, username: &str) -> Result<bool, SupabaseError> {
        let query = format!("username=eq.{}", username);
        let deleted: Vec<Profile> = self.client.delete("profiles", &query).await?;
        Ok(!deleted.is_empty())
    }
}
