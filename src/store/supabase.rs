//! Supabase REST API client using service_role key

use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};

use crate::config::Config;

/// Supabase client for server-side database operations
/// Uses service_role key which bypasses RLS - handle with care!
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_role_key: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_role_key: config.supabase_service_role_key.clone(),
        }
    }

    /// Get the REST API URL for a table
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Start a request with the service-role auth headers applied
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
            .header("Content-Type", "application/json")
    }

    /// Map a non-success response into an API error with its body
    async fn check(response: Response) -> Result<Response, SupabaseError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(SupabaseError::Api {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// GET rows matching a PostgREST filter query
    pub async fn get<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);

        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = Self::check(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// GET a single row matching a PostgREST filter query
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Option<T>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);

        let response = self
            .request(Method::GET, &url)
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        if response.status() == reqwest::StatusCode::NOT_ACCEPTABLE {
            // No rows found
            return Ok(None);
        }

        let response = Self::check(response).await?;
        response.json().await.map(Some).map_err(SupabaseError::Parse)
    }

    /// POST an insert, returning the created row
    pub async fn insert<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        data: &T,
    ) -> Result<R, SupabaseError> {
        let response = self
            .request(Method::POST, &self.rest_url(table))
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = Self::check(response).await?;

        // PostgREST returns an array, get first element
        let results: Vec<R> = response.json().await.map_err(SupabaseError::Parse)?;
        results
            .into_iter()
            .next()
            .ok_or(SupabaseError::NoRowReturned)
    }

    /// PATCH rows matching a filter query, returning the updated rows
    pub async fn update_returning<T: Serialize, R: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        data: &T,
    ) -> Result<Vec<R>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);

        let response = self
            .request(Method::PATCH, &url)
            .header("Prefer", "return=representation")
            .json(data)
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = Self::check(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }

    /// DELETE rows matching a filter query, returning the deleted rows
    pub async fn delete<R: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<R>, SupabaseError> {
        let url = format!("{}?{}", self.rest_url(table), query);

        let response = self
            .request(Method::DELETE, &url)
            .header("Prefer", "return=representation")
            .send()
            .await
            .map_err(SupabaseError::Request)?;

        let response = Self::check(response).await?;
        response.json().await.map_err(SupabaseError::Parse)
    }
}

/// Supabase errors
#[derive(Debug, thiserror::Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(reqwest::Error),

    #[error("No row returned from insert")]
    NoRowReturned,
}
