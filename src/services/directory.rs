use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ContactDetails, ListingSummary, RequirementSummary, UserSummary};

/// Errors that can occur when calling the directory service
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid internal API key")]
    Unauthorized,
}

/// Client for the internal directory service.
///
/// The directory owns user accounts, listings and requirements; this service
/// only reads summaries from it to enrich match responses. Contact details
/// stay behind `contact_shared` on the match itself.
pub struct DirectoryClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl DirectoryClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }

    /// Fetch a single user summary.
    pub async fn get_user(&self, user_id: Uuid) -> Result<UserSummary, DirectoryError> {
        let url = format!("{}/internal/users/{}", self.base_url, user_id);
        self.get_json(&url, &format!("User {}", user_id)).await
    }

    /// Fetch user summaries in one round-trip, keyed by user id.
    ///
    /// Ids absent from the response are simply missing from the map; callers
    /// treat enrichment as best-effort.
    pub async fn get_users(
        &self,
        user_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, UserSummary>, DirectoryError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids = user_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!(
            "{}/internal/users?ids={}",
            self.base_url,
            urlencoding::encode(&ids)
        );

        let batch: UserBatch = self.get_json(&url, "User batch").await?;
        Ok(batch
            .users
            .into_iter()
            .map(|u| (u.user_id, u))
            .collect())
    }

    /// Fetch a user's contact details. Callers gate this on `contact_shared`.
    pub async fn get_contact(&self, user_id: Uuid) -> Result<ContactDetails, DirectoryError> {
        let url = format!("{}/internal/users/{}/contact", self.base_url, user_id);
        self.get_json(&url, &format!("Contact for {}", user_id)).await
    }

    /// Fetch a listing summary.
    pub async fn get_listing(&self, listing_id: Uuid) -> Result<ListingSummary, DirectoryError> {
        let url = format!("{}/internal/listings/{}", self.base_url, listing_id);
        self.get_json(&url, &format!("Listing {}", listing_id)).await
    }

    /// Fetch a requirement summary.
    pub async fn get_requirement(
        &self,
        requirement_id: Uuid,
    ) -> Result<RequirementSummary, DirectoryError> {
        let url = format!("{}/internal/requirements/{}", self.base_url, requirement_id);
        self.get_json(&url, &format!("Requirement {}", requirement_id))
            .await
    }

    async fn get_json<T>(&self, url: &str, what: &str) -> Result<T, DirectoryError>
    where
        T: serde::de::DeserializeOwned,
    {
        tracing::debug!("Directory fetch: {}", url);

        let response = self
            .client
            .get(url)
            .header("X-Internal-Key", &self.api_key)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(DirectoryError::NotFound(what.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DirectoryError::Unauthorized),
            status if !status.is_success() => Err(DirectoryError::ApiError(format!(
                "{} request failed: {}",
                what, status
            ))),
            _ => Ok(response.json().await?),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct UserBatch {
    users: Vec<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_json(id: Uuid, name: &str) -> String {
        format!(
            r#"{{"user_id": "{}", "full_name": "{}", "profile_photo_url": null, "user_type": "tenant"}}"#,
            id, name
        )
    }

    #[tokio::test]
    async fn test_get_user() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();

        let mock = server
            .mock("GET", format!("/internal/users/{}", id).as_str())
            .match_header("X-Internal-Key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(user_json(id, "Priya Nair"))
            .create_async()
            .await;

        let client = DirectoryClient::new(server.url(), "test-key".to_string());
        let user = client.get_user(id).await.unwrap();

        assert_eq!(user.user_id, id);
        assert_eq!(user.full_name, "Priya Nair");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_user_not_found() {
        let mut server = mockito::Server::new_async().await;
        let id = Uuid::new_v4();

        server
            .mock("GET", format!("/internal/users/{}", id).as_str())
            .with_status(404)
            .create_async()
            .await;

        let client = DirectoryClient::new(server.url(), "test-key".to_string());
        let err = client.get_user(id).await.unwrap_err();

        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_get_users_batch() {
        let mut server = mockito::Server::new_async().await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        server
            .mock("GET", "/internal/users")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"users": [{}, {}]}}"#,
                user_json(a, "Priya Nair"),
                user_json(b, "Rahul Mehta")
            ))
            .create_async()
            .await;

        let client = DirectoryClient::new(server.url(), "test-key".to_string());
        let users = client.get_users(&[a, b]).await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[&b].full_name, "Rahul Mehta");
    }

    #[tokio::test]
    async fn test_empty_batch_skips_the_request() {
        let client = DirectoryClient::new("http://unreachable.invalid".to_string(), String::new());
        let users = client.get_users(&[]).await.unwrap();
        assert!(users.is_empty());
    }
}
