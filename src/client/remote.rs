//! RemoteClient: HTTP client for the mentorship API

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Client, Response};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::sync::Mutex;
use tracing::{debug, info};

use super::{MentorshipClient, TagAssignment};
use crate::config::ApiConfig;
use crate::error::{MentorError, MentorResult};
use crate::model::{PersonId, Role, Tag};

/// Network client for a running mentorship API.
///
/// List fetches always go to the network with cache-busting headers. Tag
/// writes mark the person stale until the next fetch of their list.
pub struct RemoteClient {
    config: ApiConfig,
    http_client: Client,
    stale: Mutex<FxHashSet<(Role, PersonId)>>,
}

impl RemoteClient {
    pub fn new(config: ApiConfig) -> MentorResult<Self> {
        let http_client = Client::builder().timeout(config.timeout()).build()?;
        let config = ApiConfig {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        };
        Ok(Self {
            config,
            http_client,
            stale: Mutex::new(FxHashSet::default()),
        })
    }

    /// Create a client for the given base URL with default paths
    pub fn with_base_url(base_url: &str) -> MentorResult<Self> {
        Self::new(ApiConfig::default().with_base_url(base_url))
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Whether a tag write changed this person since their list was last fetched
    pub fn is_stale(&self, role: Role, id: &PersonId) -> bool {
        self.stale
            .lock()
            .map(|stale| stale.contains(&(role, id.clone())))
            .unwrap_or(false)
    }

    fn mark_fresh(&self, role: Role) {
        if let Ok(mut stale) = self.stale.lock() {
            stale.retain(|(r, _)| *r != role);
        }
    }

    async fn get_list(&self, role: Role, path: &str) -> MentorResult<Vec<Value>> {
        let url = self.url(path);
        debug!(%url, "fetching records");
        let response = self
            .http_client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        let records: Vec<Value> = ensure_success(response).await?.json().await?;
        self.mark_fresh(role);
        Ok(records)
    }
}

/// Map a non-success response to `MentorError::Status`, reading the API's
/// `{"error": "..."}` body when present
async fn ensure_success(response: Response) -> MentorResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: Value = response
        .json()
        .await
        .unwrap_or_else(|_| serde_json::json!({"error": "Unknown error"}));
    let message = body
        .get("error")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error")
        .to_string();
    Err(MentorError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MentorshipClient for RemoteClient {
    async fn fetch_mentors(&self) -> MentorResult<Vec<Value>> {
        self.get_list(Role::Mentor, &self.config.mentors_path).await
    }

    async fn fetch_mentees(&self) -> MentorResult<Vec<Value>> {
        self.get_list(Role::Mentee, &self.config.mentees_path).await
    }

    async fn assign_tags(&self, assignment: &TagAssignment) -> MentorResult<Vec<Tag>> {
        let url = self.url(&self.config.tags_path);
        let response = self.http_client.post(&url).json(assignment).send().await?;

        let status = response.status();
        if status.is_client_error() {
            let err = ensure_success(response).await.err();
            let message = match err {
                Some(MentorError::Status { message, .. }) => message,
                _ => status.to_string(),
            };
            return Err(MentorError::TagWriteRejected {
                id: assignment.person_id.clone(),
                message,
            });
        }

        let tags: Vec<Tag> = ensure_success(response).await?.json().await?;
        info!(person = %assignment.person_id, role = %assignment.person_type, tags = tags.len(), "tags assigned");
        Ok(tags)
    }

    fn invalidate(&self, person_id: &PersonId, role: Role) {
        debug!(%role, person = %person_id, "marking person stale");
        if let Ok(mut stale) = self.stale.lock() {
            stale.insert((role, person_id.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = RemoteClient::with_base_url("http://localhost:3000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(client.url("/api/mentors"), "http://localhost:3000/api/mentors");
    }

    #[test]
    fn test_invalidate_marks_person_until_refetch() {
        let client = RemoteClient::with_base_url("http://localhost:3000").unwrap();
        let m1 = PersonId::new("m1");
        assert!(!client.is_stale(Role::Mentor, &m1));

        client.invalidate(&m1, Role::Mentor);
        client.invalidate(&"e1".into(), Role::Mentee);
        assert!(client.is_stale(Role::Mentor, &m1));
        assert!(!client.is_stale(Role::Mentee, &m1));

        client.mark_fresh(Role::Mentor);
        assert!(!client.is_stale(Role::Mentor, &m1));
        assert!(client.is_stale(Role::Mentee, &"e1".into()));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 1,
            ..Default::default()
        };
        let client = RemoteClient::new(config).unwrap();
        let err = client.fetch_mentors().await.unwrap_err();
        assert!(matches!(err, MentorError::Http(_)));
    }
}
