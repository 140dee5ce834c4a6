//! Collaborator interface for the mentorship API
//!
//! Implemented by:
//! - `RemoteClient`: talks to the HTTP API
//! - `InMemoryClient`: in-process store for tests, demos and offline use

pub mod memory;
pub mod remote;

use crate::error::MentorResult;
use crate::model::{Dataset, PersonId, Role, Tag, TagId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use memory::InMemoryClient;
pub use remote::RemoteClient;

/// Body of the tag-write endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagAssignment {
    pub person_id: PersonId,
    pub person_type: Role,
    pub tag_ids: Vec<TagId>,
}

impl TagAssignment {
    pub fn new(person_id: PersonId, person_type: Role, tags: &[Tag]) -> Self {
        Self {
            person_id,
            person_type,
            tag_ids: tags.iter().map(|t| t.id.clone()).collect(),
        }
    }
}

/// Read and write access to the mentorship records.
///
/// List reads return raw JSON records so that ingestion can drop malformed
/// entries one by one instead of failing the whole response.
#[async_trait]
pub trait MentorshipClient: Send + Sync {
    /// Fetch all mentors, bypassing intermediate HTTP caches
    async fn fetch_mentors(&self) -> MentorResult<Vec<Value>>;

    /// Fetch all mentees, bypassing intermediate HTTP caches
    async fn fetch_mentees(&self) -> MentorResult<Vec<Value>>;

    /// Replace a person's tag set. Returns the tag list the server stored.
    async fn assign_tags(&self, assignment: &TagAssignment) -> MentorResult<Vec<Tag>>;

    /// Mark any cached read of this person as stale
    fn invalidate(&self, person_id: &PersonId, role: Role);
}

/// Fetch both lists concurrently and decode them into a dataset
pub async fn fetch_dataset(client: &dyn MentorshipClient) -> MentorResult<Dataset> {
    let (mentors, mentees) = tokio::try_join!(client.fetch_mentors(), client.fetch_mentees())?;
    Ok(Dataset::from_json(mentors, mentees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_assignment_wire_shape() {
        let tags = vec![Tag::new("t1", "rust", "#000"), Tag::new("t2", "go", "#fff")];
        let assignment = TagAssignment::new("e1".into(), Role::Mentee, &tags);
        assert_eq!(
            serde_json::to_value(&assignment).unwrap(),
            json!({"personId": "e1", "personType": "mentee", "tagIds": ["t1", "t2"]})
        );
    }

    #[tokio::test]
    async fn test_fetch_dataset() {
        let client = InMemoryClient::new();
        client.set_records(
            vec![json!({"id": "m1", "name": "Asha"})],
            vec![json!({"id": "e1", "name": "Ben", "mentor": "m1"}), json!({"name": "broken"})],
        );
        let dataset = fetch_dataset(&client).await.unwrap();
        assert_eq!(dataset.mentors.len(), 1);
        assert_eq!(dataset.mentees.len(), 1);
    }
}
