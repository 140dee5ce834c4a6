//! InMemoryClient: in-process mentorship store
//!
//! No network: records live behind a mutex. Failures and latency can be
//! injected so refresh and rollback paths are exercisable without a server.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

use super::{MentorshipClient, TagAssignment};
use crate::error::{MentorError, MentorResult};
use crate::model::{Dataset, PersonId, Role, Tag};

#[derive(Debug, Default)]
struct Store {
    mentors: Vec<Value>,
    mentees: Vec<Value>,
    /// Tags that may be assigned
    catalog: Vec<Tag>,
    fail_fetches: Option<String>,
    reject_tag_writes: Option<String>,
    fetch_delay: Option<Duration>,
    write_delay: Option<Duration>,
    fetch_count: usize,
    invalidations: Vec<(Role, PersonId)>,
}

/// In-process client backed by JSON records
#[derive(Debug, Default)]
pub struct InMemoryClient {
    store: Mutex<Store>,
}

impl InMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: &Dataset) -> Self {
        let client = Self::new();
        client.set_dataset(dataset);
        client
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        // a poisoned lock only means a panicking test thread; the data is still usable
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the stored records with raw JSON
    pub fn set_records(&self, mentors: Vec<Value>, mentees: Vec<Value>) {
        let mut store = self.store();
        store.mentors = mentors;
        store.mentees = mentees;
    }

    /// Replace the stored records with a typed dataset. Every tag it references
    /// joins the assignable catalog.
    pub fn set_dataset(&self, dataset: &Dataset) {
        let mentors: Vec<Value> = dataset.mentors.iter().filter_map(|m| serde_json::to_value(m).ok()).collect();
        let mentees: Vec<Value> = dataset.mentees.iter().filter_map(|m| serde_json::to_value(m).ok()).collect();

        let mut store = self.store();
        store.mentors = mentors;
        store.mentees = mentees;
        let referenced = dataset
            .mentors
            .iter()
            .flat_map(|m| m.tags.iter())
            .chain(dataset.mentees.iter().flat_map(|m| m.tags.iter()));
        for tag in referenced {
            if !store.catalog.iter().any(|t| t.id == tag.id) {
                store.catalog.push(tag.clone());
            }
        }
    }

    /// Make tags assignable
    pub fn add_tags(&self, tags: impl IntoIterator<Item = Tag>) {
        let mut store = self.store();
        for tag in tags {
            if !store.catalog.iter().any(|t| t.id == tag.id) {
                store.catalog.push(tag);
            }
        }
    }

    /// Make every fetch fail with the given message, or succeed again with `None`
    pub fn fail_fetches(&self, message: Option<&str>) {
        self.store().fail_fetches = message.map(str::to_string);
    }

    /// Reject every tag write with the given message, or accept again with `None`
    pub fn reject_tag_writes(&self, message: Option<&str>) {
        self.store().reject_tag_writes = message.map(str::to_string);
    }

    /// Delay every list fetch
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        self.store().fetch_delay = delay;
    }

    /// Delay every tag write
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.store().write_delay = delay;
    }

    /// Number of list fetches served (mentor and mentee lists count separately)
    pub fn fetch_count(&self) -> usize {
        self.store().fetch_count
    }

    pub fn invalidations(&self) -> Vec<(Role, PersonId)> {
        self.store().invalidations.clone()
    }

    async fn list(&self, role: Role) -> MentorResult<Vec<Value>> {
        let delay = self.store().fetch_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.store();
        if let Some(message) = &store.fail_fetches {
            return Err(MentorError::Fetch(message.clone()));
        }
        store.fetch_count += 1;
        debug!(%role, "serving in-memory records");
        Ok(match role {
            Role::Mentor => store.mentors.clone(),
            Role::Mentee => store.mentees.clone(),
        })
    }
}

#[async_trait]
impl MentorshipClient for InMemoryClient {
    async fn fetch_mentors(&self) -> MentorResult<Vec<Value>> {
        self.list(Role::Mentor).await
    }

    async fn fetch_mentees(&self) -> MentorResult<Vec<Value>> {
        self.list(Role::Mentee).await
    }

    async fn assign_tags(&self, assignment: &TagAssignment) -> MentorResult<Vec<Tag>> {
        let delay = self.store().write_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut store = self.store();
        if let Some(message) = &store.reject_tag_writes {
            return Err(MentorError::TagWriteRejected {
                id: assignment.person_id.clone(),
                message: message.clone(),
            });
        }

        let mut tags = Vec::with_capacity(assignment.tag_ids.len());
        for id in &assignment.tag_ids {
            match store.catalog.iter().find(|t| &t.id == id) {
                Some(tag) => tags.push(tag.clone()),
                None => {
                    return Err(MentorError::TagWriteRejected {
                        id: assignment.person_id.clone(),
                        message: format!("unknown tag {}", id),
                    })
                }
            }
        }

        let records = match assignment.person_type {
            Role::Mentor => &mut store.mentors,
            Role::Mentee => &mut store.mentees,
        };
        let record = records
            .iter_mut()
            .find(|r| r.get("id").and_then(PersonId::from_json).as_ref() == Some(&assignment.person_id))
            .ok_or_else(|| MentorError::PersonNotFound {
                role: assignment.person_type,
                id: assignment.person_id.clone(),
            })?;
        record["tags"] = serde_json::to_value(&tags)?;
        Ok(tags)
    }

    fn invalidate(&self, person_id: &PersonId, role: Role) {
        self.store().invalidations.push((role, person_id.clone()));
    }
}
