//! Optimistic tag assignment
//!
//! A new tag set shows up in every view before the server answers. The server's
//! answer then confirms it (replacing it when the stored list differs) or the
//! previous set is put back.

use crate::client::{MentorshipClient, TagAssignment};
use crate::error::MentorResult;
use crate::model::{NodeKey, PersonId, Role, Tag};
use crate::sync::Announcer;
use crate::view::ViewCoordinator;
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Write state of one person's tag set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagWriteState {
    Confirmed,
    /// Write in flight; holds the set to restore on failure
    PendingWrite(Vec<Tag>),
    Failed { previous: Vec<Tag>, error: String },
}

pub struct TagAssigner {
    client: Arc<dyn MentorshipClient>,
    coordinator: Arc<RwLock<ViewCoordinator>>,
    announcer: Option<Arc<Announcer>>,
    states: Mutex<FxHashMap<NodeKey, TagWriteState>>,
}

impl TagAssigner {
    pub fn new(client: Arc<dyn MentorshipClient>, coordinator: Arc<RwLock<ViewCoordinator>>) -> Self {
        Self {
            client,
            coordinator,
            announcer: None,
            states: Mutex::new(FxHashMap::default()),
        }
    }

    /// Announce confirmed writes to other sessions
    pub fn with_announcer(mut self, announcer: Option<Arc<Announcer>>) -> Self {
        self.announcer = announcer;
        self
    }

    fn states(&self) -> MutexGuard<'_, FxHashMap<NodeKey, TagWriteState>> {
        self.states.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write state of a person, `None` if never written through this assigner
    pub fn state(&self, role: Role, id: &PersonId) -> Option<TagWriteState> {
        self.states().get(&NodeKey { role, id: id.clone() }).cloned()
    }

    fn set_state(&self, key: &NodeKey, state: TagWriteState) {
        self.states().insert(key.clone(), state);
    }

    /// Replace a person's tag set.
    ///
    /// Concurrent writes to the same person are not serialized: whichever
    /// response lands last wins.
    pub async fn assign_tags(&self, id: &PersonId, role: Role, tags: Vec<Tag>) -> MentorResult<Vec<Tag>> {
        let key = NodeKey { role, id: id.clone() };
        let previous = self.coordinator.write().await.patch_tags(role, id, tags.clone())?;
        self.set_state(&key, TagWriteState::PendingWrite(previous.clone()));
        debug!(%key, tags = tags.len(), "optimistic tag patch applied");

        let assignment = TagAssignment::new(id.clone(), role, &tags);
        match self.client.assign_tags(&assignment).await {
            Ok(confirmed) => {
                // a refresh may have replaced the optimistic set while the write was out
                if let Err(e) = self.coordinator.write().await.confirm_tags(role, id, confirmed.clone()) {
                    debug!(error = %e, "skipping tag patch");
                }
                self.set_state(&key, TagWriteState::Confirmed);
                self.client.invalidate(id, role);
                if let Some(announcer) = &self.announcer {
                    if let Err(e) = announcer.announce().await {
                        warn!(error = %e, "failed to write cross-tab marker");
                    }
                }
                info!(%key, tags = confirmed.len(), "tag write confirmed");
                Ok(confirmed)
            }
            Err(e) => {
                self.patch(role, id, previous.clone()).await;
                warn!(%key, error = %e, "tag write failed, reverted");
                self.set_state(
                    &key,
                    TagWriteState::Failed {
                        previous,
                        error: e.user_message(),
                    },
                );
                Err(e)
            }
        }
    }

    async fn patch(&self, role: Role, id: &PersonId, tags: Vec<Tag>) {
        // the person may have left the dataset in a refresh meanwhile
        if let Err(e) = self.coordinator.write().await.patch_tags(role, id, tags) {
            debug!(error = %e, "skipping tag revert");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventBus;
    use crate::client::InMemoryClient;
    use crate::config::Config;
    use crate::error::MentorError;
    use crate::layout::GraphCommand;
    use crate::model::{Dataset, Mentee, Mentor};
    use crate::sync::{CrossTabChannel, MemoryChannel, RefreshKind, RefreshOutcome, SyncController};
    use std::time::Duration;

    fn rust() -> Tag {
        Tag::new("t1", "rust", "#b7410e")
    }

    fn go() -> Tag {
        Tag::new("t2", "go", "#00add8")
    }

    fn setup() -> (TagAssigner, Arc<InMemoryClient>, Arc<RwLock<ViewCoordinator>>) {
        let dataset = Dataset::new(
            vec![Mentor::new("m1", "Asha").with_tags(vec![rust()])],
            vec![Mentee::new("e1", "Ben").with_mentor("m1"), Mentee::new("e2", "Cy")],
        );
        let client = Arc::new(InMemoryClient::with_dataset(&dataset));
        client.add_tags([go()]);

        let mut coordinator = ViewCoordinator::with_bus(&Config::default(), EventBus::<GraphCommand>::new());
        coordinator.apply_dataset(dataset);
        let coordinator = Arc::new(RwLock::new(coordinator));
        let assigner = TagAssigner::new(client.clone(), coordinator.clone());
        (assigner, client, coordinator)
    }

    #[tokio::test]
    async fn test_confirmed_write() {
        let (assigner, client, coordinator) = setup();
        let tags = assigner.assign_tags(&"e1".into(), Role::Mentee, vec![go()]).await.unwrap();
        assert_eq!(tags, vec![go()]);
        assert_eq!(assigner.state(Role::Mentee, &"e1".into()), Some(TagWriteState::Confirmed));
        assert_eq!(coordinator.read().await.dataset().mentees[0].tags, vec![go()]);
        assert_eq!(client.invalidations(), vec![(Role::Mentee, PersonId::new("e1"))]);
    }

    #[tokio::test]
    async fn test_server_list_replaces_optimistic() {
        let (assigner, _client, coordinator) = setup();
        let stale_color = Tag::new("t2", "go", "#ffffff");
        let tags = assigner.assign_tags(&"e2".into(), Role::Mentee, vec![stale_color]).await.unwrap();
        assert_eq!(tags, vec![go()]);
        assert_eq!(coordinator.read().await.dataset().mentees[1].tags, vec![go()]);
    }

    #[tokio::test]
    async fn test_rejected_write_rolls_back_only_that_person() {
        let (assigner, client, coordinator) = setup();
        assigner.assign_tags(&"e2".into(), Role::Mentee, vec![go()]).await.unwrap();

        client.reject_tag_writes(Some("forbidden"));
        let err = assigner
            .assign_tags(&"m1".into(), Role::Mentor, vec![rust(), go()])
            .await
            .unwrap_err();
        assert!(matches!(err, MentorError::TagWriteRejected { .. }));

        let coordinator = coordinator.read().await;
        assert_eq!(coordinator.dataset().mentors[0].tags, vec![rust()]);
        assert_eq!(coordinator.dataset().mentees[1].tags, vec![go()]);
        match assigner.state(Role::Mentor, &"m1".into()) {
            Some(TagWriteState::Failed { previous, error }) => {
                assert_eq!(previous, vec![rust()]);
                assert!(error.contains("forbidden"));
            }
            other => panic!("expected failed state, got {:?}", other),
        }
        assert_eq!(assigner.state(Role::Mentee, &"e2".into()), Some(TagWriteState::Confirmed));
        assert!(client.invalidations().iter().all(|(role, _)| *role == Role::Mentee));
    }

    #[tokio::test]
    async fn test_patch_visible_while_write_in_flight() {
        let (assigner, client, coordinator) = setup();
        client.set_write_delay(Some(Duration::from_millis(100)));

        let observe = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let tags = coordinator.read().await.dataset().mentees[0].tags.clone();
            (tags, assigner.state(Role::Mentee, &"e1".into()))
        };
        let id: PersonId = "e1".into();
        let (result, (seen, state)) =
            tokio::join!(assigner.assign_tags(&id, Role::Mentee, vec![rust()]), observe);

        assert!(result.is_ok());
        assert_eq!(seen, vec![rust()]);
        assert_eq!(state, Some(TagWriteState::PendingWrite(vec![])));
    }

    #[tokio::test]
    async fn test_refresh_during_write_keeps_confirmed_tags() {
        let (assigner, client, coordinator) = setup();
        client.set_write_delay(Some(Duration::from_millis(100)));
        let sync = SyncController::new(client.clone(), coordinator.clone());

        let refresh = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            sync.refresh(RefreshKind::Manual).await
        };
        let id: PersonId = "e1".into();
        let (result, outcome) = tokio::join!(assigner.assign_tags(&id, Role::Mentee, vec![go()]), refresh);

        // the refresh saw the server before the write landed
        assert_eq!(outcome, RefreshOutcome::Applied);
        assert_eq!(result.unwrap(), vec![go()]);
        assert_eq!(assigner.state(Role::Mentee, &"e1".into()), Some(TagWriteState::Confirmed));
        assert_eq!(coordinator.read().await.dataset().mentees[0].tags, vec![go()]);
    }

    #[tokio::test]
    async fn test_matching_confirmation_does_not_recompute() {
        let (assigner, _client, coordinator) = setup();
        assigner.assign_tags(&"e1".into(), Role::Mentee, vec![go()]).await.unwrap();
        let coordinator = coordinator.read().await;
        // the optimistic patch only
        assert_eq!(coordinator.workspace().recompute_count(), 2);
        assert_eq!(coordinator.confirmed_writes(), 1);
    }

    #[tokio::test]
    async fn test_unknown_person_is_not_written() {
        let (assigner, client, _coordinator) = setup();
        let err = assigner.assign_tags(&"zz".into(), Role::Mentor, vec![]).await.unwrap_err();
        assert!(matches!(err, MentorError::PersonNotFound { .. }));
        assert_eq!(assigner.state(Role::Mentor, &"zz".into()), None);
        assert!(client.invalidations().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_write_announces() {
        let (assigner, _client, _coordinator) = setup();
        let channel = MemoryChannel::new();
        let assigner = assigner.with_announcer(Some(Arc::new(Announcer::new(Arc::new(channel.clone())))));
        assigner.assign_tags(&"e1".into(), Role::Mentee, vec![go()]).await.unwrap();
        assert_eq!(channel.latest().await.unwrap().map(|m| m.seq), Some(1));
    }
}
