//! Sync/refresh controller
//!
//! Fetches both record lists, compares them structurally with the snapshot the
//! session holds and decides whether to apply, stage or ignore the result.

use super::channel::{Announcer, CrossTabChannel, Marker};
use super::SyncNotice;
use crate::bus::EventBus;
use crate::client::{fetch_dataset, MentorshipClient};
use crate::error::MentorResult;
use crate::model::Dataset;
use crate::view::ViewCoordinator;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Who asked for the refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    /// User action: changes apply immediately
    Manual,
    /// Poll: changes are staged behind a notice
    Background,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RefreshOutcome {
    /// Another refresh was already in flight
    Skipped,
    /// Server data matched the held snapshot
    Unchanged,
    Applied,
    /// Held for `apply_pending`
    Staged,
    Failed(String),
}

/// Clears the in-flight flag however the refresh ends
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(InFlight(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A background result waiting for the user
#[derive(Debug)]
struct Staged {
    dataset: Dataset,
    /// `ViewCoordinator::confirmed_writes` when fetched
    confirmed_writes: u64,
}

#[derive(Debug, Default)]
struct SyncState {
    pending: Option<Staged>,
    /// Last foreign marker acted on
    last_seen: Option<Marker>,
}

pub struct SyncController {
    client: Arc<dyn MentorshipClient>,
    coordinator: Arc<RwLock<ViewCoordinator>>,
    announcer: Option<Arc<Announcer>>,
    notices: EventBus<SyncNotice>,
    in_flight: AtomicBool,
    state: Mutex<SyncState>,
}

impl SyncController {
    pub fn new(client: Arc<dyn MentorshipClient>, coordinator: Arc<RwLock<ViewCoordinator>>) -> Self {
        Self {
            client,
            coordinator,
            announcer: None,
            notices: EventBus::new(),
            in_flight: AtomicBool::new(false),
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Join a cross-tab channel
    pub fn with_channel(mut self, channel: Arc<dyn CrossTabChannel>) -> Self {
        self.announcer = Some(Arc::new(Announcer::new(channel)));
        self
    }

    /// The session's marker writer, shared with tag assignment
    pub fn announcer(&self) -> Option<Arc<Announcer>> {
        self.announcer.clone()
    }

    pub fn coordinator(&self) -> &Arc<RwLock<ViewCoordinator>> {
        &self.coordinator
    }

    pub fn notices(&self) -> &EventBus<SyncNotice> {
        &self.notices
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn has_pending(&self) -> bool {
        self.state().pending.is_some()
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fetch from the collaborator and reconcile with the held snapshot.
    /// A request made while another is in flight is dropped.
    pub async fn refresh(&self, kind: RefreshKind) -> RefreshOutcome {
        self.run(kind, true).await
    }

    async fn run(&self, kind: RefreshKind, announce: bool) -> RefreshOutcome {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            debug!(?kind, "refresh already in flight, dropping request");
            return RefreshOutcome::Skipped;
        };

        let ready = self.coordinator.read().await.state().is_ready();
        if kind == RefreshKind::Background && !ready {
            debug!("session not ready, background refresh skipped");
            return RefreshOutcome::Skipped;
        }
        // markers written before this fetch are reflected in its result
        let baseline = if ready { None } else { self.current_marker().await };

        let dataset = match fetch_dataset(self.client.as_ref()).await {
            Ok(dataset) => dataset,
            Err(e) => {
                let message = e.user_message();
                match kind {
                    RefreshKind::Manual => self.coordinator.write().await.fail(message.clone()),
                    RefreshKind::Background => warn!(error = %e, "background refresh failed"),
                }
                return RefreshOutcome::Failed(message);
            }
        };

        let mut coordinator = self.coordinator.write().await;
        if !coordinator.state().is_ready() {
            // first load, or a retry out of the error state
            coordinator.apply_dataset(dataset);
            let mut state = self.state();
            state.pending = None;
            if baseline.is_some() {
                state.last_seen = baseline;
            }
            return RefreshOutcome::Applied;
        }

        if *coordinator.dataset() == dataset {
            debug!(?kind, "server data unchanged");
            // anything staged earlier is now obsolete
            let staged = self.state().pending.take().is_some();
            if kind == RefreshKind::Manual || (staged && coordinator.notice() == Some(SyncNotice::NewDataAvailable)) {
                coordinator.clear_notice();
            }
            return RefreshOutcome::Unchanged;
        }

        match kind {
            RefreshKind::Manual => {
                coordinator.apply_dataset(dataset);
                drop(coordinator);
                self.state().pending = None;
                if announce {
                    self.announce().await;
                }
                RefreshOutcome::Applied
            }
            RefreshKind::Background => {
                let confirmed_writes = coordinator.confirmed_writes();
                let repeat = {
                    let mut state = self.state();
                    let repeat = state.pending.as_ref().is_some_and(|staged| staged.dataset == dataset);
                    state.pending = Some(Staged {
                        dataset,
                        confirmed_writes,
                    });
                    repeat
                };
                if repeat {
                    debug!("same data already staged");
                    return RefreshOutcome::Staged;
                }
                coordinator.set_notice(SyncNotice::NewDataAvailable);
                drop(coordinator);
                info!("new data staged");
                self.notices.publish(SyncNotice::NewDataAvailable);
                RefreshOutcome::Staged
            }
        }
    }

    /// Apply a staged background result. Returns whether anything was applied.
    ///
    /// A result fetched before a tag write this session confirmed would undo
    /// that write, so it is fetched again instead.
    pub async fn apply_pending(&self) -> bool {
        let pending = self.state().pending.take();
        let Some(staged) = pending else {
            return false;
        };
        let mut coordinator = self.coordinator.write().await;
        if coordinator.confirmed_writes() == staged.confirmed_writes {
            coordinator.apply_dataset(staged.dataset);
            return true;
        }
        drop(coordinator);
        debug!("staged data predates a confirmed write, fetching again");
        self.run(RefreshKind::Manual, false).await == RefreshOutcome::Applied
    }

    /// Error state → Loading → fresh fetch
    pub async fn retry(&self) -> RefreshOutcome {
        if !self.coordinator.write().await.retry() {
            return RefreshOutcome::Skipped;
        }
        self.refresh(RefreshKind::Manual).await
    }

    /// Check the cross-tab marker. Returns whether another session changed
    /// the data since this one last looked.
    pub async fn poll_cross_tab(&self) -> MentorResult<bool> {
        let Some(announcer) = &self.announcer else {
            return Ok(false);
        };
        let Some(marker) = announcer.channel().latest().await? else {
            return Ok(false);
        };
        if marker.origin == announcer.origin() {
            return Ok(false);
        }
        {
            let mut state = self.state();
            if state.last_seen.as_ref() == Some(&marker) {
                return Ok(false);
            }
            state.last_seen = Some(marker);
        }

        info!("data changed in another session");
        self.coordinator.write().await.set_notice(SyncNotice::ChangedElsewhere);
        self.notices.publish(SyncNotice::ChangedElsewhere);
        Ok(true)
    }

    /// The user accepted the banner: re-fetch and apply
    pub async fn confirm_banner(&self) -> RefreshOutcome {
        self.state().pending = None;
        let outcome = self.run(RefreshKind::Manual, false).await;
        if outcome != RefreshOutcome::Skipped {
            self.coordinator.write().await.clear_notice();
        }
        outcome
    }

    async fn current_marker(&self) -> Option<Marker> {
        let announcer = self.announcer.as_ref()?;
        match announcer.channel().latest().await {
            Ok(marker) => marker,
            Err(e) => {
                warn!(error = %e, "failed to read cross-tab marker");
                None
            }
        }
    }

    /// Write the cross-tab marker, logging rather than failing
    pub async fn announce(&self) {
        if let Some(announcer) = &self.announcer {
            if let Err(e) = announcer.announce().await {
                warn!(error = %e, "failed to write cross-tab marker");
            }
        }
    }

    /// Poll in the background until the handle is aborted
    pub fn spawn_polling(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick fires immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.refresh(RefreshKind::Background).await;
                if let Err(e) = self.poll_cross_tab().await {
                    warn!(error = %e, "cross-tab poll failed");
                }
            }
        })
    }
}
