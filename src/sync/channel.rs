//! Cross-tab change notification
//!
//! Sessions share a single marker value. Writing a new marker tells every other
//! session the server data changed; the marker itself carries no data.

use crate::error::MentorResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};
use uuid::Uuid;

/// The shared marker value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Session that wrote it
    pub origin: Uuid,
    /// Per-origin write counter
    pub seq: u64,
    pub written_at: DateTime<Utc>,
}

/// Storage for the single marker key
#[async_trait]
pub trait CrossTabChannel: Send + Sync {
    /// Overwrite the marker
    async fn publish(&self, marker: &Marker) -> MentorResult<()>;

    /// Current marker, if any session has written one
    async fn latest(&self) -> MentorResult<Option<Marker>>;
}

/// Channel shared by sessions in the same process. Clones share the marker.
#[derive(Debug, Clone)]
pub struct MemoryChannel {
    sender: Arc<watch::Sender<Option<Marker>>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender: Arc::new(sender) }
    }

    /// Receiver that wakes on every marker write
    pub fn watch(&self) -> watch::Receiver<Option<Marker>> {
        self.sender.subscribe()
    }
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrossTabChannel for MemoryChannel {
    async fn publish(&self, marker: &Marker) -> MentorResult<()> {
        self.sender.send_replace(Some(marker.clone()));
        Ok(())
    }

    async fn latest(&self) -> MentorResult<Option<Marker>> {
        Ok(self.sender.borrow().clone())
    }
}

/// Channel backed by a JSON file, shared by processes on one machine
#[derive(Debug, Clone)]
pub struct FileChannel {
    path: PathBuf,
}

impl FileChannel {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CrossTabChannel for FileChannel {
    async fn publish(&self, marker: &Marker) -> MentorResult<()> {
        let body = serde_json::to_vec(marker)?;
        // write-then-rename so readers never see a partial marker
        let staging = self.path.with_extension(format!("{}.tmp", marker.origin));
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        debug!(path = %self.path.display(), seq = marker.seq, "marker written");
        Ok(())
    }

    async fn latest(&self) -> MentorResult<Option<Marker>> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&body) {
            Ok(marker) => Ok(Some(marker)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable marker");
                Ok(None)
            }
        }
    }
}

/// Writes markers on behalf of one session
pub struct Announcer {
    origin: Uuid,
    seq: AtomicU64,
    channel: Arc<dyn CrossTabChannel>,
}

impl Announcer {
    pub fn new(channel: Arc<dyn CrossTabChannel>) -> Self {
        Self {
            origin: Uuid::new_v4(),
            seq: AtomicU64::new(0),
            channel,
        }
    }

    /// This session's identity
    pub fn origin(&self) -> Uuid {
        self.origin
    }

    pub fn channel(&self) -> &Arc<dyn CrossTabChannel> {
        &self.channel
    }

    /// Tell other sessions the server data changed
    pub async fn announce(&self) -> MentorResult<Marker> {
        let marker = Marker {
            origin: self.origin,
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
            written_at: Utc::now(),
        };
        self.channel.publish(&marker).await?;
        Ok(marker)
    }
}

impl std::fmt::Debug for Announcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Announcer")
            .field("origin", &self.origin)
            .field("seq", &self.seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_channel_shared_by_clones() {
        let channel = MemoryChannel::new();
        let other = channel.clone();
        let mut watcher = other.watch();
        assert_eq!(other.latest().await.unwrap(), None);

        let announcer = Announcer::new(Arc::new(channel));
        let first = announcer.announce().await.unwrap();
        let second = announcer.announce().await.unwrap();
        assert_eq!((first.seq, second.seq), (1, 2));

        assert!(watcher.has_changed().unwrap());
        assert_eq!(other.latest().await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_file_channel() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marker.json");
        let reader = FileChannel::new(&path);
        assert_eq!(reader.latest().await.unwrap(), None);

        let announcer = Announcer::new(Arc::new(FileChannel::new(&path)));
        let marker = announcer.announce().await.unwrap();
        assert_eq!(reader.latest().await.unwrap(), Some(marker));

        std::fs::write(&path, b"not json").unwrap();
        assert_eq!(reader.latest().await.unwrap(), None);
    }
}
