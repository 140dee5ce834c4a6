//! Refresh and cross-session synchronization
//!
//! - [`controller`]: manual and periodic refresh with structural diffing
//! - [`channel`]: the cross-tab marker and its in-process and file backends

pub mod channel;
pub mod controller;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use channel::{Announcer, CrossTabChannel, FileChannel, Marker, MemoryChannel};
pub use controller::{RefreshKind, RefreshOutcome, SyncController};

/// Banner-worthy sync events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncNotice {
    /// A background refresh staged newer data
    NewDataAvailable,
    /// Another session reported a change on the server
    ChangedElsewhere,
}

impl SyncNotice {
    pub fn message(&self) -> &'static str {
        match self {
            SyncNotice::NewDataAvailable => "New data is available. Apply it to update the views.",
            SyncNotice::ChangedElsewhere => "Data was changed in another session. Refresh to load it.",
        }
    }
}

impl fmt::Display for SyncNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
