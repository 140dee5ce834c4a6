//! Mentorgraph
//!
//! Mentorship relationship graph with synchronized graph, table and gallery
//! views. Flat mentor and mentee records become a forest of mentor-rooted stars,
//! one filter feeds every view, and polling refreshes, optimistic tag edits and
//! several open sessions stay coherent without a server push channel.
//!
//! # Architecture
//!
//! - [`model`]: records, normalized mentor references, the relationship graph
//! - [`filter`]: pure search/filter shared by all views
//! - [`layout`]: spider layout, viewport and graph commands
//! - [`view`]: load state, view modes and per-view transient state
//! - [`tags`]: optimistic tag assignment with rollback
//! - [`sync`]: manual/background refresh, diffing, cross-tab notification
//! - [`client`]: HTTP and in-memory collaborators
//!
//! ## Example Usage
//!
//! ```rust
//! use mentorgraph::{filter, Dataset, FilterCriteria, Mentee, Mentor, RelationshipGraph};
//! use std::sync::Arc;
//!
//! let dataset = Dataset::new(
//!     vec![Mentor::new("m1", "Asha").with_university("MIT")],
//!     vec![Mentee::new("e1", "Ben").with_mentor("m1"), Mentee::new("e2", "Cy")],
//! );
//!
//! let graph = RelationshipGraph::build(Arc::new(dataset.clone()));
//! assert_eq!(graph.degree(&"m1".into()), 1);
//! assert_eq!(graph.unassigned().len(), 1);
//!
//! let view = filter(&dataset.mentors, &dataset.mentees, &FilterCriteria::search("asha"));
//! assert_eq!(view.mentees.len(), 1);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod bus;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod layout;
pub mod model;
pub mod sync;
pub mod tags;
pub mod view;

// Re-export main types for convenience
pub use bus::{EventBus, Subscription};

pub use client::{fetch_dataset, InMemoryClient, MentorshipClient, RemoteClient, TagAssignment};

pub use config::{ApiConfig, Config, SyncConfig};

pub use error::{MentorError, MentorResult};

pub use filter::{filter, FilterCriteria, FilteredView, RoleScope};

pub use layout::{
    spider_layout, Bounds, GraphCommand, GraphLayout, LayoutConfig, LayoutEngine, Position,
    Viewport, ViewportConfig,
};

pub use model::{
    Dataset, Mentee, Mentor, MentorRef, NodeKey, Person, PersonId, RelationshipGraph, Role, Tag,
    TagId,
};

pub use sync::{
    CrossTabChannel, FileChannel, MemoryChannel, RefreshKind, RefreshOutcome, SyncController,
    SyncNotice,
};

pub use tags::{TagAssigner, TagWriteState};

pub use view::{graph_command_bus, LoadState, Rendered, ViewCoordinator, ViewMode};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
