//! Relationship model
//!
//! Mentor and mentee records, the normalized mentor reference, and the derived
//! relationship graph.

pub mod graph;
pub mod record;
pub mod types;

pub use graph::{GraphStatistics, RelationshipEdge, RelationshipGraph};
pub use record::{Dataset, Mentee, Mentor, MentorRef, MentorSummary, Person, Tag};
pub use types::{NodeKey, PersonId, Role, TagId};
