//! View layer
//!
//! Three interchangeable presentations (spider graph, table, gallery) over one
//! filtered dataset:
//! - [`workspace`]: the dataset, relationship graph and filtered view
//! - [`coordinator`]: load state, active mode and per-view transient state
//! - [`table`], [`gallery`], [`graph_view`]: the presentations

pub mod coordinator;
pub mod gallery;
pub mod graph_view;
pub mod table;
pub mod workspace;

use crate::bus::EventBus;
use crate::layout::GraphCommand;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub use coordinator::{Rendered, ViewCoordinator};
pub use gallery::GalleryCard;
pub use graph_view::{FrameNode, GraphFrame, GraphModule, GraphView};
pub use table::{MenteeRow, MentorRow, SortKey, TablePage, TableSort, TableState};
pub use workspace::Workspace;

/// Which presentation is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Spider,
    Table,
    Gallery,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Spider => "spider",
            ViewMode::Table => "table",
            ViewMode::Gallery => "gallery",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spider" | "graph" => Ok(ViewMode::Spider),
            "table" => Ok(ViewMode::Table),
            "gallery" => Ok(ViewMode::Gallery),
            other => Err(format!("unknown view mode '{}'", other)),
        }
    }
}

/// Load lifecycle of a session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Error(String),
}

impl LoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready)
    }
}

static GRAPH_COMMANDS: OnceLock<EventBus<GraphCommand>> = OnceLock::new();

/// The process-wide graph command bus
pub fn graph_command_bus() -> &'static EventBus<GraphCommand> {
    GRAPH_COMMANDS.get_or_init(EventBus::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_mode_parse() {
        assert_eq!("Gallery".parse::<ViewMode>().unwrap(), ViewMode::Gallery);
        assert_eq!("spider".parse::<ViewMode>().unwrap(), ViewMode::Spider);
        assert!("map".parse::<ViewMode>().is_err());
        assert_eq!(ViewMode::Table.to_string(), "table");
    }

    #[test]
    fn test_global_bus_is_shared() {
        let mut subscription = graph_command_bus().subscribe();
        graph_command_bus().publish(GraphCommand::Center);
        assert_eq!(subscription.try_next(), Some(GraphCommand::Center));
    }
}
