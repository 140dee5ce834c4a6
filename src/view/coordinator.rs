//! ViewCoordinator: one session's views over the shared workspace
//!
//! Holds the load state, the active presentation and each presentation's
//! transient state. Every mutation recomputes derived state before returning,
//! so a `render` right after always reflects it.

use super::gallery::{cards, GalleryCard};
use super::graph_view::{GraphFrame, GraphModule, GraphView};
use super::table::{TablePage, TableSort, TableState};
use super::workspace::Workspace;
use super::{graph_command_bus, LoadState, ViewMode};
use crate::bus::EventBus;
use crate::config::Config;
use crate::error::MentorResult;
use crate::filter::FilterCriteria;
use crate::layout::{GraphCommand, LayoutConfig, ViewportConfig};
use crate::model::{Dataset, NodeKey, PersonId, Role, Tag};
use crate::sync::SyncNotice;
use serde::Serialize;
use tracing::{debug, info, warn};

/// What the active presentation shows right now
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "body", rename_all = "camelCase")]
pub enum Rendered {
    Loading,
    Error { message: String },
    Table(TablePage),
    Gallery(Vec<GalleryCard>),
    /// Placeholder while the graph module loads
    GraphLoading,
    Graph(GraphFrame),
}

#[derive(Debug)]
pub struct ViewCoordinator {
    state: LoadState,
    mode: ViewMode,
    workspace: Workspace,
    table: TableState,
    graph: GraphModule,
    layout_config: LayoutConfig,
    viewport_config: ViewportConfig,
    commands: EventBus<GraphCommand>,
    notice: Option<SyncNotice>,
    /// Server writes confirmed by this session
    confirmed_writes: u64,
}

impl ViewCoordinator {
    /// A coordinator listening on the process-wide graph command bus
    pub fn new(config: &Config) -> Self {
        Self::with_bus(config, graph_command_bus().clone())
    }

    pub fn with_bus(config: &Config, commands: EventBus<GraphCommand>) -> Self {
        Self {
            state: LoadState::Loading,
            mode: ViewMode::default(),
            workspace: Workspace::new(),
            table: TableState::default(),
            graph: GraphModule::NotLoaded,
            layout_config: config.layout.clone(),
            viewport_config: config.viewport.clone(),
            commands,
            notice: None,
            confirmed_writes: 0,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn dataset(&self) -> &Dataset {
        self.workspace.dataset()
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    pub fn graph(&self) -> &GraphModule {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphModule {
        &mut self.graph
    }

    pub fn commands(&self) -> &EventBus<GraphCommand> {
        &self.commands
    }

    pub fn notice(&self) -> Option<SyncNotice> {
        self.notice
    }

    pub fn set_notice(&mut self, notice: SyncNotice) {
        self.notice = Some(notice);
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn begin_loading(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Install a fetched dataset and enter `Ready`. Returns whether the dataset
    /// differed from the one already held.
    pub fn apply_dataset(&mut self, dataset: Dataset) -> bool {
        let changed = self.workspace.replace_dataset(dataset);
        if changed {
            let dataset = self.workspace.dataset();
            self.table.prune(dataset);
            if let Some(view) = self.graph.view_mut() {
                view.prune(dataset);
            }
            self.sync_graph();
            info!(
                mentors = self.workspace.dataset().mentors.len(),
                mentees = self.workspace.dataset().mentees.len(),
                "dataset applied"
            );
        }
        self.state = LoadState::Ready;
        self.notice = None;
        changed
    }

    /// Enter the error state
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "load failed");
        self.state = LoadState::Error(message);
    }

    /// Leave the error state. Returns `false` unless currently in `Error`.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, LoadState::Error(_)) {
            self.state = LoadState::Loading;
            true
        } else {
            false
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        self.workspace.criteria()
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        let changed = self.workspace.set_criteria(criteria);
        if changed {
            self.sync_graph();
        }
        changed
    }

    /// Switch presentation. Never fetches; entering spider mode for the first
    /// time requests the graph module.
    pub fn set_mode(&mut self, mode: ViewMode) {
        if mode == self.mode {
            return;
        }
        debug!(from = %self.mode, to = %mode, "view mode changed");
        // commands only reach the graph while it is the active view
        if let Some(view) = self.graph.view_mut() {
            view.discard_commands();
        }
        if mode == ViewMode::Spider && matches!(self.graph, GraphModule::NotLoaded) {
            self.graph = GraphModule::Loading;
        }
        self.mode = mode;
    }

    /// Finish loading the graph module if it was requested or never loaded
    pub fn load_graph(&mut self) {
        if self.graph.is_loaded() {
            return;
        }
        let mut view = GraphView::load(self.layout_config.clone(), self.viewport_config.clone(), &self.commands);
        view.sync(self.workspace.filtered());
        self.graph = GraphModule::Loaded(Box::new(view));
    }

    /// Tear the graph view down, releasing its bus subscription
    pub fn unload_graph(&mut self) {
        self.graph = GraphModule::NotLoaded;
    }

    pub fn toggle_expanded(&mut self, mentor_id: &PersonId) -> bool {
        self.table.toggle(mentor_id)
    }

    pub fn set_sort(&mut self, sort: TableSort) {
        self.table.set_sort(sort);
    }

    /// Select a graph node. Fails when the graph is not loaded or the node is
    /// not laid out.
    pub fn select(&mut self, key: NodeKey) -> bool {
        self.graph.view_mut().map(|view| view.select(key)).unwrap_or(false)
    }

    /// Overwrite a person's tags in the workspace, returning the previous set
    pub fn patch_tags(&mut self, role: Role, id: &PersonId, tags: Vec<Tag>) -> MentorResult<Vec<Tag>> {
        let previous = self.workspace.patch_tags(role, id, tags)?;
        self.sync_graph();
        Ok(previous)
    }

    /// Settle a person's tags on the list the server confirmed, patching the
    /// workspace only when it shows something else. Returns whether it patched.
    pub fn confirm_tags(&mut self, role: Role, id: &PersonId, tags: Vec<Tag>) -> MentorResult<bool> {
        self.confirmed_writes += 1;
        if self.workspace.dataset().tags_of(role, id) == Some(tags.as_slice()) {
            return Ok(false);
        }
        self.patch_tags(role, id, tags)?;
        Ok(true)
    }

    /// Count of confirmed server writes. Data fetched before a bump may
    /// predate that write.
    pub fn confirmed_writes(&self) -> u64 {
        self.confirmed_writes
    }

    /// Apply pending bus commands to the graph, if it is the active view
    pub fn handle_graph_commands(&mut self) -> usize {
        if self.mode != ViewMode::Spider {
            return 0;
        }
        self.graph.view_mut().map(GraphView::process_commands).unwrap_or(0)
    }

    pub fn render(&mut self) -> Rendered {
        match &self.state {
            LoadState::Loading => return Rendered::Loading,
            LoadState::Error(message) => return Rendered::Error { message: message.clone() },
            LoadState::Ready => {}
        }

        match self.mode {
            ViewMode::Table => Rendered::Table(self.table.rows(self.workspace.graph(), self.workspace.filtered())),
            ViewMode::Gallery => Rendered::Gallery(cards(self.workspace.graph(), self.workspace.filtered())),
            ViewMode::Spider => {
                if !self.graph.is_loaded() {
                    self.load_graph();
                    return Rendered::GraphLoading;
                }
                self.handle_graph_commands();
                match self.graph.view() {
                    Some(view) => Rendered::Graph(view.frame(self.workspace.graph())),
                    None => Rendered::GraphLoading,
                }
            }
        }
    }

    fn sync_graph(&mut self) {
        if let Some(view) = self.graph.view_mut() {
            view.sync(self.workspace.filtered());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mentee, Mentor};

    fn coordinator() -> (ViewCoordinator, EventBus<GraphCommand>) {
        let bus = EventBus::new();
        (ViewCoordinator::with_bus(&Config::default(), bus.clone()), bus)
    }

    fn dataset() -> Dataset {
        Dataset::new(
            vec![Mentor::new("m1", "Asha"), Mentor::new("m2", "Dev")],
            vec![Mentee::new("e1", "Ben").with_mentor("m1"), Mentee::new("e2", "Cy")],
        )
    }

    #[test]
    fn test_load_state_transitions() {
        let (mut coordinator, _bus) = coordinator();
        assert_eq!(coordinator.render(), Rendered::Loading);
        assert!(!coordinator.retry());

        coordinator.fail("connection refused");
        assert_eq!(
            coordinator.render(),
            Rendered::Error { message: "connection refused".into() }
        );
        assert!(coordinator.retry());
        assert_eq!(coordinator.state(), &LoadState::Loading);

        assert!(coordinator.apply_dataset(dataset()));
        assert_eq!(coordinator.state(), &LoadState::Ready);
    }

    #[test]
    fn test_graph_module_loads_lazily() {
        let (mut coordinator, bus) = coordinator();
        coordinator.set_mode(ViewMode::Table);
        coordinator.apply_dataset(dataset());
        assert!(matches!(coordinator.render(), Rendered::Table(_)));
        assert_eq!(bus.subscriber_count(), 0);

        coordinator.set_mode(ViewMode::Spider);
        assert!(matches!(coordinator.graph(), GraphModule::Loading));
        assert_eq!(coordinator.render(), Rendered::GraphLoading);
        assert_eq!(bus.subscriber_count(), 1);

        match coordinator.render() {
            Rendered::Graph(frame) => assert_eq!(frame.nodes.len(), 4),
            other => panic!("expected graph, got {:?}", other),
        }

        coordinator.unload_graph();
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_commands_reach_only_active_graph() {
        let (mut coordinator, bus) = coordinator();
        coordinator.apply_dataset(dataset());
        coordinator.load_graph();

        coordinator.set_mode(ViewMode::Gallery);
        bus.publish(GraphCommand::ZoomIn);
        assert_eq!(coordinator.handle_graph_commands(), 0);

        coordinator.set_mode(ViewMode::Spider);
        bus.publish(GraphCommand::ZoomOut);
        assert_eq!(coordinator.handle_graph_commands(), 1);
        let scale = coordinator.graph().view().unwrap().viewport().scale();
        assert!((scale - 1.0 / 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_view_state_survives_refresh_when_entity_exists() {
        let (mut coordinator, _bus) = coordinator();
        coordinator.apply_dataset(dataset());
        coordinator.load_graph();
        coordinator.toggle_expanded(&"m1".into());
        coordinator.toggle_expanded(&"m2".into());
        assert!(coordinator.select(NodeKey::mentor("m2")));
        coordinator.graph_mut().view_mut().unwrap().viewport_mut().pan(30.0, 0.0);

        let mut next = dataset();
        next.mentors.retain(|m| m.id.as_str() != "m2");
        assert!(coordinator.apply_dataset(next));

        assert!(coordinator.table().is_expanded(&"m1".into()));
        assert!(!coordinator.table().is_expanded(&"m2".into()));
        let view = coordinator.graph().view().unwrap();
        assert_eq!(view.selection(), None);
        assert_eq!(view.viewport().translate().x, 30.0);
    }

    #[test]
    fn test_filter_applies_to_every_mode() {
        let (mut coordinator, _bus) = coordinator();
        coordinator.apply_dataset(dataset());
        coordinator.set_criteria(FilterCriteria::search("asha"));

        coordinator.set_mode(ViewMode::Gallery);
        match coordinator.render() {
            Rendered::Gallery(cards) => assert_eq!(cards.len(), 2),
            other => panic!("expected gallery, got {:?}", other),
        }
        coordinator.set_mode(ViewMode::Table);
        match coordinator.render() {
            Rendered::Table(page) => {
                assert_eq!(page.mentors.len(), 1);
                assert_eq!(page.mentees.len(), 1);
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_patch_tags_keeps_layout() {
        let (mut coordinator, _bus) = coordinator();
        coordinator.apply_dataset(dataset());
        coordinator.load_graph();
        coordinator
            .patch_tags(Role::Mentor, &"m1".into(), vec![Tag::new("t1", "rust", "#000")])
            .unwrap();
        assert_eq!(coordinator.dataset().mentors[0].tags.len(), 1);
        assert_eq!(coordinator.graph().view().unwrap().engine().recompute_count(), 1);
    }
}
