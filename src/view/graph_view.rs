//! Spider graph presentation
//!
//! Owns the layout engine, the pan/zoom viewport and the selection. Listens on
//! the graph command bus for as long as it is loaded.

use crate::bus::{EventBus, Subscription};
use crate::filter::FilteredView;
use crate::layout::{Bounds, GraphCommand, LayoutConfig, LayoutEngine, Position, Viewport, ViewportConfig};
use crate::model::{Dataset, NodeKey, RelationshipGraph, Role};
use serde::Serialize;
use tracing::debug;

/// Lazily loaded graph module
#[derive(Debug, Default)]
pub enum GraphModule {
    #[default]
    NotLoaded,
    /// Requested; the next render completes the load
    Loading,
    Loaded(Box<GraphView>),
}

impl GraphModule {
    pub fn is_loaded(&self) -> bool {
        matches!(self, GraphModule::Loaded(_))
    }

    pub fn view(&self) -> Option<&GraphView> {
        match self {
            GraphModule::Loaded(view) => Some(view),
            _ => None,
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut GraphView> {
        match self {
            GraphModule::Loaded(view) => Some(view),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameNode {
    pub key: NodeKey,
    pub label: String,
    /// Screen-space center
    pub position: Position,
    /// Screen-space radius
    pub radius: f32,
    pub selected: bool,
}

/// A screen-space snapshot of the graph, ready to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphFrame {
    pub nodes: Vec<FrameNode>,
    pub edges: Vec<(Position, Position)>,
    pub scale: f32,
    pub translate: Position,
}

#[derive(Debug)]
pub struct GraphView {
    engine: LayoutEngine,
    viewport: Viewport,
    selection: Option<NodeKey>,
    commands: Subscription<GraphCommand>,
}

impl GraphView {
    /// Load the view and subscribe it to the command bus
    pub fn load(layout: LayoutConfig, viewport: ViewportConfig, bus: &EventBus<GraphCommand>) -> Self {
        debug!("graph view loaded");
        Self {
            engine: LayoutEngine::new(layout),
            viewport: Viewport::new(viewport),
            selection: None,
            commands: bus.subscribe(),
        }
    }

    pub fn engine(&self) -> &LayoutEngine {
        &self.engine
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn bounds(&self) -> &Bounds {
        &self.engine.layout().bounds
    }

    /// Feed the current filtered view to the layout engine
    pub fn sync(&mut self, view: &FilteredView) -> bool {
        self.engine.update(view)
    }

    /// Apply every command published since the last call
    pub fn process_commands(&mut self) -> usize {
        let commands = self.commands.drain();
        for command in &commands {
            debug!(%command, "applying graph command");
            let bounds = self.engine.layout().bounds;
            self.viewport.apply(*command, &bounds);
        }
        commands.len()
    }

    /// Drop commands published while the view was inactive
    pub fn discard_commands(&mut self) -> usize {
        self.commands.drain().len()
    }

    pub fn selection(&self) -> Option<&NodeKey> {
        self.selection.as_ref()
    }

    /// Select a laid-out node. Unknown keys leave the selection unchanged.
    pub fn select(&mut self, key: NodeKey) -> bool {
        if self.engine.layout().nodes.contains_key(&key) {
            self.selection = Some(key);
            true
        } else {
            false
        }
    }

    /// Select whatever node is under a screen point, or clear the selection
    pub fn select_at(&mut self, screen: Position) -> Option<&NodeKey> {
        let world = self.viewport.screen_to_world(screen);
        self.selection = self.engine.layout().node_at(world).cloned();
        self.selection.as_ref()
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Drop the selection if its entity left the dataset
    pub fn prune(&mut self, dataset: &Dataset) {
        if let Some(key) = &self.selection {
            if !dataset.contains(key) {
                self.selection = None;
            }
        }
    }

    pub fn frame(&self, graph: &RelationshipGraph) -> GraphFrame {
        let layout = self.engine.layout();
        let scale = self.viewport.scale();
        let nodes = layout
            .nodes
            .iter()
            .map(|(key, node)| {
                let label = match key.role {
                    Role::Mentor => graph.mentor(&key.id).map(|m| m.name.clone()),
                    Role::Mentee => graph.mentee(&key.id).map(|m| m.name.clone()),
                };
                FrameNode {
                    key: key.clone(),
                    label: label.unwrap_or_else(|| key.id.to_string()),
                    position: self.viewport.world_to_screen(node.position),
                    radius: node.radius * scale,
                    selected: self.selection.as_ref() == Some(key),
                }
            })
            .collect();

        let edges = layout
            .edges
            .iter()
            .filter_map(|(from, to)| {
                let from = layout.position(from)?;
                let to = layout.position(to)?;
                Some((self.viewport.world_to_screen(from), self.viewport.world_to_screen(to)))
            })
            .collect();

        GraphFrame {
            nodes,
            edges,
            scale,
            translate: self.viewport.translate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mentee, Mentor};
    use std::sync::Arc;

    fn dataset() -> Dataset {
        Dataset::new(
            vec![Mentor::new("m1", "Asha")],
            vec![Mentee::new("e1", "Ben").with_mentor("m1"), Mentee::new("e2", "Cy")],
        )
    }

    fn loaded(bus: &EventBus<GraphCommand>) -> GraphView {
        let dataset = dataset();
        let mut view = GraphView::load(LayoutConfig::default(), ViewportConfig::default(), bus);
        view.sync(&FilteredView {
            mentors: dataset.mentors,
            mentees: dataset.mentees,
        });
        view
    }

    #[test]
    fn test_commands_apply_to_viewport() {
        let bus = EventBus::new();
        let mut view = loaded(&bus);
        bus.publish(GraphCommand::ZoomIn);
        bus.publish(GraphCommand::ZoomIn);
        assert_eq!(view.process_commands(), 2);
        assert!((view.viewport().scale() - 1.44).abs() < 1e-4);

        bus.publish(GraphCommand::Reset);
        view.process_commands();
        assert!(view.viewport().is_default());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = EventBus::<GraphCommand>::new();
        let view = loaded(&bus);
        assert_eq!(bus.subscriber_count(), 1);
        drop(view);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(GraphCommand::Fit), 0);
    }

    #[test]
    fn test_selection() {
        let bus = EventBus::new();
        let mut view = loaded(&bus);
        assert!(view.select(NodeKey::mentee("e1")));
        assert!(!view.select(NodeKey::mentee("nobody")));
        assert_eq!(view.selection(), Some(&NodeKey::mentee("e1")));

        let mentor = view.engine().layout().position(&NodeKey::mentor("m1")).unwrap();
        let screen = view.viewport().world_to_screen(mentor);
        assert_eq!(view.select_at(screen), Some(&NodeKey::mentor("m1")));

        view.prune(&Dataset::new(vec![], dataset().mentees));
        assert_eq!(view.selection(), None);
    }

    #[test]
    fn test_frame_labels_and_scale() {
        let bus = EventBus::new();
        let mut view = loaded(&bus);
        let graph = RelationshipGraph::build(Arc::new(dataset()));
        view.viewport_mut().zoom_by(2.0);
        view.select(NodeKey::mentor("m1"));

        let frame = view.frame(&graph);
        assert_eq!(frame.nodes.len(), 3);
        assert_eq!(frame.edges.len(), 1);
        let mentor = frame.nodes.iter().find(|n| n.key == NodeKey::mentor("m1")).unwrap();
        assert_eq!(mentor.label, "Asha");
        assert!(mentor.selected);
        assert_eq!(mentor.radius, LayoutConfig::default().mentor_radius * 2.0);
    }
}
