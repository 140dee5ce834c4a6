//! Layout engine with value-based change detection
//!
//! Layout is the expensive step of a refresh, so it only runs when the node set
//! or edges of the filtered view actually changed.

use super::spider::{spider_layout, GraphLayout, LayoutConfig, LayoutInput};
use crate::filter::FilteredView;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    input: Option<LayoutInput>,
    layout: GraphLayout,
    recompute_count: usize,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            input: None,
            layout: GraphLayout::default(),
            recompute_count: 0,
        }
    }

    /// Re-layout if the view differs by value from the last one laid out.
    /// Returns whether a layout pass ran.
    pub fn update(&mut self, view: &FilteredView) -> bool {
        let input = LayoutInput::from_view(view);
        if self.input.as_ref() == Some(&input) {
            debug!("layout input unchanged, skipping re-layout");
            return false;
        }
        self.layout = spider_layout(&input, &self.config);
        self.input = Some(input);
        self.recompute_count += 1;
        debug!(
            nodes = self.layout.node_count(),
            edges = self.layout.edges.len(),
            pass = self.recompute_count,
            "graph re-laid out"
        );
        true
    }

    pub fn layout(&self) -> &GraphLayout {
        &self.layout
    }

    /// Number of layout passes run so far
    pub fn recompute_count(&self) -> usize {
        self.recompute_count
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Change the spacing parameters. The next `update` always re-lays out.
    pub fn set_config(&mut self, config: LayoutConfig) {
        if config != self.config {
            self.config = config;
            self.input = None;
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mentee, Mentor, Tag};

    fn view() -> FilteredView {
        FilteredView {
            mentors: vec![Mentor::new("m1", "Asha")],
            mentees: vec![Mentee::new("e1", "Ben").with_mentor("m1")],
        }
    }

    #[test]
    fn test_unchanged_view_skips_layout() {
        let mut engine = LayoutEngine::default();
        assert!(engine.update(&view()));
        assert!(!engine.update(&view()));
        assert_eq!(engine.recompute_count(), 1);
    }

    #[test]
    fn test_tag_change_does_not_move_nodes() {
        let mut engine = LayoutEngine::default();
        engine.update(&view());
        let mut tagged = view();
        tagged.mentees[0].tags.push(Tag::new("t1", "rust", "#000"));
        tagged.mentors[0].name = "Asha R.".into();
        assert!(!engine.update(&tagged));
        assert_eq!(engine.recompute_count(), 1);
    }

    #[test]
    fn test_topology_change_relayouts() {
        let mut engine = LayoutEngine::default();
        engine.update(&view());
        let mut reassigned = view();
        reassigned.mentees[0].mentor = Default::default();
        assert!(engine.update(&reassigned));
        assert!(engine.layout().edges.is_empty());
        assert_eq!(engine.recompute_count(), 2);
    }

    #[test]
    fn test_config_change_forces_layout() {
        let mut engine = LayoutEngine::default();
        engine.update(&view());
        engine.set_config(LayoutConfig { spacing: 80.0, ..Default::default() });
        assert!(engine.update(&view()));
        assert_eq!(engine.config().spacing, 80.0);
    }
}
