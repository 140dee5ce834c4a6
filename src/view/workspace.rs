//! The in-memory dataset and everything derived from it
//!
//! Single source of truth for all three views. Views read it; only tag
//! assignment (`patch_tags`) and a full sync replacement (`replace_dataset`)
//! write it, and both recompute derived state synchronously before returning.

use crate::error::{MentorError, MentorResult};
use crate::filter::{filter, FilterCriteria, FilteredView};
use crate::model::{Dataset, PersonId, RelationshipGraph, Role, Tag};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Workspace {
    dataset: Arc<Dataset>,
    graph: RelationshipGraph,
    criteria: FilterCriteria,
    filtered: Arc<FilteredView>,
    /// Bumped every time `filtered` is replaced
    generation: u64,
    /// Number of derived-state recomputations
    recompute_count: usize,
}

impl Workspace {
    pub fn new() -> Self {
        let dataset = Arc::new(Dataset::default());
        Self {
            graph: RelationshipGraph::build(Arc::clone(&dataset)),
            dataset,
            criteria: FilterCriteria::default(),
            filtered: Arc::new(FilteredView::default()),
            generation: 0,
            recompute_count: 0,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn graph(&self) -> &RelationshipGraph {
        &self.graph
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// The current filtered view. A new `Arc` is produced on every recompute,
    /// so `Arc::ptr_eq` against a previously held view detects replacement.
    pub fn filtered(&self) -> &Arc<FilteredView> {
        &self.filtered
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn recompute_count(&self) -> usize {
        self.recompute_count
    }

    /// Replace the dataset wholesale. Returns `false`, doing nothing, when the
    /// new dataset is structurally equal to the current one.
    pub fn replace_dataset(&mut self, dataset: Dataset) -> bool {
        if *self.dataset == dataset {
            return false;
        }
        self.dataset = Arc::new(dataset);
        self.recompute();
        true
    }

    /// Change filter criteria. Returns whether anything changed.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) -> bool {
        if self.criteria == criteria {
            return false;
        }
        self.criteria = criteria;
        self.refilter();
        true
    }

    /// Overwrite a person's tag set, returning the previous one
    pub fn patch_tags(&mut self, role: Role, id: &PersonId, tags: Vec<Tag>) -> MentorResult<Vec<Tag>> {
        let dataset = Arc::make_mut(&mut self.dataset);
        let slot = dataset
            .tags_of_mut(role, id)
            .ok_or_else(|| MentorError::PersonNotFound { role, id: id.clone() })?;
        let previous = std::mem::replace(slot, tags);
        self.recompute();
        Ok(previous)
    }

    fn recompute(&mut self) {
        self.graph = RelationshipGraph::build(Arc::clone(&self.dataset));
        self.recompute_count += 1;
        self.refilter();
    }

    fn refilter(&mut self) {
        self.filtered = Arc::new(filter(&self.dataset.mentors, &self.dataset.mentees, &self.criteria));
        self.generation += 1;
        debug!(
            generation = self.generation,
            mentors = self.filtered.mentors.len(),
            mentees = self.filtered.mentees.len(),
            "filtered view recomputed"
        );
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
