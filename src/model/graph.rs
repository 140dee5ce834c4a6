//! Relationship graph derived from the flat mentor/mentee lists
//!
//! The graph is a forest of stars: every mentor is the root of a star whose
//! leaves are its mentees, and mentees whose reference is absent or does not
//! resolve are isolated nodes. Edges are derived, never stored by the API.

use super::record::{Dataset, Mentee, Mentor};
use super::types::{NodeKey, PersonId};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::Arc;

/// A derived mentee → mentor association
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RelationshipEdge {
    pub mentor: PersonId,
    pub mentee: PersonId,
}

impl RelationshipEdge {
    pub fn source(&self) -> NodeKey {
        NodeKey::mentor(self.mentor.clone())
    }

    pub fn target(&self) -> NodeKey {
        NodeKey::mentee(self.mentee.clone())
    }
}

/// Graph statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStatistics {
    pub mentor_count: usize,
    pub mentee_count: usize,
    pub edge_count: usize,
    /// Mentees without a resolvable mentor
    pub unassigned_count: usize,
    /// Largest number of mentees attached to a single mentor
    pub max_degree: usize,
}

/// Navigable view over a dataset.
///
/// Uses index tables for O(1) lookup:
/// - mentor_index: mentor id -> position in `dataset.mentors`
/// - mentee_index: mentee id -> position in `dataset.mentees`
/// - mentees_by_mentor: mentor position -> mentee positions (dataset order)
/// - mentor_of: mentee position -> resolved mentor position
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    dataset: Arc<Dataset>,
    mentor_index: FxHashMap<PersonId, usize>,
    mentee_index: FxHashMap<PersonId, usize>,
    mentees_by_mentor: Vec<Vec<usize>>,
    mentor_of: Vec<Option<usize>>,
}

impl RelationshipGraph {
    /// Build the graph. Unresolvable references simply produce no edge.
    pub fn build(dataset: Arc<Dataset>) -> Self {
        let mentor_index: FxHashMap<PersonId, usize> = dataset
            .mentors
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();
        let mentee_index: FxHashMap<PersonId, usize> = dataset
            .mentees
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id.clone(), i))
            .collect();

        let mut mentees_by_mentor = vec![Vec::new(); dataset.mentors.len()];
        let mut mentor_of = Vec::with_capacity(dataset.mentees.len());
        for (i, mentee) in dataset.mentees.iter().enumerate() {
            let resolved = mentee.mentor.id().and_then(|id| mentor_index.get(id).copied());
            if let Some(m) = resolved {
                mentees_by_mentor[m].push(i);
            }
            mentor_of.push(resolved);
        }

        RelationshipGraph {
            dataset,
            mentor_index,
            mentee_index,
            mentees_by_mentor,
            mentor_of,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn mentor(&self, id: &PersonId) -> Option<&Mentor> {
        self.mentor_index.get(id).map(|&i| &self.dataset.mentors[i])
    }

    pub fn mentee(&self, id: &PersonId) -> Option<&Mentee> {
        self.mentee_index.get(id).map(|&i| &self.dataset.mentees[i])
    }

    /// Resolved mentees of a mentor, in dataset order. Unknown mentors have none.
    pub fn mentees_of(&self, mentor_id: &PersonId) -> Vec<&Mentee> {
        match self.mentor_index.get(mentor_id) {
            Some(&m) => self.mentees_by_mentor[m]
                .iter()
                .map(|&i| &self.dataset.mentees[i])
                .collect(),
            None => Vec::new(),
        }
    }

    /// Resolved mentor of a mentee, or `None` when unassigned or unresolvable
    pub fn mentor_of(&self, mentee_id: &PersonId) -> Option<&Mentor> {
        let i = *self.mentee_index.get(mentee_id)?;
        self.mentor_of[i].map(|m| &self.dataset.mentors[m])
    }

    /// Number of mentees attached to a mentor
    pub fn degree(&self, mentor_id: &PersonId) -> usize {
        self.mentor_index
            .get(mentor_id)
            .map(|&m| self.mentees_by_mentor[m].len())
            .unwrap_or(0)
    }

    /// Mentees without a resolvable mentor
    pub fn unassigned(&self) -> Vec<&Mentee> {
        self.dataset
            .mentees
            .iter()
            .zip(&self.mentor_of)
            .filter(|(_, resolved)| resolved.is_none())
            .map(|(mentee, _)| mentee)
            .collect()
    }

    /// All derived edges, grouped by mentor in dataset order
    pub fn edges(&self) -> Vec<RelationshipEdge> {
        self.mentees_by_mentor
            .iter()
            .enumerate()
            .flat_map(|(m, mentees)| {
                mentees.iter().map(move |&i| RelationshipEdge {
                    mentor: self.dataset.mentors[m].id.clone(),
                    mentee: self.dataset.mentees[i].id.clone(),
                })
            })
            .collect()
    }

    pub fn statistics(&self) -> GraphStatistics {
        let edge_count = self.mentor_of.iter().filter(|m| m.is_some()).count();
        GraphStatistics {
            mentor_count: self.dataset.mentors.len(),
            mentee_count: self.dataset.mentees.len(),
            edge_count,
            unassigned_count: self.dataset.mentees.len() - edge_count,
            max_degree: self.mentees_by_mentor.iter().map(Vec::len).max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::{MentorRef, MentorSummary};

    fn dataset() -> Arc<Dataset> {
        let mentors = vec![Mentor::new("m1", "Asha"), Mentor::new("m2", "Dev")];
        let mut e2 = Mentee::new("e2", "Cy");
        e2.mentor = MentorRef::Embedded(MentorSummary {
            id: "m1".into(),
            name: None,
            email: None,
            university: None,
        });
        let mentees = vec![
            Mentee::new("e1", "Ben").with_mentor("m1"),
            e2,
            Mentee::new("e3", "Dee"),
            Mentee::new("e4", "Eve").with_mentor("ghost"),
        ];
        Arc::new(Dataset::new(mentors, mentees))
    }

    #[test]
    fn test_reference_shape_independence() {
        let graph = RelationshipGraph::build(dataset());
        let via_id = graph.mentor_of(&"e1".into()).unwrap();
        let via_object = graph.mentor_of(&"e2".into()).unwrap();
        assert_eq!(via_id.id, PersonId::new("m1"));
        assert_eq!(via_object.id, PersonId::new("m1"));

        let names: Vec<&str> = graph.mentees_of(&"m1".into()).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Ben", "Cy"]);
    }

    #[test]
    fn test_unassigned_and_unresolved() {
        let graph = RelationshipGraph::build(dataset());
        assert!(graph.mentor_of(&"e3".into()).is_none());
        assert!(graph.mentor_of(&"e4".into()).is_none());
        assert!(graph.mentor_of(&"missing".into()).is_none());

        let unassigned: Vec<&str> = graph.unassigned().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(unassigned, vec!["e3", "e4"]);
    }

    #[test]
    fn test_degree_and_statistics() {
        let graph = RelationshipGraph::build(dataset());
        assert_eq!(graph.degree(&"m1".into()), 2);
        assert_eq!(graph.degree(&"m2".into()), 0);
        assert_eq!(graph.degree(&"nobody".into()), 0);
        assert!(graph.mentees_of(&"nobody".into()).is_empty());

        let stats = graph.statistics();
        assert_eq!(stats.mentor_count, 2);
        assert_eq!(stats.mentee_count, 4);
        assert_eq!(stats.edge_count, 2);
        assert_eq!(stats.unassigned_count, 2);
        assert_eq!(stats.max_degree, 2);
    }

    #[test]
    fn test_edges() {
        let graph = RelationshipGraph::build(dataset());
        let edges = graph.edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].source(), NodeKey::mentor("m1"));
        assert_eq!(edges[1].target(), NodeKey::mentee("e2"));
    }
}
