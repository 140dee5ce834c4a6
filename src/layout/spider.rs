//! Radial ("spider") layout
//!
//! Mentors sit on a grid of clusters. Each mentor's mentees are spread evenly on
//! a ring around it, and the ring grows with the mentee count so neighbouring
//! mentees stay at least `spacing` apart along the arc. Mentees without a
//! mentor in the current view float in a band below the clusters.

use super::{Bounds, Position};
use crate::filter::FilteredView;
use crate::model::{NodeKey, PersonId};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Convert a count to f32 for layout math. Datasets stay in the low thousands
/// of nodes, well inside f32's exact integer range.
#[inline]
fn f(n: usize) -> f32 {
    n as f32
}

/// Layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Minimum arc distance between neighbouring mentees on a ring
    pub spacing: f32,
    /// Smallest ring radius, used for mentors with few mentees
    pub min_ring_radius: f32,
    /// Empty space between neighbouring clusters
    pub cluster_gap: f32,
    /// Distance between free-floating (unassigned) mentees
    pub free_spacing: f32,
    pub mentor_radius: f32,
    pub mentee_radius: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            spacing: 48.0,
            min_ring_radius: 90.0,
            cluster_gap: 60.0,
            free_spacing: 56.0,
            mentor_radius: 24.0,
            mentee_radius: 14.0,
        }
    }
}

impl LayoutConfig {
    /// Ring radius for a mentor with `count` mentees
    pub fn ring_radius(&self, count: usize) -> f32 {
        if count == 0 {
            return 0.0;
        }
        (self.spacing * f(count) / TAU).max(self.min_ring_radius)
    }

    /// Angle between neighbouring mentees on a ring of `count`
    pub fn angular_step(&self, count: usize) -> f32 {
        if count == 0 {
            0.0
        } else {
            TAU / f(count)
        }
    }
}

/// The part of a filtered view that determines node positions.
///
/// Tags, names and contact details never move a node, so only ids and
/// edges take part in the change check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LayoutInput {
    pub mentors: Vec<PersonId>,
    /// Each mentee with its mentor, when that mentor is also in the view
    pub mentees: Vec<(PersonId, Option<PersonId>)>,
}

impl LayoutInput {
    pub fn from_view(view: &FilteredView) -> Self {
        let visible: FxHashSet<&PersonId> = view.mentors.iter().map(|m| &m.id).collect();
        LayoutInput {
            mentors: view.mentors.iter().map(|m| m.id.clone()).collect(),
            mentees: view
                .mentees
                .iter()
                .map(|m| {
                    let mentor = m.mentor.id().filter(|id| visible.contains(id)).cloned();
                    (m.id.clone(), mentor)
                })
                .collect(),
        }
    }
}

/// A positioned node
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlacedNode {
    pub position: Position,
    pub radius: f32,
}

/// Result of a layout pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GraphLayout {
    pub nodes: IndexMap<NodeKey, PlacedNode>,
    /// (mentor, mentee) pairs
    pub edges: Vec<(NodeKey, NodeKey)>,
    pub bounds: Bounds,
}

impl GraphLayout {
    pub fn position(&self, key: &NodeKey) -> Option<Position> {
        self.nodes.get(key).map(|n| n.position)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topmost node whose circle contains the world point
    pub fn node_at(&self, point: Position) -> Option<&NodeKey> {
        self.nodes
            .iter()
            .rev()
            .find(|(_, node)| node.position.distance(&point) <= node.radius)
            .map(|(key, _)| key)
    }

    fn place(&mut self, key: NodeKey, position: Position, radius: f32) {
        self.bounds.include(position, radius);
        self.nodes.insert(key, PlacedNode { position, radius });
    }
}

/// Compute the spider layout. Deterministic: the same input always yields the
/// same positions.
pub fn spider_layout(input: &LayoutInput, config: &LayoutConfig) -> GraphLayout {
    let mut layout = GraphLayout::default();

    let mut rings: FxHashMap<&PersonId, Vec<&PersonId>> = FxHashMap::default();
    let mut free = Vec::new();
    for (mentee, mentor) in &input.mentees {
        match mentor {
            Some(mentor) => rings.entry(mentor).or_default().push(mentee),
            None => free.push(mentee),
        }
    }

    let extent = input
        .mentors
        .iter()
        .map(|m| {
            let count = rings.get(m).map_or(0, Vec::len);
            let ring = config.ring_radius(count);
            if count == 0 {
                config.mentor_radius
            } else {
                ring + config.mentee_radius
            }
        })
        .fold(config.mentor_radius, f32::max);
    let cell = 2.0 * extent + config.cluster_gap;

    let columns = f(input.mentors.len()).sqrt().ceil().max(1.0) as usize;
    let rows = input.mentors.len().div_ceil(columns);

    for (i, mentor) in input.mentors.iter().enumerate() {
        let center = Position::new(
            (f(i % columns) + 0.5) * cell,
            (f(i / columns) + 0.5) * cell,
        );
        let mentor_key = NodeKey::mentor(mentor.clone());
        layout.place(mentor_key.clone(), center, config.mentor_radius);

        let Some(mentees) = rings.get(mentor) else { continue };
        let radius = config.ring_radius(mentees.len());
        let step = config.angular_step(mentees.len());
        for (j, mentee) in mentees.iter().enumerate() {
            let angle = f(j) * step - FRAC_PI_2;
            let position = Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            );
            let mentee_key = NodeKey::mentee((*mentee).clone());
            layout.place(mentee_key.clone(), position, config.mentee_radius);
            layout.edges.push((mentor_key.clone(), mentee_key));
        }
    }

    if !free.is_empty() {
        let band_top = f(rows) * cell + config.free_spacing / 2.0;
        let band_width = (f(columns) * cell).max(config.free_spacing);
        let per_row = ((band_width / config.free_spacing).floor() as usize).max(1);
        for (k, mentee) in free.iter().enumerate() {
            let position = Position::new(
                (f(k % per_row) + 0.5) * config.free_spacing,
                band_top + f(k / per_row) * config.free_spacing,
            );
            layout.place(NodeKey::mentee((*mentee).clone()), position, config.mentee_radius);
        }
    }

    layout
}
