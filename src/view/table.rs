//! Table presentation
//!
//! Mentor rows expand to reveal their mentees inline. Expansion is keyed by
//! mentor id, so it survives filter and sort changes.

use crate::filter::FilteredView;
use crate::model::{Dataset, Mentee, Mentor, PersonId, RelationshipGraph};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    University,
    /// Number of mentees
    Degree,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "university" => Ok(SortKey::University),
            "degree" | "mentees" => Ok(SortKey::Degree),
            other => Err(format!("unknown sort key '{}'", other)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Name => "name",
            SortKey::University => "university",
            SortKey::Degree => "degree",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSort {
    pub key: SortKey,
    pub descending: bool,
}

/// One mentor row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentorRow {
    pub mentor: Mentor,
    pub degree: usize,
    pub expanded: bool,
    /// Filled only for expanded rows
    pub mentees: Vec<Mentee>,
}

/// One mentee row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenteeRow {
    pub mentee: Mentee,
    pub mentor_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TablePage {
    pub mentors: Vec<MentorRow>,
    pub mentees: Vec<MenteeRow>,
}

/// Transient table state
#[derive(Debug, Clone, Default)]
pub struct TableState {
    expanded: FxHashSet<PersonId>,
    sort: TableSort,
}

impl TableState {
    pub fn is_expanded(&self, id: &PersonId) -> bool {
        self.expanded.contains(id)
    }

    /// Flip a mentor row. Returns the new expansion state.
    pub fn toggle(&mut self, id: &PersonId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    pub fn sort(&self) -> TableSort {
        self.sort
    }

    pub fn set_sort(&mut self, sort: TableSort) {
        self.sort = sort;
    }

    /// Forget expanded rows whose mentor left the dataset
    pub fn prune(&mut self, dataset: &Dataset) {
        self.expanded.retain(|id| dataset.mentor(id).is_some());
    }

    /// Build the rows for the filtered view
    pub fn rows(&self, graph: &RelationshipGraph, view: &FilteredView) -> TablePage {
        let mut mentors: Vec<MentorRow> = view
            .mentors
            .iter()
            .map(|mentor| {
                let expanded = self.is_expanded(&mentor.id);
                MentorRow {
                    mentor: mentor.clone(),
                    degree: graph.degree(&mentor.id),
                    expanded,
                    mentees: if expanded {
                        graph.mentees_of(&mentor.id).into_iter().cloned().collect()
                    } else {
                        Vec::new()
                    },
                }
            })
            .collect();

        mentors.sort_by(|a, b| {
            let ordering = match self.sort.key {
                SortKey::Name => compare_text(&a.mentor.name, &b.mentor.name),
                SortKey::University => compare_text(
                    a.mentor.university.as_deref().unwrap_or(""),
                    b.mentor.university.as_deref().unwrap_or(""),
                ),
                SortKey::Degree => a.degree.cmp(&b.degree),
            };
            if self.sort.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });

        let mentees = view
            .mentees
            .iter()
            .map(|mentee| MenteeRow {
                mentee: mentee.clone(),
                mentor_name: graph.mentor_of(&mentee.id).map(|m| m.name.clone()),
            })
            .collect();

        TablePage { mentors, mentees }
    }
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
