//! Filter and search over the mentorship dataset
//!
//! One pure function feeds all three views, so graph, table and gallery always
//! show the same people for the same criteria.

use crate::model::{Mentee, Mentor, Person, PersonId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which roles the filtered output keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleScope {
    #[default]
    All,
    #[serde(alias = "mentor-only")]
    Mentor,
    #[serde(alias = "mentee-only")]
    Mentee,
}

impl FromStr for RoleScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(RoleScope::All),
            "mentor" | "mentors" | "mentor-only" => Ok(RoleScope::Mentor),
            "mentee" | "mentees" | "mentee-only" => Ok(RoleScope::Mentee),
            other => Err(format!("unknown role scope '{}'", other)),
        }
    }
}

impl fmt::Display for RoleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RoleScope::All => "all",
            RoleScope::Mentor => "mentor",
            RoleScope::Mentee => "mentee",
        })
    }
}

/// Search and filter criteria. Empty or whitespace-only values exclude nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against name, email and university.
    /// Mentees also match on their resolved mentor's name.
    pub search_term: Option<String>,
    pub role: RoleScope,
    /// University substring
    pub university: Option<String>,
    /// Mentor-name substring, applied to mentees only
    pub mentor_name: Option<String>,
    /// Tag id, or tag name compared case-insensitively
    pub tag: Option<String>,
}

impl FilterCriteria {
    pub fn search(term: impl Into<String>) -> Self {
        FilterCriteria {
            search_term: Some(term.into()),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: RoleScope) -> Self {
        self.role = role;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.role == RoleScope::All
            && needle(&self.search_term).is_none()
            && needle(&self.university).is_none()
            && needle(&self.mentor_name).is_none()
            && needle(&self.tag).is_none()
    }
}

/// The filtered pair. Always a fresh value; never patched in place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilteredView {
    pub mentors: Vec<Mentor>,
    pub mentees: Vec<Mentee>,
}

impl FilteredView {
    pub fn len(&self) -> usize {
        self.mentors.len() + self.mentees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentors.is_empty() && self.mentees.is_empty()
    }

    pub fn contains_mentor(&self, id: &PersonId) -> bool {
        self.mentors.iter().any(|m| &m.id == id)
    }
}

/// Lower-cased needle, or `None` when the criterion is a no-op
fn needle(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn contains(haystack: Option<&str>, needle: &str) -> bool {
    haystack.map(|h| h.to_lowercase().contains(needle)).unwrap_or(false)
}

fn matches_person<P: Person>(person: &P, term: &str) -> bool {
    contains(Some(person.name()), term)
        || contains(person.email(), term)
        || contains(person.university(), term)
}

fn has_tag<P: Person>(person: &P, tag: &str) -> bool {
    person
        .tags()
        .iter()
        .any(|t| t.id.as_str().to_lowercase() == tag || t.name.to_lowercase() == tag)
}

/// Apply criteria to the dataset. Pure: reads only its arguments and returns
/// value-equal output for value-equal input.
pub fn filter(mentors: &[Mentor], mentees: &[Mentee], criteria: &FilterCriteria) -> FilteredView {
    let term = needle(&criteria.search_term);
    let university = needle(&criteria.university);
    let mentor_name = needle(&criteria.mentor_name);
    let tag = needle(&criteria.tag);

    let filtered_mentors = if criteria.role == RoleScope::Mentee {
        Vec::new()
    } else {
        mentors
            .iter()
            .filter(|m| term.as_deref().map_or(true, |t| matches_person(*m, t)))
            .filter(|m| university.as_deref().map_or(true, |u| contains(m.university(), u)))
            .filter(|m| tag.as_deref().map_or(true, |t| has_tag(*m, t)))
            .cloned()
            .collect()
    };

    let filtered_mentees = if criteria.role == RoleScope::Mentor {
        Vec::new()
    } else {
        let by_id: FxHashMap<&PersonId, &Mentor> = mentors.iter().map(|m| (&m.id, m)).collect();
        let resolved_name = |mentee: &Mentee| -> Option<&str> {
            mentee
                .mentor
                .id()
                .and_then(|id| by_id.get(id).copied())
                .map(|m| m.name.as_str())
        };

        mentees
            .iter()
            .filter(|m| {
                term.as_deref()
                    .map_or(true, |t| matches_person(*m, t) || contains(resolved_name(*m), t))
            })
            .filter(|m| university.as_deref().map_or(true, |u| contains(m.university(), u)))
            .filter(|m| mentor_name.as_deref().map_or(true, |n| contains(resolved_name(*m), n)))
            .filter(|m| tag.as_deref().map_or(true, |t| has_tag(*m, t)))
            .cloned()
            .collect()
    };

    FilteredView {
        mentors: filtered_mentors,
        mentees: filtered_mentees,
    }
}
