//! Gallery presentation: one card per filtered person, no state of its own

use crate::filter::FilteredView;
use crate::model::{NodeKey, Person, RelationshipGraph, Tag};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GalleryCard {
    pub key: NodeKey,
    pub name: String,
    pub university: Option<String>,
    pub picture: Option<String>,
    pub tags: Vec<Tag>,
    /// "3 mentees", "Mentor: Asha" or "Unassigned"
    pub caption: String,
}

fn card<P: Person>(key: NodeKey, person: &P, caption: String) -> GalleryCard {
    GalleryCard {
        key,
        name: person.name().to_string(),
        university: person.university().map(str::to_string),
        picture: person.picture().map(str::to_string),
        tags: person.tags().to_vec(),
        caption,
    }
}

/// Mentor cards first, then mentee cards, each in filtered order
pub fn cards(graph: &RelationshipGraph, view: &FilteredView) -> Vec<GalleryCard> {
    let mentors = view.mentors.iter().map(|mentor| {
        let degree = graph.degree(&mentor.id);
        let caption = match degree {
            1 => "1 mentee".to_string(),
            n => format!("{} mentees", n),
        };
        card(NodeKey::mentor(mentor.id.clone()), mentor, caption)
    });

    let mentees = view.mentees.iter().map(|mentee| {
        let caption = match graph.mentor_of(&mentee.id) {
            Some(mentor) => format!("Mentor: {}", mentor.name),
            None => "Unassigned".to_string(),
        };
        card(NodeKey::mentee(mentee.id.clone()), mentee, caption)
    });

    mentors.chain(mentees).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dataset, Mentee, Mentor};
    use std::sync::Arc;

    #[test]
    fn test_cards() {
        let dataset = Dataset::new(
            vec![Mentor::new("m1", "Asha")],
            vec![Mentee::new("e1", "Ben").with_mentor("m1"), Mentee::new("e2", "Cy").with_mentor("gone")],
        );
        let graph = RelationshipGraph::build(Arc::new(dataset.clone()));
        let view = FilteredView {
            mentors: dataset.mentors.clone(),
            mentees: dataset.mentees.clone(),
        };

        let cards = cards(&graph, &view);
        let captions: Vec<&str> = cards.iter().map(|c| c.caption.as_str()).collect();
        assert_eq!(captions, vec!["1 mentee", "Mentor: Asha", "Unassigned"]);
        assert_eq!(cards[1].key, NodeKey::mentee("e1"));
    }
}
