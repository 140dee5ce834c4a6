//! Mentor, mentee and tag records as delivered by the mentorship API
//!
//! Records are decoded one at a time so a single malformed entry never aborts a
//! whole refresh. The polymorphic `mentor` field of a mentee is normalized into
//! [`MentorRef`] here, once, instead of being inspected at every use site.

use super::types::{NodeKey, PersonId, Role, TagId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

fn de_person_id<'de, D>(deserializer: D) -> Result<PersonId, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    PersonId::from_json(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid person id: {}", value)))
}

fn de_tag_id<'de, D>(deserializer: D) -> Result<TagId, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(TagId::new(s)),
        Value::Number(n) => Ok(TagId::new(n.to_string())),
        other => Err(serde::de::Error::custom(format!("invalid tag id: {}", other))),
    }
}

/// A shared tag. Persons hold references to tags, never owned copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(deserialize_with = "de_tag_id")]
    pub id: TagId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub color: String,
}

impl Tag {
    pub fn new(id: impl Into<TagId>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Tag {
            id: id.into(),
            name: name.into(),
            description: None,
            color: color.into(),
        }
    }
}

/// Fields shared by mentors and mentees, used by the filter engine and the views
pub trait Person {
    fn id(&self) -> &PersonId;
    fn name(&self) -> &str;
    fn email(&self) -> Option<&str>;
    fn university(&self) -> Option<&str>;
    fn tags(&self) -> &[Tag];
    fn picture(&self) -> Option<&str>;
}

/// A mentor record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentor {
    #[serde(deserialize_with = "de_person_id")]
    pub id: PersonId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leetcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Mentor {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Mentor {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            university: None,
            picture: None,
            linkedin: None,
            github: None,
            leetcode: None,
            username: None,
            tags: Vec::new(),
        }
    }

    pub fn with_university(mut self, university: impl Into<String>) -> Self {
        self.university = Some(university.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }
}

impl Person for Mentor {
    fn id(&self) -> &PersonId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
    fn university(&self) -> Option<&str> {
        self.university.as_deref()
    }
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
    fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }
}

/// Partial mentor record embedded in a mentee by some API responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorSummary {
    pub id: PersonId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
}

/// A mentee's reference to its mentor.
///
/// The API sends either nothing, a bare id, or an embedded partial mentor. All
/// three shapes are normalized into this union at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MentorRef {
    #[default]
    Unassigned,
    ById(PersonId),
    Embedded(MentorSummary),
}

impl MentorRef {
    /// Normalize the raw `mentor` field. An object contributes its `id` field, a
    /// scalar is the id itself, anything else is unassigned.
    pub fn normalize(value: &Value) -> Self {
        match value {
            Value::Object(map) => {
                let Some(id) = map.get("id").and_then(PersonId::from_json) else {
                    debug!("mentor reference object without id treated as unassigned");
                    return MentorRef::Unassigned;
                };
                let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                MentorRef::Embedded(MentorSummary {
                    id,
                    name: text("name"),
                    email: text("email"),
                    university: text("university"),
                })
            }
            other => PersonId::from_json(other)
                .map(MentorRef::ById)
                .unwrap_or(MentorRef::Unassigned),
        }
    }

    /// The referenced mentor id, whatever the reference shape
    pub fn id(&self) -> Option<&PersonId> {
        match self {
            MentorRef::Unassigned => None,
            MentorRef::ById(id) => Some(id),
            MentorRef::Embedded(summary) => Some(&summary.id),
        }
    }

    pub fn is_assigned(&self) -> bool {
        !matches!(self, MentorRef::Unassigned)
    }
}

impl<'de> Deserialize<'de> for MentorRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(MentorRef::normalize(&value))
    }
}

impl Serialize for MentorRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            MentorRef::Unassigned => serializer.serialize_none(),
            MentorRef::ById(id) => id.serialize(serializer),
            MentorRef::Embedded(summary) => summary.serialize(serializer),
        }
    }
}

impl From<&str> for MentorRef {
    fn from(id: &str) -> Self {
        MentorRef::ById(PersonId::new(id))
    }
}

/// A mentee record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mentee {
    #[serde(deserialize_with = "de_person_id")]
    pub id: PersonId,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leetcode: Option<String>,
    #[serde(default)]
    pub mentor: MentorRef,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Mentee {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>) -> Self {
        Mentee {
            id: id.into(),
            name: name.into(),
            email: None,
            phone: None,
            university: None,
            picture: None,
            linkedin: None,
            github: None,
            leetcode: None,
            mentor: MentorRef::Unassigned,
            tags: Vec::new(),
        }
    }

    pub fn with_mentor(mut self, mentor: impl Into<MentorRef>) -> Self {
        self.mentor = mentor.into();
        self
    }

    pub fn with_university(mut self, university: impl Into<String>) -> Self {
        self.university = Some(university.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<Tag>) -> Self {
        self.tags = tags;
        self
    }
}

impl Person for Mentee {
    fn id(&self) -> &PersonId {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }
    fn university(&self) -> Option<&str> {
        self.university.as_deref()
    }
    fn tags(&self) -> &[Tag] {
        &self.tags
    }
    fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }
}

/// The full mentorship dataset. Replaced wholesale on every applied fetch and
/// compared structurally to suppress redundant recomputation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dataset {
    pub mentors: Vec<Mentor>,
    pub mentees: Vec<Mentee>,
}

impl Dataset {
    pub fn new(mentors: Vec<Mentor>, mentees: Vec<Mentee>) -> Self {
        Dataset { mentors, mentees }
    }

    /// Decode raw API arrays. Malformed records and duplicate ids are dropped
    /// with a warning.
    pub fn from_json(mentors: Vec<Value>, mentees: Vec<Value>) -> Self {
        Dataset {
            mentors: decode_records(mentors, Role::Mentor, |m: &Mentor| m.id.clone()),
            mentees: decode_records(mentees, Role::Mentee, |m: &Mentee| m.id.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mentors.is_empty() && self.mentees.is_empty()
    }

    pub fn mentor(&self, id: &PersonId) -> Option<&Mentor> {
        self.mentors.iter().find(|m| &m.id == id)
    }

    pub fn mentee(&self, id: &PersonId) -> Option<&Mentee> {
        self.mentees.iter().find(|m| &m.id == id)
    }

    /// Whether the dataset still contains the entity behind a node key
    pub fn contains(&self, key: &NodeKey) -> bool {
        match key.role {
            Role::Mentor => self.mentor(&key.id).is_some(),
            Role::Mentee => self.mentee(&key.id).is_some(),
        }
    }

    pub fn tags_of(&self, role: Role, id: &PersonId) -> Option<&[Tag]> {
        match role {
            Role::Mentor => self.mentor(id).map(|m| m.tags.as_slice()),
            Role::Mentee => self.mentee(id).map(|m| m.tags.as_slice()),
        }
    }

    pub fn tags_of_mut(&mut self, role: Role, id: &PersonId) -> Option<&mut Vec<Tag>> {
        match role {
            Role::Mentor => self.mentors.iter_mut().find(|m| &m.id == id).map(|m| &mut m.tags),
            Role::Mentee => self.mentees.iter_mut().find(|m| &m.id == id).map(|m| &mut m.tags),
        }
    }
}

fn decode_records<T, F>(raw: Vec<Value>, role: Role, id_of: F) -> Vec<T>
where
    T: serde::de::DeserializeOwned,
    F: Fn(&T) -> PersonId,
{
    let mut seen = FxHashSet::default();
    let mut records = Vec::with_capacity(raw.len());
    for (index, value) in raw.into_iter().enumerate() {
        match serde_json::from_value::<T>(value) {
            Ok(record) => {
                let id = id_of(&record);
                if seen.insert(id.clone()) {
                    records.push(record);
                } else {
                    warn!(%role, %id, "dropping duplicate record");
                }
            }
            Err(e) => warn!(%role, index, error = %e, "dropping malformed record"),
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mentor_ref_shapes() {
        assert_eq!(MentorRef::normalize(&json!("m1")), MentorRef::ById("m1".into()));
        assert_eq!(MentorRef::normalize(&json!(7)), MentorRef::ById("7".into()));
        assert_eq!(MentorRef::normalize(&json!(null)), MentorRef::Unassigned);
        assert_eq!(MentorRef::normalize(&json!({"name": "Asha"})), MentorRef::Unassigned);

        let embedded = MentorRef::normalize(&json!({"id": "m1", "name": "Asha"}));
        assert_eq!(embedded.id(), Some(&PersonId::new("m1")));
        match embedded {
            MentorRef::Embedded(summary) => assert_eq!(summary.name.as_deref(), Some("Asha")),
            other => panic!("expected embedded reference, got {:?}", other),
        }
    }

    #[test]
    fn test_mentee_decode() {
        let mentee: Mentee = serde_json::from_value(json!({
            "id": "e1",
            "name": "Ben",
            "mentor": {"id": "m1"},
            "tags": [{"id": "t1", "name": "rust", "color": "#f00"}]
        }))
        .unwrap();
        assert_eq!(mentee.mentor.id(), Some(&PersonId::new("m1")));
        assert_eq!(mentee.tags[0].name, "rust");

        let unassigned: Mentee = serde_json::from_value(json!({"id": "e2", "name": "Cy"})).unwrap();
        assert_eq!(unassigned.mentor, MentorRef::Unassigned);
    }

    #[test]
    fn test_mentor_ref_serializes_in_wire_shape() {
        let mentee = Mentee::new("e1", "Ben").with_mentor("m1");
        let value = serde_json::to_value(&mentee).unwrap();
        assert_eq!(value["mentor"], json!("m1"));

        let unassigned = serde_json::to_value(Mentee::new("e2", "Cy")).unwrap();
        assert_eq!(unassigned["mentor"], Value::Null);
    }

    #[test]
    fn test_malformed_records_dropped() {
        let dataset = Dataset::from_json(
            vec![
                json!({"id": "m1", "name": "Asha"}),
                json!({"name": "No id"}),
                json!({"id": "m1", "name": "Duplicate"}),
                json!("not an object"),
            ],
            vec![json!({"id": 12, "name": "Numeric"}), json!({"id": null})],
        );
        assert_eq!(dataset.mentors.len(), 1);
        assert_eq!(dataset.mentors[0].name, "Asha");
        assert_eq!(dataset.mentees.len(), 1);
        assert_eq!(dataset.mentees[0].id, PersonId::new("12"));
    }

    #[test]
    fn test_tags_of_mut() {
        let mut dataset = Dataset::new(vec![Mentor::new("m1", "Asha")], vec![]);
        dataset
            .tags_of_mut(Role::Mentor, &"m1".into())
            .unwrap()
            .push(Tag::new("t1", "rust", "#000"));
        assert_eq!(dataset.tags_of(Role::Mentor, &"m1".into()).unwrap().len(), 1);
        assert!(dataset.tags_of_mut(Role::Mentee, &"m1".into()).is_none());
        assert!(dataset.contains(&NodeKey::mentor("m1")));
        assert!(!dataset.contains(&NodeKey::mentee("m1")));
    }
}
