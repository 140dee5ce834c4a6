//! Core identifier types for the relationship graph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque identifier of a mentor or mentee.
///
/// Identifiers are always compared as strings; numeric ids coming from the API
/// are normalized to their decimal form at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    pub fn new(id: impl Into<String>) -> Self {
        PersonId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a JSON scalar into an id. Strings are used as-is, numbers by their
    /// decimal representation. Anything else (and empty strings) is not an id.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(PersonId(s.clone())),
            serde_json::Value::Number(n) => Some(PersonId(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PersonId {
    fn from(s: String) -> Self {
        PersonId(s)
    }
}

impl From<&str> for PersonId {
    fn from(s: &str) -> Self {
        PersonId(s.to_string())
    }
}

/// Identifier of a shared tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    pub fn new(id: impl Into<String>) -> Self {
        TagId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        TagId(s.to_string())
    }
}

impl From<String> for TagId {
    fn from(s: String) -> Self {
        TagId(s)
    }
}

/// Participant role. Serialized as the `personType` values of the tag-write API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Mentor,
    Mentee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Mentor => "mentor",
            Role::Mentee => "mentee",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mentor" => Ok(Role::Mentor),
            "mentee" => Ok(Role::Mentee),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Key of a node in the relationship graph. Mentor and mentee ids live in separate
/// collections and may collide, so the role is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct NodeKey {
    pub role: Role,
    pub id: PersonId,
}

impl NodeKey {
    pub fn mentor(id: impl Into<PersonId>) -> Self {
        NodeKey { role: Role::Mentor, id: id.into() }
    }

    pub fn mentee(id: impl Into<PersonId>) -> Self {
        NodeKey { role: Role::Mentee, id: id.into() }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_person_id() {
        let id = PersonId::new("m1");
        assert_eq!(id.as_str(), "m1");
        assert_eq!(format!("{}", id), "m1");

        let id2: PersonId = "e2".into();
        assert_eq!(id2.as_str(), "e2");
    }

    #[test]
    fn test_person_id_from_json() {
        assert_eq!(PersonId::from_json(&json!("m1")), Some(PersonId::new("m1")));
        assert_eq!(PersonId::from_json(&json!(42)), Some(PersonId::new("42")));
        assert_eq!(PersonId::from_json(&json!("")), None);
        assert_eq!(PersonId::from_json(&json!(null)), None);
        assert_eq!(PersonId::from_json(&json!({"id": "m1"})), None);
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Mentor".parse::<Role>().unwrap(), Role::Mentor);
        assert_eq!("mentee".parse::<Role>().unwrap(), Role::Mentee);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(serde_json::to_string(&Role::Mentee).unwrap(), "\"mentee\"");
    }

    #[test]
    fn test_node_key() {
        let key = NodeKey::mentor("m1");
        assert_eq!(format!("{}", key), "mentor:m1");
        assert_ne!(NodeKey::mentor("x"), NodeKey::mentee("x"));
    }
}
