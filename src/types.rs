use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Remote identifier of a custom field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(transparent)]
pub struct FieldId(pub u64);

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map(FieldId)
            .map_err(|_| format!("invalid field id '{trimmed}'"))
    }
}

/// Partition key separating independent orderings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ParentType {
    Matter,
    Contact,
}

impl ParentType {
    pub const ALL: [ParentType; 2] = [ParentType::Matter, ParentType::Contact];

    pub fn as_str(self) -> &'static str {
        match self {
            ParentType::Matter => "matter",
            ParentType::Contact => "contact",
        }
    }

    /// Form expected by the remote API query parameters.
    pub fn api_name(self) -> &'static str {
        match self {
            ParentType::Matter => "Matter",
            ParentType::Contact => "Contact",
        }
    }
}

impl fmt::Display for ParentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "matter" | "matters" => Ok(ParentType::Matter),
            "contact" | "contacts" => Ok(ParentType::Contact),
            _ => Err(()),
        }
    }
}

/// Where a mover lands relative to its target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Before,
    After,
}

impl Position {
    pub fn as_str(self) -> &'static str {
        match self {
            Position::Before => "before",
            Position::After => "after",
        }
    }
}

impl FromStr for Position {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" | "above" => Ok(Position::Before),
            "after" | "below" => Ok(Position::After),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CustomField {
    pub id: FieldId,
    #[serde(default)]
    pub name: String,
    pub parent_type: ParentType,
    #[serde(default)]
    pub field_type: Option<String>,
    #[serde(default)]
    pub displayed: bool,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub required: bool,
    pub display_order: i64,
}

/// Remote identifier of a custom field set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[serde(transparent)]
pub struct FieldSetId(pub u64);

impl fmt::Display for FieldSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldSetId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<u64>()
            .map(FieldSetId)
            .map_err(|_| format!("invalid field set id '{trimmed}'"))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct FieldRef {
    pub id: FieldId,
}

/// Named group of fields shown together. Sets have no display order of their own.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CustomFieldSet {
    pub id: FieldSetId,
    #[serde(default)]
    pub name: String,
    pub parent_type: ParentType,
    #[serde(default)]
    pub displayed: bool,
    #[serde(default)]
    pub custom_fields: Vec<FieldRef>,
}

impl CustomFieldSet {
    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.custom_fields.iter().map(|field| field.id)
    }
}

/// Failure reported by a remote call. `code` is a stable machine-readable tag.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
