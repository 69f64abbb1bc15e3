use std::fmt;

use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer, Serialize,
};
use serde_json::{json, Value};

pub const SCHEMA_VERSION: u32 = 1;
pub const SCHEMA_NAME: &str = "document_comparison";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl ChangeKind {
    pub const ALL: [Self; 4] = [Self::Added, Self::Removed, Self::Modified, Self::Unchanged];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Removed => "removed",
            Self::Modified => "modified",
            Self::Unchanged => "unchanged",
        }
    }
}

/// One difference reported by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonRecord {
    #[serde(deserialize_with = "deserialize_page")]
    pub page: String,
    pub change_type: ChangeKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComparisonResponse {
    pub schema_version: u32,
    pub changes: Vec<ComparisonRecord>,
}

struct PageVisitor;

impl<'de> Visitor<'de> for PageVisitor {
    type Value = String;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a page number or page label")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value)
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.to_string())
    }
}

/// Models answer with `"page": 3` as often as `"page": "3"`.
fn deserialize_page<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(PageVisitor)
}

/// JSON schema of [`ComparisonResponse`], sent with the request and quoted in the
/// format instructions.
pub fn comparison_schema() -> Value {
    let kinds: Vec<&str> = ChangeKind::ALL.iter().map(|kind| kind.as_str()).collect();

    json!({
        "type": "object",
        "properties": {
            "schema_version": { "type": "integer", "enum": [SCHEMA_VERSION] },
            "changes": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "page": { "type": "string", "description": "Page number the change was found on" },
                        "change_type": { "type": "string", "enum": kinds },
                        "description": { "type": "string", "description": "What differs between the documents" },
                        "section": { "type": "string", "description": "Optional heading or clause the change belongs to" }
                    },
                    "required": ["page", "change_type", "description"],
                    "additionalProperties": false
                }
            }
        },
        "required": ["schema_version", "changes"],
        "additionalProperties": false
    })
}
