//! Wire model for one page of the tag listing.
//!
//! Registries disagree on which size fields they fill in, so every field is
//! optional and `null` is read the same as absent.

use serde::{Deserialize, Deserializer, Serialize};

/// One response body of the tag listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagPage {
    /// Tag records, in registry order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<TagRecord>,

    /// Continuation indicator. Only its truthiness is meaningful.
    #[serde(default)]
    pub next: serde_json::Value,
}

impl TagPage {
    /// Returns true if the registry signals another page after this one.
    pub fn has_next(&self) -> bool {
        is_truthy(&self.next)
    }

    /// Returns true if the page carries no records.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// One tag entry within a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagRecord {
    #[serde(default)]
    pub name: Option<String>,

    /// Declared total size in bytes.
    #[serde(default)]
    pub full_size: Option<u64>,

    /// Per-image sub-records (one per platform on multi-arch tags).
    #[serde(default)]
    pub images: Option<Vec<ImageRecord>>,
}

impl TagRecord {
    /// The tag name, if present and non-empty.
    pub fn tag_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    /// Effective size in bytes.
    ///
    /// The declared size when positive, otherwise the sum of the image
    /// sub-record sizes, otherwise 0 (unknown).
    pub fn effective_size(&self) -> u64 {
        match self.full_size {
            Some(size) if size > 0 => size,
            _ => self
                .images
                .iter()
                .flatten()
                .filter_map(|image| image.size)
                .fold(0u64, u64::saturating_add),
        }
    }
}

/// Image sub-record of a tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub size: Option<u64>,
}

/// JSON truthiness: null, false, 0, "" and empty containers are falsy.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map_or(true, |v| v != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(values) => !values.is_empty(),
        serde_json::Value::Object(entries) => !entries.is_empty(),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
