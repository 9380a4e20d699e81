//! Structured fact document addressed by dot-paths (`profile.body`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ChecklistError;

use super::engine::ExtractedData;

/// Facts accumulated from the conversation, written at each check's
/// `context_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facts(Value);

impl Default for Facts {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

/// Whether `path` is a well-formed dot-path (`a.b_c.d1`).
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

impl Facts {
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up the value at a dot-path.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.0, |node, segment| node.get(segment))
    }

    /// Look up a single field stored under a dot-path.
    pub fn get_field(&self, path: &str, field: &str) -> Option<&Value> {
        self.get_path(path).and_then(|node| node.get(field))
    }

    /// Merge `fields` into the mapping at `path`, creating intermediate
    /// mappings as needed.
    ///
    /// The path is checked in full before anything is written, so a conflict
    /// leaves the document unchanged.
    pub fn set_fields(&mut self, path: &str, fields: &ExtractedData) -> Result<(), ChecklistError> {
        if !is_valid_path(path) {
            return Err(ChecklistError::PathConflict(path.to_string()));
        }

        let mut cursor = Some(&self.0);
        for (depth, segment) in path.split('.').enumerate() {
            match cursor {
                Some(Value::Object(map)) => cursor = map.get(segment),
                Some(_) => {
                    let prefix: Vec<&str> = path.split('.').take(depth).collect();
                    return Err(ChecklistError::PathConflict(prefix.join(".")));
                }
                None => break,
            }
        }
        if let Some(node) = cursor
            && !node.is_object()
        {
            return Err(ChecklistError::PathConflict(path.to_string()));
        }

        let mut node = &mut self.0;
        for segment in path.split('.') {
            node = match node {
                Value::Object(map) => map
                    .entry(segment.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                _ => return Err(ChecklistError::PathConflict(path.to_string())),
            };
        }
        if let Value::Object(map) = node {
            for (key, value) in fields {
                map.insert(key.clone(), value.clone());
            }
        }
        Ok(())
    }
}
