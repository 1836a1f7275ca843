//! File detection
//!
//! Attribute values are plain JSON, so uploaded files have to be recognised
//! by shape. The engine asks a [`FileInspector`] and never looks at the
//! representation itself; [`JsonFileInspector`] understands the envelopes
//! below and is used unless the caller installs something else.
//!
//! ```text
//! {"$file":  {"name": "a.png", "size": 2048, "type": "image/png"}}
//! {"$files": [{"name": "a.png", "size": 2048, "type": "image/png"}, ...]}
//! {"$blob":  {"size": 10, "type": "application/octet-stream"}}
//! ```

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Metadata of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "type", default)]
    pub mime: String,
}

impl FileRef {
    pub fn new(name: impl Into<String>, size: u64, mime: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            size,
            mime: mime.into(),
        }
    }

    /// Wraps this file into the `$file` envelope.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({ "$file": self })
    }

    /// Wraps a list of files into the `$files` envelope.
    #[must_use]
    pub fn list_value(files: &[Self]) -> Value {
        json!({ "$files": files })
    }

    /// Builds a `$blob` envelope.
    #[must_use]
    pub fn blob_value(size: u64, mime: impl Into<String>) -> Value {
        json!({ "$blob": { "size": size, "type": mime.into() } })
    }
}

// ============================================================================
// INSPECTOR TRAIT
// ============================================================================

/// Recognises files, file lists and blobs inside attribute values.
pub trait FileInspector: Send + Sync + Debug {
    /// A single file.
    fn file(&self, value: &Value) -> Option<FileRef>;

    /// A file-list container (not a plain array of files).
    fn file_list(&self, value: &Value) -> Option<Vec<FileRef>>;

    /// A binary blob that is not a file.
    fn is_blob(&self, value: &Value) -> bool;

    fn is_file(&self, value: &Value) -> bool {
        self.file(value).is_some()
    }

    /// Every file carried by `value`: one file, a file list, or a non-empty
    /// array made only of files.
    fn files(&self, value: &Value) -> Option<Vec<FileRef>> {
        if let Some(file) = self.file(value) {
            return Some(vec![file]);
        }
        if let Some(list) = self.file_list(value) {
            return Some(list);
        }
        match value {
            Value::Array(items) if !items.is_empty() => {
                items.iter().map(|item| self.file(item)).collect()
            }
            _ => None,
        }
    }

    /// `true` for any value that carries a file in some form.
    fn carries_file(&self, value: &Value) -> bool {
        self.files(value).is_some()
    }
}

// ============================================================================
// JSON ENVELOPE INSPECTOR
// ============================================================================

/// Default inspector reading the `$file` / `$files` / `$blob` envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileInspector;

impl JsonFileInspector {
    fn envelope<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
        match value {
            Value::Object(map) if map.len() == 1 => map.get(key),
            _ => None,
        }
    }
}

impl FileInspector for JsonFileInspector {
    fn file(&self, value: &Value) -> Option<FileRef> {
        Self::envelope(value, "$file").and_then(|inner| FileRef::deserialize(inner).ok())
    }

    fn file_list(&self, value: &Value) -> Option<Vec<FileRef>> {
        Self::envelope(value, "$files").and_then(|inner| Vec::<FileRef>::deserialize(inner).ok())
    }

    fn is_blob(&self, value: &Value) -> bool {
        Self::envelope(value, "$blob").is_some_and(Value::is_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_file_envelope() {
        let value = FileRef::new("a.png", 10, "image/png").to_value();
        let inspector = JsonFileInspector;
        let file = inspector.file(&value).unwrap();
        assert_eq!(file.size, 10);
        assert_eq!(file.mime, "image/png");
        assert_eq!(inspector.files(&value).map(|f| f.len()), Some(1));
    }

    #[test]
    fn test_file_list_and_plain_array() {
        let files = vec![FileRef::new("a", 1, "text/plain"), FileRef::new("b", 2, "text/plain")];
        let inspector = JsonFileInspector;

        let list = FileRef::list_value(&files);
        assert_eq!(inspector.file_list(&list), Some(files.clone()));

        let array = Value::Array(files.iter().map(FileRef::to_value).collect());
        assert!(inspector.file_list(&array).is_none());
        assert_eq!(inspector.files(&array), Some(files));
    }

    #[test]
    fn test_mixed_array_is_not_files() {
        let inspector = JsonFileInspector;
        let array = Value::Array(vec![FileRef::new("a", 1, "x/y").to_value(), "text".into()]);
        assert!(inspector.files(&array).is_none());
        assert!(inspector.files(&Value::Array(vec![])).is_none());
    }

    #[test]
    fn test_blob_is_not_a_file() {
        let inspector = JsonFileInspector;
        let blob = FileRef::blob_value(4, "application/octet-stream");
        assert!(inspector.is_blob(&blob));
        assert!(!inspector.is_file(&blob));
    }
}
