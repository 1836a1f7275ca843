//! Multipart encoding of a validated record
//!
//! File lists and arrays made only of files become one `key[]` part per
//! file; every other value becomes a single `key` part. Scalars are sent as
//! their text, nested arrays and objects as JSON.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::foundation::predicates::to_text;
use crate::foundation::{FileInspector, FileRef};

/// Body of one multipart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPart {
    Text(String),
    File(FileRef),
}

impl FormPart {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    #[must_use]
    pub fn as_file(&self) -> Option<&FileRef> {
        match self {
            Self::File(file) => Some(file),
            Self::Text(_) => None,
        }
    }
}

/// Ordered multipart entries; names may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormData {
    parts: Vec<(String, FormPart)>,
    has_file: bool,
}

impl FormData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encodes every entry of `record`.
    pub fn from_record(record: &Map<String, Value>, inspector: &dyn FileInspector) -> Self {
        let mut form = Self::new();
        for (key, value) in record {
            let many = inspector
                .file_list(value)
                .or_else(|| match value {
                    Value::Array(_) => inspector.files(value),
                    _ => None,
                });
            if let Some(files) = many {
                let name = format!("{key}[]");
                for file in files {
                    form.append(name.clone(), FormPart::File(file));
                }
            } else if let Some(file) = inspector.file(value) {
                form.append(key.clone(), FormPart::File(file));
            } else {
                form.append(key.clone(), FormPart::Text(to_text(value)));
            }
        }
        form
    }

    pub fn append(&mut self, name: impl Into<String>, part: FormPart) {
        self.has_file |= matches!(part, FormPart::File(_));
        self.parts.push((name.into(), part));
    }

    /// First part named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FormPart> {
        self.parts.iter().find(|(n, _)| n == name).map(|(_, p)| p)
    }

    /// Every part named `name`, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormPart> + 'a {
        self.parts.iter().filter(move |(n, _)| n == name).map(|(_, p)| p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormPart)> {
        self.parts.iter().map(|(n, p)| (n.as_str(), p))
    }

    /// `true` once any file part was appended.
    #[must_use]
    pub fn has_file(&self) -> bool {
        self.has_file
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}
