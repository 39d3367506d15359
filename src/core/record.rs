//! Catalog entries.

use serde::Serialize;
use std::path::PathBuf;

use crate::core::matcher::tokenize;

/// Where an icon's SVG markup lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconContent {
    /// Markup held in memory
    Inline(String),
    /// Markup in a local file
    File(PathBuf),
    /// Markup behind an absolute URL
    Url(String),
    /// Icon served by the Iconify API as `/{prefix}/{name}.svg`
    Iconify { prefix: String, name: String },
}

impl IconContent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Inline(_) => "inline",
            Self::File(_) => "file",
            Self::Url(_) => "url",
            Self::Iconify { .. } => "iconify",
        }
    }
}

/// An immutable icon in the catalog
#[derive(Debug, Clone, Serialize)]
pub struct IconRecord {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip)]
    pub content: IconContent,
}

impl IconRecord {
    /// Build a record, normalizing tags and deriving them from the name when none are given
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        tags: impl IntoIterator<Item = String>,
        content: IconContent,
    ) -> Self {
        let name = name.into();
        let mut record = Self {
            id: id.into(),
            name,
            tags: Vec::new(),
            collection: None,
            category: None,
            content,
        };
        record.add_tags(tags);
        if record.tags.is_empty() {
            let derived = tokenize(&record.name);
            record.add_tags(derived);
        }
        record
    }

    #[must_use]
    pub fn with_collection(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.add_tags(tokenize(&prefix));
        self.collection = Some(prefix);
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.add_tags(tokenize(&category));
        self.category = Some(category);
        self
    }

    /// Append normalized tags, skipping duplicates
    pub fn add_tags(&mut self, tags: impl IntoIterator<Item = String>) {
        for tag in tags {
            for token in tokenize(&tag) {
                if !self.tags.contains(&token) {
                    self.tags.push(token);
                }
            }
        }
    }

    /// Records without tags never match a query
    pub fn is_matchable(&self) -> bool {
        !self.tags.is_empty()
    }
}
