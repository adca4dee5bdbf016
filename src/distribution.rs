//! File-type distribution: a pure projection of the hierarchy, recomputed on
//! demand and never stored.

use serde::Serialize;
use std::fmt;

use crate::model::Hierarchy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FileCategory {
    Docs,
    #[serde(rename = "PDF")]
    Pdf,
    Images,
    Sheets,
    Text,
    Folders,
    Other,
}

impl FileCategory {
    /// Substring rules are checked in order; the first match wins.
    pub fn classify(mime_type: &str) -> FileCategory {
        let mime = mime_type.to_ascii_lowercase();
        let has = |needle: &str| mime.contains(needle);
        if has("document") || has("word") {
            FileCategory::Docs
        } else if has("pdf") {
            FileCategory::Pdf
        } else if has("image") || has("jpeg") || has("png") {
            FileCategory::Images
        } else if has("sheet") || has("excel") {
            FileCategory::Sheets
        } else if has("text") {
            FileCategory::Text
        } else if has("folder") {
            FileCategory::Folders
        } else {
            FileCategory::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileCategory::Docs => "Docs",
            FileCategory::Pdf => "PDF",
            FileCategory::Images => "Images",
            FileCategory::Sheets => "Sheets",
            FileCategory::Text => "Text",
            FileCategory::Folders => "Folders",
            FileCategory::Other => "Other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: FileCategory,
    pub count: usize,
}

/// Groups files by category, in first-seen order.
pub fn file_type_distribution(hierarchy: &Hierarchy) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    for file in &hierarchy.files {
        let category = FileCategory::classify(&file.mime_type);
        match counts.iter_mut().find(|c| c.category == category) {
            Some(entry) => entry.count += 1,
            None => counts.push(CategoryCount { category, count: 1 }),
        }
    }
    counts
}
