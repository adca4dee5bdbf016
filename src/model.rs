//! Data contracts for the drive hierarchy and the optimisation report.
//!
//! Every type here serialises with the camelCase field names used on the
//! wire, both in the prompt sent to the classifier and in the structured
//! report it returns.
//!
//! - [`Hierarchy`]: folders and files forming a tree through parent references.
//! - [`OptimizationReport`]: the classifier's answer, created fresh per analysis.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::HierarchyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    /// `None` only for the root folder.
    pub parent_id: Option<String>,
    pub owned_by_me: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parent_folder_id: String,
    pub created_time: String,
    pub modified_time: String,
    pub content_summary: String,
    /// Human readable size as reported by the store (e.g. `25KB`).
    pub size: String,
    pub owned_by_me: bool,
}

/// One snapshot of the file store. Ownership flags are fixed for the
/// lifetime of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    pub files: Vec<DriveFile>,
    pub folders: Vec<Folder>,
}

impl Hierarchy {
    pub fn folder(&self, id: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    pub fn file(&self, id: &str) -> Option<&DriveFile> {
        self.files.iter().find(|f| f.id == id)
    }

    pub fn root(&self) -> Option<&Folder> {
        self.folders.iter().find(|f| f.parent_id.is_none())
    }

    /// Checks id uniqueness, parent resolution, a single root and acyclicity.
    pub fn validate(&self) -> Result<(), HierarchyError> {
        let mut folder_ids = HashSet::new();
        for folder in &self.folders {
            if !folder_ids.insert(folder.id.as_str()) {
                return Err(HierarchyError::DuplicateFolder(folder.id.clone()));
            }
        }

        let mut file_ids = HashSet::new();
        for file in &self.files {
            if !file_ids.insert(file.id.as_str()) {
                return Err(HierarchyError::DuplicateFile(file.id.clone()));
            }
        }

        let roots: Vec<String> = self
            .folders
            .iter()
            .filter(|f| f.parent_id.is_none())
            .map(|f| f.id.clone())
            .collect();
        match roots.len() {
            0 => return Err(HierarchyError::MissingRoot),
            1 => {}
            _ => return Err(HierarchyError::MultipleRoots(roots)),
        }

        for folder in &self.folders {
            if let Some(parent) = &folder.parent_id {
                if !folder_ids.contains(parent.as_str()) {
                    return Err(HierarchyError::DanglingFolderParent {
                        folder: folder.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        for file in &self.files {
            if !folder_ids.contains(file.parent_folder_id.as_str()) {
                return Err(HierarchyError::DanglingFileParent {
                    file: file.id.clone(),
                    parent: file.parent_folder_id.clone(),
                });
            }
        }

        // Every folder must reach the root within `folders.len()` steps.
        let parents: HashMap<&str, Option<&str>> = self
            .folders
            .iter()
            .map(|f| (f.id.as_str(), f.parent_id.as_deref()))
            .collect();
        for folder in &self.folders {
            let mut current = folder.parent_id.as_deref();
            let mut steps = 0;
            while let Some(id) = current {
                steps += 1;
                if steps > self.folders.len() {
                    return Err(HierarchyError::Cycle(folder.id.clone()));
                }
                current = parents.get(id).copied().flatten();
            }
        }

        Ok(())
    }

    /// Slash-joined folder names from the root down to `id`.
    ///
    /// Returns `None` for unknown ids or when the chain does not terminate.
    pub fn folder_path(&self, id: &str) -> Option<String> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(folder_id) = current {
            if names.len() > self.folders.len() {
                return None;
            }
            let folder = self.folder(folder_id)?;
            names.push(folder.name.as_str());
            current = folder.parent_id.as_deref();
        }
        names.reverse();
        Some(names.join("/"))
    }

    pub fn file_path(&self, id: &str) -> Option<String> {
        let file = self.file(id)?;
        let parent = self.folder_path(&file.parent_folder_id)?;
        Some(format!("{parent}/{}", file.name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationType {
    Rename,
    Move,
    Consolidate,
    Archive,
}

impl RecommendationType {
    pub const ALL: [RecommendationType; 4] = [
        RecommendationType::Rename,
        RecommendationType::Move,
        RecommendationType::Consolidate,
        RecommendationType::Archive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationType::Rename => "RENAME",
            RecommendationType::Move => "MOVE",
            RecommendationType::Consolidate => "CONSOLIDATE",
            RecommendationType::Archive => "ARCHIVE",
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RecommendationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_folder_id: Option<String>,
    pub reasoning: String,
    /// 1 to 100.
    pub impact_score: f64,
}

impl Recommendation {
    /// Whether this recommendation only mutates entities the user owns.
    ///
    /// The referenced file and folder must exist and be owned. Files that
    /// leave their folder (MOVE, CONSOLIDATE, ARCHIVE) must also sit in an
    /// owned folder. An unowned `suggestedFolderId` is accepted only as the
    /// destination of a MOVE of an owned file.
    pub fn respects_ownership(&self, hierarchy: &Hierarchy) -> bool {
        if let Some(file_id) = &self.file_id {
            let Some(file) = hierarchy.file(file_id) else {
                return false;
            };
            if !file.owned_by_me {
                return false;
            }
            if self.kind != RecommendationType::Rename {
                let container_owned = hierarchy
                    .folder(&file.parent_folder_id)
                    .is_some_and(|f| f.owned_by_me);
                if !container_owned {
                    return false;
                }
            }
        }

        if let Some(folder_id) = &self.folder_id {
            match hierarchy.folder(folder_id) {
                Some(folder) if folder.owned_by_me => {}
                _ => return false,
            }
        }

        if let Some(target_id) = &self.suggested_folder_id {
            if let Some(target) = hierarchy.folder(target_id) {
                let inward_move =
                    self.kind == RecommendationType::Move && self.file_id.is_some();
                if !target.owned_by_me && !inward_move {
                    return false;
                }
            }
        }

        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub redundant_folders: u32,
    pub misnamed_files: u32,
    pub potential_space_saved: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub summary: String,
    pub recommendations: Vec<Recommendation>,
    pub stats: ReportStats,
}

impl OptimizationReport {
    pub fn recommendation(&self, id: &str) -> Option<&Recommendation> {
        self.recommendations.iter().find(|r| r.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.recommendations.iter().map(|r| r.id.as_str())
    }

    pub fn ownership_violations<'a>(&'a self, hierarchy: &Hierarchy) -> Vec<&'a Recommendation> {
        self.recommendations
            .iter()
            .filter(|r| !r.respects_ownership(hierarchy))
            .collect()
    }
}
