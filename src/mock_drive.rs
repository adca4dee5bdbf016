//! Fixed in-memory drive used in place of a real storage listing.
//!
//! The fixture has one root, five owned folders at depth one and two, and a
//! shared folder (`f6`) the user does not own. File summaries are written so
//! that a classifier can spot the duplicated Pegasus marketing plan, the
//! invoice filed under "Unorganized stuff" and several meaningless names.

use async_trait::async_trait;
use tracing::debug;

use crate::contract::HierarchyProvider;
use crate::error::HierarchyError;
use crate::model::{DriveFile, Folder, Hierarchy};

/// [`HierarchyProvider`] that always serves [`generate`].
#[derive(Debug, Default, Clone, Copy)]
pub struct MockDrive;

#[async_trait]
impl HierarchyProvider for MockDrive {
    async fn load(&self) -> Result<Hierarchy, HierarchyError> {
        let hierarchy = generate();
        debug!(
            folders = hierarchy.folders.len(),
            files = hierarchy.files.len(),
            "Serving mock drive hierarchy"
        );
        Ok(hierarchy)
    }
}

fn folder(id: &str, name: &str, parent_id: Option<&str>, owned_by_me: bool) -> Folder {
    Folder {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent_id.map(str::to_string),
        owned_by_me,
    }
}

struct FileSpec<'a> {
    id: &'a str,
    name: &'a str,
    mime_type: &'a str,
    parent: &'a str,
    created: &'a str,
    modified: &'a str,
    summary: &'a str,
    size: &'a str,
    owned: bool,
}

impl From<FileSpec<'_>> for DriveFile {
    fn from(spec: FileSpec<'_>) -> Self {
        DriveFile {
            id: spec.id.to_string(),
            name: spec.name.to_string(),
            mime_type: spec.mime_type.to_string(),
            parent_folder_id: spec.parent.to_string(),
            created_time: spec.created.to_string(),
            modified_time: spec.modified.to_string(),
            content_summary: spec.summary.to_string(),
            size: spec.size.to_string(),
            owned_by_me: spec.owned,
        }
    }
}

/// Deterministic seven-folder, six-file sample drive.
pub fn generate() -> Hierarchy {
    let folders = vec![
        folder("root", "My Drive", None, true),
        folder("f1", "Drafts 2023", Some("root"), true),
        folder("f2", "Work Project Final", Some("root"), true),
        folder("f3", "Unorganized stuff", Some("root"), true),
        folder("f4", "Invoices", Some("root"), true),
        folder("f5", "Old Invoices", Some("f4"), true),
        folder("f6", "Shared Team Assets", Some("root"), false),
    ];

    let files = vec![
        FileSpec {
            id: "file1",
            name: "Untitled-1.docx",
            mime_type: "application/vnd.google-apps.document",
            parent: "f1",
            created: "2023-01-15T10:00:00Z",
            modified: "2023-01-15T10:00:00Z",
            summary: "This document contains the marketing strategy for Project Pegasus. \
                      It outlines the budget of $50,000 and the launch date in Q4.",
            size: "25KB",
            owned: true,
        },
        FileSpec {
            id: "file2",
            name: "Scan_001.pdf",
            mime_type: "application/pdf",
            parent: "f3",
            created: "2024-05-20T14:30:00Z",
            modified: "2024-05-20T14:30:00Z",
            summary: "Invoice #INV-9928 from Acme Corp for Cloud Services. \
                      Amount due: $1,200. Date: May 15, 2024.",
            size: "1.2MB",
            owned: true,
        },
        FileSpec {
            id: "file3",
            name: "meeting_notes_v2.txt",
            mime_type: "text/plain",
            parent: "f2",
            created: "2023-11-05T09:00:00Z",
            modified: "2023-11-05T11:45:00Z",
            summary: "Notes from the client meeting regarding Project Pegasus. \
                      Discussed rebranding and logo design iterations.",
            size: "5KB",
            owned: true,
        },
        FileSpec {
            id: "file4",
            name: "Backup_copy_final_final.docx",
            mime_type: "application/vnd.google-apps.document",
            parent: "f3",
            created: "2023-02-10T16:00:00Z",
            modified: "2023-02-12T10:00:00Z",
            summary: "Finalized marketing plan for Pegasus Project. \
                      Same as Untitled-1 but with minor edits on the timeline.",
            size: "28KB",
            owned: true,
        },
        FileSpec {
            id: "file5",
            name: "Receipt.jpg",
            mime_type: "image/jpeg",
            parent: "f3",
            created: "2024-06-01T12:00:00Z",
            modified: "2024-06-01T12:00:00Z",
            summary: "Receipt for team lunch at Italian Bistro. \
                      Amount: $85.50. Project: Team Building.",
            size: "450KB",
            owned: true,
        },
        FileSpec {
            id: "file6",
            name: "Q3_Financials_Shared.xlsx",
            mime_type: "application/vnd.google-apps.spreadsheet",
            parent: "f6",
            created: "2024-07-01T09:00:00Z",
            modified: "2024-07-05T16:00:00Z",
            summary: "Shared financial report from the Finance Dept. Read-only access.",
            size: "1.5MB",
            owned: false,
        },
    ]
    .into_iter()
    .map(DriveFile::from)
    .collect();

    Hierarchy { files, folders }
}
