//! Prompt and structured-output schema sent to the classifier.

use serde_json::{json, Value};

use crate::contract::AnalysisMode;
use crate::model::{Hierarchy, RecommendationType};

fn mode_line(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Weekly => "Weekly Checkup (focus on recent items)",
        AnalysisMode::Deep => "Full Initial Deep Dive",
    }
}

/// Classification policy, including the ownership rules.
pub fn system_instruction(mode: AnalysisMode) -> String {
    format!(
        r#"You are an expert Digital Librarian and File System Architect.
Your task is to analyze a cloud drive structure and provide optimization recommendations.

CRITICAL CRITERIA:
1. CONSOLIDATE: Identify folders that should be merged because their contents overlap or duplicate each other.
2. RENAME: Suggest clear, standard names for poorly named files (e.g. "Untitled-1" becomes "Project Pegasus - Marketing Strategy").
3. MOVE: Suggest relocating files to more semantically appropriate folders (e.g. invoices into an "Invoices" folder).
4. REDUNDANCY: Detect near-duplicate content across files even when their names differ. Count it in the stats and use it for CONSOLIDATE or ARCHIVE suggestions.

IMPORTANT PERMISSION RULES:
- Every file and folder carries an "ownedByMe" property.
- You MUST NOT generate any recommendation (RENAME, MOVE, CONSOLIDATE, ARCHIVE) whose fileId or folderId refers to an item where "ownedByMe" is false.
- You MUST NOT move files out of, or consolidate away, a folder where "ownedByMe" is false.
- Items not owned are context only. You may recommend moving an owned file INTO a folder you do not own, using that folder as suggestedFolderId.

OUTPUT RULES:
- Give every recommendation a unique id, a type, a reasoning and an impactScore between 1 and 100.
- Use fileId for file recommendations and folderId for folder recommendations, with ids taken from the input.

Mode: {mode}"#,
        mode = mode_line(mode)
    )
}

/// Data block: the full folder and file lists as JSON.
pub fn user_prompt(hierarchy: &Hierarchy) -> Result<String, serde_json::Error> {
    let folders = serde_json::to_string(&hierarchy.folders)?;
    let files = serde_json::to_string(&hierarchy.files)?;
    Ok(format!(
        "Current File/Folder Hierarchy:\nFolders: {folders}\nFiles: {files}\n\n\
         Analyze the contents and provide an OptimizationReport in JSON format."
    ))
}

/// Response schema in the classifier's OpenAPI subset.
pub fn response_schema() -> Value {
    let kinds: Vec<&str> = RecommendationType::ALL.iter().map(|k| k.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": { "type": "STRING" },
            "stats": {
                "type": "OBJECT",
                "properties": {
                    "redundantFolders": { "type": "INTEGER" },
                    "misnamedFiles": { "type": "INTEGER" },
                    "potentialSpaceSaved": { "type": "STRING" }
                },
                "required": ["redundantFolders", "misnamedFiles", "potentialSpaceSaved"]
            },
            "recommendations": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "type": {
                            "type": "STRING",
                            "format": "enum",
                            "enum": kinds,
                            "description": "RENAME, MOVE, CONSOLIDATE, ARCHIVE"
                        },
                        "fileId": { "type": "STRING" },
                        "folderId": { "type": "STRING" },
                        "currentPath": { "type": "STRING" },
                        "suggestedName": { "type": "STRING" },
                        "suggestedFolderId": { "type": "STRING" },
                        "reasoning": { "type": "STRING" },
                        "impactScore": { "type": "NUMBER" }
                    },
                    "required": ["id", "type", "reasoning", "impactScore"]
                }
            }
        },
        "required": ["summary", "recommendations", "stats"]
    })
}
