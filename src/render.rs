//! Plain-text views of the dashboard: login screen, header, analysis card,
//! file-type distribution and the recommendation list.

use std::fmt::Write;

use crate::contract::AnalysisMode;
use crate::dashboard::{DashboardState, Notice, Phase};
use crate::distribution::CategoryCount;
use crate::model::{Recommendation, RecommendationType};

const APP_NAME: &str = "DriveOptima AI";

pub fn login_view() -> String {
    format!(
        "{APP_NAME}\n\
         Your intelligent storage architect. Analyze, organize, and optimize your drive.\n\n\
         Not signed in. Run `drive-optima login` to enter demo mode.\n"
    )
}

pub fn header_view(user: &str) -> String {
    format!("{APP_NAME} | {user}\n")
}

pub fn distribution_view(counts: &[CategoryCount]) -> String {
    let total: usize = counts.iter().map(|c| c.count).sum();
    let mut out = String::from("File types\n");
    if total == 0 {
        out.push_str("  (no files)\n");
        return out;
    }
    for c in counts {
        let pct = c.count as f64 * 100.0 / total as f64;
        let _ = writeln!(out, "  {:<8} {:>3}  {:>5.1}%", c.category.label(), c.count, pct);
    }
    out
}

fn scan_label(mode: AnalysisMode) -> &'static str {
    match mode {
        AnalysisMode::Deep => "Deep Scan",
        AnalysisMode::Weekly => "Quick Scan",
    }
}

fn recommendation_detail(rec: &Recommendation, state: &DashboardState) -> String {
    let hierarchy = state.hierarchy();
    let current = rec
        .current_path
        .clone()
        .or_else(|| rec.file_id.as_deref().and_then(|id| hierarchy.file_path(id)))
        .or_else(|| rec.folder_id.as_deref().and_then(|id| hierarchy.folder_path(id)))
        .unwrap_or_else(|| "(unknown item)".to_string());

    match rec.kind {
        RecommendationType::Rename => format!(
            "{current} -> {}",
            rec.suggested_name.as_deref().unwrap_or("(no name suggested)")
        ),
        _ => {
            let target = rec
                .suggested_folder_id
                .as_deref()
                .map(|id| hierarchy.folder_path(id).unwrap_or_else(|| id.to_string()))
                .unwrap_or_else(|| "Target Folder".to_string());
            format!("\"{current}\" -> {target}")
        }
    }
}

fn recommendation_line(rec: &Recommendation, state: &DashboardState, out: &mut String) {
    let marker = if state.is_completed(&rec.id) {
        "[done]"
    } else if state.is_selected(&rec.id) {
        "[x]"
    } else {
        "[ ]"
    };
    let impact = if rec.impact_score > 80.0 { "!" } else { " " };
    let _ = writeln!(
        out,
        "{marker:<6} {:<11} {:>3.0}% impact{impact} {}  ({})",
        rec.kind,
        rec.impact_score,
        recommendation_detail(rec, state),
        rec.id
    );
    let _ = writeln!(out, "         {}", rec.reasoning);
    if rec.kind == RecommendationType::Rename && !state.is_completed(&rec.id) {
        let _ = writeln!(out, "         quick apply: --quick-rename {}", rec.id);
    }
}

/// Full dashboard for a signed-in user.
pub fn dashboard_view(state: &DashboardState) -> String {
    let Some(user) = state.user() else {
        return login_view();
    };

    let mut out = header_view(user);
    if let Some(notice) = state.notice() {
        match notice {
            Notice::Info(m) => {
                let _ = writeln!(out, "\n{m}");
            }
            Notice::Error(m) => {
                let _ = writeln!(out, "\nError: {m}");
            }
        }
    }

    match state.phase() {
        Phase::Loading => {
            let _ = writeln!(
                out,
                "\nAnalyzing... reviewing {} files",
                state.hierarchy().files.len()
            );
        }
        Phase::Idle => {
            out.push('\n');
            out.push_str(&distribution_view(&state.file_type_distribution()));
            out.push_str("\nNo analysis yet. Run `drive-optima analyze` (add --weekly for a quick sync).\n");
        }
        Phase::Ready => {
            let Some(report) = state.report() else {
                return out;
            };
            let _ = write!(
                out,
                "\nAnalysis results\n  Redundant folders: {}\n  Misnamed files:    {}\n  Space saved:       {}\n\n",
                report.stats.redundant_folders,
                report.stats.misnamed_files,
                report.stats.potential_space_saved
            );
            out.push_str(&distribution_view(&state.file_type_distribution()));
            let _ = write!(
                out,
                "\n{} | {} selected\n{}\n\n",
                scan_label(state.report_mode()),
                state.selected().len(),
                report.summary
            );
            if report.recommendations.is_empty() {
                out.push_str("No recommendations. Your drive looks tidy.\n");
            }
            for rec in &report.recommendations {
                recommendation_line(rec, state, &mut out);
            }
        }
    }
    out
}
