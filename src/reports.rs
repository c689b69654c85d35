//! Extraction report generation
//!
//! This module renders an [`ExtractReport`] as a plain-text summary,
//! JSON, or Markdown.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::extract::ExtractReport;
use crate::parsers::{Dependency, DependencyType};
use crate::utils::truncate_string;

const MAX_NAME_CHARS: usize = 60;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    pub files: usize,
    pub dependencies: usize,
    pub plugins: usize,
    pub skipped: usize,
    pub registries: usize,
    pub failed: usize,
}

impl ExtractionSummary {
    pub fn from_report(report: &ExtractReport) -> Self {
        let mut summary = Self {
            files: report.package_files.len(),
            registries: report.registry_urls.len(),
            failed: report.failed_files.len(),
            ..Default::default()
        };
        for dep in report.dependencies() {
            summary.dependencies += 1;
            if dep.dep_type == DependencyType::Plugin {
                summary.plugins += 1;
            }
            if dep.is_skipped() {
                summary.skipped += 1;
            }
        }
        summary
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: ExtractionSummary,
    #[serde(flatten)]
    report: &'a ExtractReport,
}

pub fn generate_json_report(report: &ExtractReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        summary: ExtractionSummary::from_report(report),
        report,
    })
}

fn version_label(dep: &Dependency) -> String {
    match (&dep.current_value, &dep.skip_reason) {
        (Some(value), None) => value.clone(),
        (Some(value), Some(reason)) => format!("{value} ({})", reason.as_str()),
        (None, Some(reason)) => format!("({})", reason.as_str()),
        (None, None) => "-".to_string(),
    }
}

pub fn generate_summary(report: &ExtractReport) -> String {
    let summary = ExtractionSummary::from_report(report);
    let mut lines = vec![format!(
        "{} dependencies ({} plugins, {} skipped) in {} files",
        summary.dependencies, summary.plugins, summary.skipped, summary.files
    )];

    for file in &report.package_files {
        lines.push(String::new());
        lines.push(format!("{}:", file.path.display()));
        for dep in &file.dependencies {
            lines.push(format!(
                "  {} {}",
                truncate_string(&dep.name, MAX_NAME_CHARS),
                version_label(dep)
            ));
        }
    }

    if !report.registry_urls.is_empty() {
        lines.push(String::new());
        lines.push("Repositories:".to_string());
        lines.extend(report.registry_urls.iter().map(|url| format!("  {url}")));
    }

    if !report.failed_files.is_empty() {
        lines.push(String::new());
        lines.push("Failed:".to_string());
        for failed in &report.failed_files {
            lines.push(format!("  {}: {}", failed.path.display(), failed.error));
        }
    }

    lines.join("\n")
}

pub fn generate_markdown_report(root: &Path, report: &ExtractReport) -> String {
    let summary = ExtractionSummary::from_report(report);
    let mut lines = vec![
        "# Gradle Dependency Report".to_string(),
        String::new(),
        format!("**Project**: {}", root.display()),
        format!("**Date**: {}", chrono::Local::now().format("%Y-%m-%d")),
        String::new(),
        "## Summary".to_string(),
        "| Item | Count |".to_string(),
        "|------|-------|".to_string(),
        format!("| Files | {} |", summary.files),
        format!("| Dependencies | {} |", summary.dependencies),
        format!("| Plugins | {} |", summary.plugins),
        format!("| Skipped | {} |", summary.skipped),
        format!("| Repositories | {} |", summary.registries),
        String::new(),
    ];

    if report.package_files.is_empty() {
        lines.push("## No dependencies found".to_string());
    }

    for file in &report.package_files {
        lines.push(format!("## {}", file.path.display()));
        lines.push(String::new());
        lines.push("| Dependency | Version | Type |".to_string());
        lines.push("|------------|---------|------|".to_string());
        for dep in &file.dependencies {
            let kind = match dep.dep_type {
                DependencyType::Regular => "library",
                DependencyType::Plugin => "plugin",
            };
            lines.push(format!(
                "| `{}` | {} | {kind} |",
                truncate_string(&dep.name, MAX_NAME_CHARS),
                version_label(dep)
            ));
        }
        lines.push(String::new());
    }

    if !report.registry_urls.is_empty() {
        lines.push("## Repositories".to_string());
        lines.push(String::new());
        lines.extend(report.registry_urls.iter().map(|url| format!("- <{url}>")));
        lines.push(String::new());
    }

    if !report.failed_files.is_empty() {
        lines.push("## Failed files".to_string());
        lines.push(String::new());
        for failed in &report.failed_files {
            lines.push(format!("- `{}`: {}", failed.path.display(), failed.error));
        }
    }

    lines.join("\n")
}
