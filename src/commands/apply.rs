use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ApplyArgs;
use crate::model::CommitSummary;
use crate::pdf::commit_outline;
use crate::toc::outline::{parse_outline, validate_tokens};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: ApplyArgs) -> Result<()> {
    let summary = apply_outline(&args.pdf, &args.outline, &args.indent, &args.separator)?;

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &summary)?;
        info!(path = %report_path.display(), "wrote commit summary");
    }

    println!(
        "outline applied: {} entries on {} pages, backup at {}",
        summary.outline_entries, summary.page_count, summary.backup
    );
    Ok(())
}

pub fn apply_outline(pdf: &Path, outline: &Path, indent: &str, separator: &str) -> Result<CommitSummary> {
    validate_tokens(indent, separator)?;

    let text = fs::read_to_string(outline)
        .with_context(|| format!("failed to read outline file {}", outline.display()))?;
    let tree = parse_outline(&text, indent, separator)
        .with_context(|| format!("invalid outline file {}", outline.display()))?;

    let source_sha256 = sha256_file(pdf)?;
    info!(
        pdf = %pdf.display(),
        entries = tree.len(),
        top_level = tree.roots.len(),
        "applying outline"
    );

    let committed = commit_outline(pdf, &tree)
        .with_context(|| format!("failed to apply outline to {}", pdf.display()))?;

    Ok(CommitSummary {
        source: pdf.display().to_string(),
        backup: committed.backup_path.display().to_string(),
        backup_overwritten: committed.backup_overwritten,
        source_sha256,
        page_count: committed.page_count,
        outline_entries: tree.len(),
        top_level_entries: tree.roots.len(),
        max_depth: tree.max_depth(),
        committed_at: now_utc_string(),
    })
}
