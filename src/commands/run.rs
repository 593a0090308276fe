use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::commands::apply::apply_outline;
use crate::commands::indent::indent_lines;
use crate::commands::ocr::recognize_lines;
use crate::commands::pages::count_without_page;
use crate::model::{
    FIELD_SEPARATOR, INDENT_TOKEN, PipelineManifest, StageCounts, StagedFiles, render_lines,
};
use crate::toc::{apply_none_page, apply_page_offset, depth_jumps};
use crate::util::{
    ensure_directory, now_utc_string, utc_compact_string, write_json_pretty, write_lines,
};

pub fn run(args: RunArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    ensure_directory(&args.work_dir)?;
    info!(work_dir = %args.work_dir.display(), run_id = %run_id, "starting outline run");

    let (batch, recognized) = recognize_lines(&args.inputs, &args.service)?;
    let mut warnings = batch.warnings.clone();
    if batch.aborted {
        warnings.push("OCR batch aborted; later stages used partial results".to_string());
    }

    let (files, mut counts) =
        stage_lines(&args.work_dir, &recognized, args.page_offset, args.fill_offset)?;
    counts.image_count = batch.images.len() + batch.skipped.len();
    counts.images_skipped = batch.skipped.len();
    if counts.depth_jumps > 0 {
        warnings.push(format!(
            "{} entries in {} have no parent entry; edit them before applying",
            counts.depth_jumps, files.indented
        ));
    }

    let commit = match &args.pdf {
        Some(pdf) => Some(apply_outline(
            pdf,
            Path::new(&files.filled),
            INDENT_TOKEN,
            FIELD_SEPARATOR,
        )?),
        None => None,
    };

    let manifest = PipelineManifest {
        manifest_version: 1,
        run_id,
        started_at,
        updated_at: now_utc_string(),
        ocr_batch_aborted: batch.aborted,
        page_offset: args.page_offset,
        fill_offset: args.fill_offset,
        counts,
        files,
        commit,
        warnings,
    };

    let manifest_path = args
        .work_dir
        .join(format!("pipeline_run_{}.json", utc_compact_string(started_ts)));
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote run manifest");

    if manifest.counts.lines_without_page > 0 {
        warn!(
            lines = manifest.counts.lines_without_page,
            "entries still lack a page number"
        );
    }

    Ok(())
}

pub fn stage_lines(
    work_dir: &Path,
    recognized: &[String],
    page_offset: i64,
    fill_offset: i64,
) -> Result<(StagedFiles, StageCounts)> {
    let recognized_path = work_dir.join("1-recognized.txt");
    let indented_path = work_dir.join("2-indented.txt");
    let offset_path = work_dir.join("3-offset.txt");
    let filled_path = work_dir.join("4-filled.txt");

    write_lines(&recognized_path, recognized)?;

    let depthed = indent_lines(recognized)?;
    let indented = render_lines(&depthed);
    write_lines(&indented_path, &indented)?;

    let shifted = apply_page_offset(&indented, page_offset);
    write_lines(&offset_path, &shifted)?;

    let filled = apply_none_page(&shifted, fill_offset);
    write_lines(&filled_path, &filled)?;

    info!(
        recognized = recognized.len(),
        indented = indented.len(),
        "staged outline files"
    );

    let counts = StageCounts {
        recognized_lines: recognized.len(),
        indented_lines: indented.len(),
        lines_without_page: count_without_page(&filled),
        depth_jumps: depth_jumps(&depthed).len(),
        ..StageCounts::default()
    };
    let files = StagedFiles {
        recognized: recognized_path.display().to_string(),
        indented: indented_path.display().to_string(),
        offset: offset_path.display().to_string(),
        filled: filled_path.display().to_string(),
    };

    Ok((files, counts))
}
