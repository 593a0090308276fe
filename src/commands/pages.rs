use anyhow::Result;
use tracing::info;

use crate::cli::{FillPagesArgs, OffsetArgs};
use crate::model::FIELD_SEPARATOR;
use crate::toc::{apply_none_page, apply_page_offset};
use crate::util::{read_lines, write_lines};

pub fn run_offset(args: OffsetArgs) -> Result<()> {
    let lines = read_lines(&args.input)?;
    let shifted = apply_page_offset(&lines, args.offset);

    let output = args.output.as_ref().unwrap_or(&args.input);
    write_lines(output, &shifted)?;
    info!(offset = args.offset, output = %output.display(), "shifted page numbers");

    Ok(())
}

pub fn run_fill(args: FillPagesArgs) -> Result<()> {
    let lines = read_lines(&args.input)?;
    let missing = count_without_page(&lines);
    let filled = apply_none_page(&lines, args.offset);

    let output = args.output.as_ref().unwrap_or(&args.input);
    write_lines(output, &filled)?;
    info!(
        offset = args.offset,
        filled = missing - count_without_page(&filled),
        output = %output.display(),
        "filled missing page numbers"
    );

    Ok(())
}

pub fn count_without_page(lines: &[String]) -> usize {
    lines
        .iter()
        .filter(|line| !line.trim().is_empty() && !line.contains(FIELD_SEPARATOR))
        .count()
}
