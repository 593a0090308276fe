use anyhow::Result;
use tracing::{info, warn};

use crate::cli::IndentArgs;
use crate::model::{DepthedLine, render_lines};
use crate::toc::{PatternCatalog, apply_indentation, depth_jumps};
use crate::util::{read_lines, write_lines};

pub fn run(args: IndentArgs) -> Result<()> {
    let lines = read_lines(&args.input)?;
    let depthed = indent_lines(&lines)?;
    let indented = render_lines(&depthed);

    let output = args.output.as_ref().unwrap_or(&args.input);
    write_lines(output, &indented)?;
    info!(
        input_lines = lines.len(),
        output_lines = indented.len(),
        output = %output.display(),
        "indented outline"
    );

    let jumps = depth_jumps(&depthed).len();
    if jumps > 0 {
        warn!(entries = jumps, "outline has entries without a parent; edit them before applying");
    }

    Ok(())
}

pub fn indent_lines(lines: &[String]) -> Result<Vec<DepthedLine>> {
    let catalog = PatternCatalog::new()?;
    Ok(apply_indentation(&catalog, lines))
}
