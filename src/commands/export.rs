use anyhow::{Context, Result};
use tracing::info;

use crate::cli::ExportArgs;
use crate::model::render_lines;
use crate::pdf::read_outline;
use crate::util::write_lines;

pub fn run(args: ExportArgs) -> Result<()> {
    let lines = read_outline(&args.pdf)
        .with_context(|| format!("failed to read bookmarks of {}", args.pdf.display()))?;
    let rendered = render_lines(&lines);

    match &args.output {
        Some(output) => {
            write_lines(output, &rendered)?;
            info!(entries = rendered.len(), output = %output.display(), "exported outline");
        }
        None => {
            for line in &rendered {
                println!("{line}");
            }
        }
    }

    Ok(())
}
