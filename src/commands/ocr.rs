use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::{OcrArgs, OcrServiceArgs};
use crate::ocr::{ClovaClient, OcrBatch, collect_images, recognize_batch};
use crate::toc::segment_images;
use crate::util::write_lines;

pub fn run(args: OcrArgs) -> Result<()> {
    let (batch, lines) = recognize_lines(&args.inputs, &args.service)?;
    write_lines(&args.output, &lines)?;

    info!(
        lines = lines.len(),
        output = %args.output.display(),
        "wrote recognized lines"
    );
    if batch.aborted {
        warn!("OCR batch stopped early; the line file holds partial results");
    }

    Ok(())
}

pub fn recognize_lines(
    inputs: &[PathBuf],
    service: &OcrServiceArgs,
) -> Result<(OcrBatch, Vec<String>)> {
    let images = collect_images(inputs)?;
    if images.is_empty() {
        bail!("no images found in the given inputs");
    }

    let client = ClovaClient::new(service.config())?;
    let batch = recognize_batch(&client, &images);
    let lines = segment_images(&batch.images)
        .iter()
        .map(|line| line.render())
        .collect();

    Ok((batch, lines))
}
