use serde::{Deserialize, Serialize};

pub const INDENT_TOKEN: &str = "    ";

pub const FIELD_SEPARATOR: &str = "\t";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecognizedFragment {
    #[serde(rename = "inferText")]
    pub text: String,
    #[serde(rename = "lineBreak")]
    pub line_break: bool,
}

impl RecognizedFragment {
    #[cfg(test)]
    pub fn new(text: &str, line_break: bool) -> Self {
        Self {
            text: text.to_string(),
            line_break,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocLine {
    pub raw_text: String,
    pub page: Option<u32>,
}

impl TocLine {
    pub fn parse(line: &str) -> Self {
        if let Some((title, page)) = line.rsplit_once(FIELD_SEPARATOR) {
            if let Ok(page) = page.trim().parse::<u32>() {
                return Self {
                    raw_text: title.trim_end().to_string(),
                    page: Some(page),
                };
            }
        }

        Self {
            raw_text: line.trim_end().to_string(),
            page: None,
        }
    }

    pub fn render(&self) -> String {
        match self.page {
            Some(page) => format!("{}{FIELD_SEPARATOR}{page}", self.raw_text),
            None => self.raw_text.clone(),
        }
    }
}

/// A title with its inferred nesting depth. Depth -1 marks a forced return
/// to the root level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepthedLine {
    pub depth: i32,
    pub title: String,
    pub page: Option<u32>,
}

impl DepthedLine {
    pub fn render(&self) -> String {
        let indent = INDENT_TOKEN.repeat(self.depth.max(0) as usize);
        match self.page {
            Some(page) => format!("{indent}{}{FIELD_SEPARATOR}{page}", self.title),
            None => format!("{indent}{}", self.title),
        }
    }
}

pub fn render_lines(lines: &[DepthedLine]) -> Vec<String> {
    lines.iter().map(DepthedLine::render).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitSummary {
    pub source: String,
    pub backup: String,
    pub backup_overwritten: bool,
    pub source_sha256: String,
    pub page_count: usize,
    pub outline_entries: usize,
    pub top_level_entries: usize,
    pub max_depth: usize,
    pub committed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedFiles {
    pub recognized: String,
    pub indented: String,
    pub offset: String,
    pub filled: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StageCounts {
    pub image_count: usize,
    pub images_skipped: usize,
    pub recognized_lines: usize,
    pub indented_lines: usize,
    pub lines_without_page: usize,
    pub depth_jumps: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub updated_at: String,
    pub ocr_batch_aborted: bool,
    pub page_offset: i64,
    pub fill_offset: i64,
    pub counts: StageCounts,
    pub files: StagedFiles,
    pub commit: Option<CommitSummary>,
    pub warnings: Vec<String>,
}
