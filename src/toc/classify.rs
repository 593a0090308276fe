use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, warn};

use crate::model::{DepthedLine, INDENT_TOKEN, TocLine};

/// Heading forms, coarse to fine. The index of a pattern is its identity in
/// the per-run depth bindings, so the order must not change.
const STRUCTURAL_PATTERNS: [&str; 12] = [
    r"^\d+[. -](?:\D|$)",
    r"^\d+(?:[.-]\d+){1}(?:$|[^\d.\-]|[.-](?:\D|$))",
    r"^\d+(?:[.-]\d+){2}(?:$|[^\d.\-]|[.-](?:\D|$))",
    r"^\d+(?:[.-]\d+){3}(?:$|[^\d.\-]|[.-](?:\D|$))",
    r"^\d+(?:[.-]\d+){4}(?:$|[^\d.\-]|[.-](?:\D|$))",
    r"^\d+\s*장(?:[. -]+.*)?$",
    r"^\d+\s*부(?:[. -]+.*)?$",
    r"^\d+\s*편(?:[. -]+.*)?$",
    r"^CHAPTER\s*\d+(?:[. -]+.*)?$",
    r"^LESSON\s*\d+(?:[. -]+.*)?$",
    r"^PART\s*\d+(?:[. -]+.*)?$",
    r"^PART\s*(?:I{1,3}|IV|V|VI{0,3}|IX|X)+(?:[. -]+.*)?$",
];

const RESET_PATTERNS: [&str; 1] =
    [r"^(?:APPENDIX|부록|찾아보기|인용|INDEX|후기|마치|EPILOGUE|에필로그|출처)"];

const DISCARD_PATTERNS: [&str; 2] = [r"^\d+$", r"^\w+$"];

pub struct PatternCatalog {
    structural: Vec<Regex>,
    reset: Vec<Regex>,
    discard: Vec<Regex>,
}

impl PatternCatalog {
    pub fn new() -> Result<Self> {
        Ok(Self {
            structural: compile_all(&STRUCTURAL_PATTERNS, "structural")?,
            reset: compile_all(&RESET_PATTERNS, "reset")?,
            discard: compile_all(&DISCARD_PATTERNS, "discard")?,
        })
    }

    pub fn len(&self) -> usize {
        self.structural.len()
    }

    pub fn structural_index(&self, text: &str) -> Option<usize> {
        self.structural
            .iter()
            .position(|pattern| pattern.is_match(text))
    }

    pub fn is_reset(&self, text: &str) -> bool {
        self.reset.iter().any(|pattern| pattern.is_match(text))
    }

    pub fn is_discard(&self, text: &str) -> bool {
        self.discard.iter().any(|pattern| pattern.is_match(text))
    }
}

fn compile_all(patterns: &[&str], kind: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(&format!("(?i){pattern}"))
                .with_context(|| format!("failed to compile {kind} pattern {pattern}"))
        })
        .collect()
}

struct DepthState {
    current_depth: i32,
    bindings: Vec<Option<i32>>,
}

impl DepthState {
    fn new(catalog_len: usize) -> Self {
        Self {
            current_depth: -1,
            bindings: vec![None; catalog_len],
        }
    }

    fn reset(&mut self) -> i32 {
        self.current_depth = -1;
        self.current_depth
    }

    fn continuation(&self) -> i32 {
        self.current_depth + 1
    }

    fn observe(&mut self, index: usize) -> i32 {
        self.current_depth = match self.bindings[index] {
            Some(depth) => depth,
            None => {
                let depth = self.current_depth + 1;
                self.bindings[index] = Some(depth);
                depth
            }
        };
        self.current_depth
    }
}

pub fn apply_indentation(catalog: &PatternCatalog, lines: &[String]) -> Vec<DepthedLine> {
    let mut state = DepthState::new(catalog.len());
    let mut indented = Vec::with_capacity(lines.len());

    for raw in lines {
        let line = raw.trim_start_matches(INDENT_TOKEN).trim();
        if line.is_empty() {
            continue;
        }
        if catalog.is_discard(line) {
            debug!(line = %line, "discarding noise line");
            continue;
        }

        let toc_line = TocLine::parse(line);
        let title = toc_line.raw_text.as_str();

        let depth = if catalog.is_reset(title) {
            state.reset()
        } else {
            match catalog.structural_index(title) {
                Some(index) => state.observe(index),
                None => state.continuation(),
            }
        };

        indented.push(DepthedLine {
            depth,
            title: toc_line.raw_text,
            page: toc_line.page,
        });
    }

    for index in depth_jumps(&indented) {
        let line = &indented[index];
        warn!(
            entry = index + 1,
            depth = line.depth,
            title = %line.title,
            "entry sits more than one level below the previous entry and needs a manual fix"
        );
    }

    indented
}

/// Positions of entries rendered more than one level deeper than the entry
/// before them. Such an entry has no parent once serialized.
pub fn depth_jumps(lines: &[DepthedLine]) -> Vec<usize> {
    let mut previous = -1;
    let mut jumps = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let depth = line.depth.max(0);
        if depth > previous + 1 {
            jumps.push(index);
        }
        previous = depth;
    }
    jumps
}
