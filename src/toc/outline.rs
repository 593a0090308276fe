use tracing::debug;

use crate::error::OutlineError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub title: String,
    pub page_index: u32,
    pub depth: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutlineTree {
    pub nodes: Vec<OutlineNode>,
    pub roots: Vec<usize>,
}

impl OutlineTree {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    pub fn descendant_count(&self, index: usize) -> usize {
        self.nodes[index]
            .children
            .iter()
            .map(|&child| 1 + self.descendant_count(child))
            .sum()
    }

    fn push(&mut self, title: String, page_index: u32, depth: usize, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(OutlineNode {
            title,
            page_index,
            depth,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(index),
            None => self.roots.push(index),
        }
        index
    }
}

pub fn validate_tokens(indent: &str, separator: &str) -> Result<(), OutlineError> {
    if indent == separator {
        return Err(OutlineError::SeparatorConflict {
            token: indent.to_string(),
        });
    }
    Ok(())
}

fn leading_depth<'a>(line: &'a str, indent: &str) -> (usize, &'a str) {
    let mut depth = 0;
    let mut rest = line;
    if indent.is_empty() {
        return (depth, rest);
    }
    while let Some(stripped) = rest.strip_prefix(indent) {
        depth += 1;
        rest = stripped;
    }
    (depth, rest)
}

pub fn parse_outline(text: &str, indent: &str, separator: &str) -> Result<OutlineTree, OutlineError> {
    validate_tokens(indent, separator)?;

    let mut tree = OutlineTree::default();
    // last node created at each depth; truncated whenever a node is created
    let mut open: Vec<usize> = Vec::new();
    let mut previous_page: u32 = 0;

    for (index, raw) in text.lines().enumerate() {
        let line_number = index + 1;
        let raw = raw.trim_end_matches('\r');
        if raw.trim().is_empty() {
            continue;
        }

        let (depth, rest) = leading_depth(raw, indent);
        let fields: Vec<&str> = rest.split(separator).collect();
        let title = fields[0].trim().to_string();

        if tree.is_empty() && depth != 0 {
            return Err(OutlineError::FirstLineDepth {
                line: line_number,
                title,
                depth,
            });
        }

        let page_field = match fields.len() {
            2 => fields[1].trim(),
            1 => {
                return Err(OutlineError::MissingPage {
                    line: line_number,
                    title,
                });
            }
            count => {
                return Err(OutlineError::ExtraFields {
                    line: line_number,
                    title,
                    fields: count,
                });
            }
        };

        if page_field.is_empty() {
            return Err(OutlineError::EmptyPage {
                line: line_number,
                title,
            });
        }

        let page = match page_field.parse::<u32>() {
            Ok(page) if page >= 1 => page,
            _ => {
                return Err(OutlineError::InvalidPage {
                    line: line_number,
                    title,
                    page: page_field.to_string(),
                });
            }
        };

        if page < previous_page {
            return Err(OutlineError::PageOrder {
                line: line_number,
                title,
                previous: previous_page,
                page,
            });
        }
        previous_page = page;

        let parent = if depth == 0 {
            None
        } else {
            match open.get(depth - 1) {
                Some(&parent) => Some(parent),
                None => {
                    return Err(OutlineError::DepthJump {
                        line: line_number,
                        title,
                        depth,
                        previous: open.len().saturating_sub(1),
                    });
                }
            }
        };

        debug!(line = line_number, depth, page, title = %title, "parsed outline entry");

        let node = tree.push(title, page - 1, depth, parent);
        open.truncate(depth);
        open.push(node);
    }

    Ok(tree)
}
