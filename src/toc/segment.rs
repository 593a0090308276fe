use tracing::debug;

use crate::model::{FIELD_SEPARATOR, RecognizedFragment, TocLine};

const PAGE_SUFFIXES: [&str; 2] = ["p", "페이지"];

pub fn page_number_value(text: &str) -> Option<u32> {
    let trimmed = text.trim();
    let digits = PAGE_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed);

    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }

    digits.parse::<u32>().ok()
}

pub fn segment_images(images: &[Vec<RecognizedFragment>]) -> Vec<TocLine> {
    let mut lines = Vec::new();

    for (image_index, fragments) in images.iter().enumerate() {
        let mut line = String::new();
        let mut line_start = true;

        for fragment in fragments {
            let page = page_number_value(&fragment.text);

            match page {
                Some(value) if !line_start && fragment.line_break => {
                    line.push_str(FIELD_SEPARATOR);
                    line.push_str(&value.to_string());
                }
                _ => {
                    if !line_start {
                        line.push(' ');
                    }
                    match page {
                        Some(value) => line.push_str(&value.to_string()),
                        None => line.push_str(&fragment.text),
                    }
                }
            }

            line_start = fragment.line_break;
            if fragment.line_break {
                close_line(&mut line, &mut lines);
            }
        }

        if !line.trim().is_empty() {
            debug!(image = image_index, text = %line, "flushing unterminated line");
        }
        close_line(&mut line, &mut lines);
    }

    lines
}

fn close_line(line: &mut String, lines: &mut Vec<TocLine>) {
    let text = std::mem::take(line);
    if text.trim().is_empty() {
        return;
    }
    lines.push(TocLine::parse(text.trim()));
}
