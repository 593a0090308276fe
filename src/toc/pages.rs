use tracing::{debug, warn};

use crate::model::FIELD_SEPARATOR;

fn split_page(line: &str) -> Option<(&str, &str)> {
    line.rsplit_once(FIELD_SEPARATOR)
}

fn shift_page(page: u32, offset: i64) -> u32 {
    (i64::from(page) + offset).clamp(1, i64::from(u32::MAX)) as u32
}

pub fn apply_page_offset(lines: &[String], offset: i64) -> Vec<String> {
    if offset == 0 {
        return lines.to_vec();
    }

    lines
        .iter()
        .map(|line| {
            let Some((title, page)) = split_page(line) else {
                return line.clone();
            };
            match page.trim().parse::<u32>() {
                Ok(page) => format!("{title}{FIELD_SEPARATOR}{}", shift_page(page, offset)),
                Err(_) => {
                    debug!(line = %line, "page field is not a number, leaving line as is");
                    line.clone()
                }
            }
        })
        .collect()
}

/// Gives every page-less line a page derived from the nearest following
/// page-numbered line: that page plus `offset` for the closest line, plus
/// `offset` again for each line further up. Only offsets of 0 or less keep
/// pages non-decreasing; a positive offset returns the input unchanged.
pub fn apply_none_page(lines: &[String], offset: i64) -> Vec<String> {
    if offset > 0 {
        warn!(offset, "fill offset must be 0 or negative, leaving pages unchanged");
        return lines.to_vec();
    }

    let mut save_page: u32 = 1;
    let mut filled: Vec<String> = lines
        .iter()
        .rev()
        .map(|line| {
            if line.trim().is_empty() {
                return line.clone();
            }

            match split_page(line) {
                Some((_, page)) => {
                    match page.trim().parse::<u32>() {
                        Ok(page) => save_page = page,
                        Err(_) => debug!(line = %line, "page field is not a number"),
                    }
                    line.clone()
                }
                None => {
                    save_page = shift_page(save_page, offset);
                    format!("{line}{FIELD_SEPARATOR}{save_page}")
                }
            }
        })
        .collect();

    filled.reverse();
    filled
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn offset_shifts_pages_and_keeps_other_lines() {
        let input = lines(&["1. 가\t3", "    나", "다\t10"]);
        assert_eq!(
            apply_page_offset(&input, 2),
            lines(&["1. 가\t5", "    나", "다\t12"])
        );
    }

    #[test]
    fn zero_offset_is_identity() {
        let input = lines(&["가\t 3", "나"]);
        assert_eq!(apply_page_offset(&input, 0), input);
    }

    #[test]
    fn offset_clamps_at_first_page() {
        let input = lines(&["가\t1", "나\t2", "다\t5"]);
        let shifted = apply_page_offset(&input, -3);
        assert_eq!(shifted, lines(&["가\t1", "나\t1", "다\t2"]));
    }

    #[test]
    fn page_one_is_not_invertible() {
        let input = lines(&["가\t1", "나\t4"]);
        let round_trip = apply_page_offset(&apply_page_offset(&input, -1), 1);
        assert_eq!(round_trip, lines(&["가\t2", "나\t4"]));
    }

    #[test]
    fn malformed_page_field_passes_through() {
        let input = lines(&["가\tⅣ", "나\t7"]);
        assert_eq!(apply_page_offset(&input, 1), lines(&["가\tⅣ", "나\t8"]));
    }

    #[test]
    fn none_page_propagates_backward_from_known_pages() {
        let input = lines(&["가\t10", "나", "다", "라\t12"]);
        assert_eq!(
            apply_none_page(&input, -1),
            lines(&["가\t10", "나\t10", "다\t11", "라\t12"])
        );
        assert_eq!(input, lines(&["가\t10", "나", "다", "라\t12"]));
    }

    #[test]
    fn none_page_with_zero_offset_copies_next_page() {
        let input = lines(&["가", "    나", "다\t7", "라"]);
        assert_eq!(
            apply_none_page(&input, 0),
            lines(&["가\t7", "    나\t7", "다\t7", "라\t1"])
        );
    }

    #[test]
    fn none_page_skips_malformed_page_fields() {
        let input = lines(&["가", "나\tⅣ", "다\t8"]);
        assert_eq!(
            apply_none_page(&input, -1),
            lines(&["가\t7", "나\tⅣ", "다\t8"])
        );
    }

    #[test]
    fn none_page_leaves_blank_lines_alone() {
        let input = lines(&["가", "", "   ", "나\t5"]);
        assert_eq!(
            apply_none_page(&input, -1),
            lines(&["가\t4", "", "   ", "나\t5"])
        );
    }

    #[test]
    fn none_page_never_synthesizes_page_zero() {
        let input = lines(&["가", "나"]);
        assert_eq!(apply_none_page(&input, -1), lines(&["가\t1", "나\t1"]));
    }

    #[test]
    fn none_page_rejects_positive_offset() {
        let input = lines(&["가", "나\t3"]);
        assert_eq!(apply_none_page(&input, 1), input);
    }

    proptest! {
        #[test]
        fn offset_round_trip_restores_pages_from_two(
            pages in proptest::collection::vec(2u32..5000, 1..20),
        ) {
            let input: Vec<String> = pages
                .iter()
                .enumerate()
                .map(|(index, page)| format!("항목 {index}\t{page}"))
                .collect();
            let round_trip = apply_page_offset(&apply_page_offset(&input, 1), -1);
            prop_assert_eq!(round_trip, input);
        }
    }
}
