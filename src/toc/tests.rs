use pretty_assertions::assert_eq;

use super::*;
use crate::toc::outline::parse_outline;
use crate::model::{FIELD_SEPARATOR, INDENT_TOKEN, RecognizedFragment, render_lines};

fn fragments(items: &[(&str, bool)]) -> Vec<RecognizedFragment> {
    items
        .iter()
        .map(|(text, line_break)| RecognizedFragment::new(text, *line_break))
        .collect()
}

#[test]
fn recognized_pages_flow_into_a_committable_outline() {
    let images = vec![
        fragments(&[
            ("차례", true),
            ("1장", false),
            ("시작하기", false),
            ("1", true),
            ("1.1", false),
            ("설치", false),
            ("2p", true),
            ("1.2", false),
            ("첫", false),
            ("프로그램", true),
        ]),
        fragments(&[
            ("2장", false),
            ("기본", false),
            ("문법", false),
            ("014", true),
            ("2.1", false),
            ("변수", false),
            ("15페이지", true),
            ("부록", false),
            ("A", false),
            ("30", true),
        ]),
    ];

    let recognized: Vec<String> = segment_images(&images)
        .iter()
        .map(|line| line.render())
        .collect();
    assert_eq!(
        recognized,
        vec![
            "차례",
            "1장 시작하기\t1",
            "1.1 설치\t2",
            "1.2 첫 프로그램",
            "2장 기본 문법\t14",
            "2.1 변수\t15",
            "부록 A\t30",
        ]
    );

    let catalog = PatternCatalog::new().unwrap();
    let indented = render_lines(&apply_indentation(&catalog, &recognized));
    assert_eq!(
        indented,
        vec![
            "1장 시작하기\t1",
            "    1.1 설치\t2",
            "    1.2 첫 프로그램",
            "2장 기본 문법\t14",
            "    2.1 변수\t15",
            "부록 A\t30",
        ]
    );

    let shifted = apply_page_offset(&indented, 2);
    let filled = apply_none_page(&shifted, -1);
    assert_eq!(filled[2], "    1.2 첫 프로그램\t15");

    let tree = parse_outline(&filled.join("\n"), INDENT_TOKEN, FIELD_SEPARATOR).unwrap();
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.roots.len(), 3);
    assert_eq!(tree.nodes[2].parent, Some(0));
    assert_eq!(tree.nodes[5].page_index, 31);
}

#[test]
fn reset_entries_commit_at_root_level() {
    let catalog = PatternCatalog::new().unwrap();
    let lines: Vec<String> = ["1. 가\t1", "1.1 나\t2", "에필로그\t9", "1.2 다\t10"]
        .iter()
        .map(|line| line.to_string())
        .collect();

    let depthed = apply_indentation(&catalog, &lines);
    assert_eq!(depthed[2].depth, -1);

    let tree = parse_outline(&render_lines(&depthed).join("\n"), INDENT_TOKEN, FIELD_SEPARATOR).unwrap();
    assert_eq!(tree.nodes[2].depth, 0);
    assert_eq!(tree.nodes[2].parent, None);
    assert_eq!(tree.nodes[3].parent, Some(2));
}

#[test]
fn depth_jumps_predict_outline_rejection() {
    let catalog = PatternCatalog::new().unwrap();
    let lines: Vec<String> = ["1. 가\t1", "1.1 나\t2", "1.1.1 다\t3", "부록\t4", "1.1.1 라\t5"]
        .iter()
        .map(|line| line.to_string())
        .collect();

    let depthed = apply_indentation(&catalog, &lines);
    assert_eq!(depth_jumps(&depthed), vec![4]);

    let err = parse_outline(&render_lines(&depthed).join("\n"), INDENT_TOKEN, FIELD_SEPARATOR)
        .unwrap_err();
    assert!(matches!(
        err,
        crate::error::OutlineError::DepthJump { line: 5, depth: 2, previous: 0, .. }
    ));
}
