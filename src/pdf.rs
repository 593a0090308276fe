use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat, dictionary};
use tracing::{debug, info, warn};

use crate::error::OutlineError;
use crate::model::DepthedLine;
use crate::toc::OutlineTree;

const TEMPORARY_PREFIX: &str = "_";
const BACKUP_PREFIX: &str = "_BAK_";

#[derive(Debug, Clone)]
pub struct CommittedOutline {
    pub page_count: usize,
    pub backup_path: PathBuf,
    pub backup_overwritten: bool,
}

fn pdf_error(err: lopdf::Error) -> OutlineError {
    OutlineError::Pdf(err.to_string())
}

fn sibling_path(source: &Path, prefix: &str) -> Result<PathBuf, OutlineError> {
    let name = source
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| OutlineError::Pdf(format!("invalid document path: {}", source.display())))?;
    Ok(source.with_file_name(format!("{prefix}{name}")))
}

pub fn backup_path(source: &Path) -> Result<PathBuf, OutlineError> {
    sibling_path(source, BACKUP_PREFIX)
}

pub fn commit_outline(source: &Path, tree: &OutlineTree) -> Result<CommittedOutline, OutlineError> {
    if tree.is_empty() {
        return Err(OutlineError::EmptyOutline);
    }

    let mut document = Document::load(source).map_err(pdf_error)?;
    let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();

    for node in &tree.nodes {
        if node.page_index as usize >= page_ids.len() {
            return Err(OutlineError::PageOutOfRange {
                title: node.title.clone(),
                page: node.page_index + 1,
                page_count: page_ids.len(),
            });
        }
    }

    let outlines_id = write_outline(&mut document, tree, &page_ids);
    let replaced_existing = set_catalog_outline(&mut document, outlines_id)?;
    if replaced_existing {
        let pruned = document.prune_objects();
        debug!(objects = pruned.len(), "dropped previous bookmark objects");
    }

    let temporary = sibling_path(source, TEMPORARY_PREFIX)?;
    let backup = backup_path(source)?;

    if let Err(err) = document.save(&temporary) {
        let _ = fs::remove_file(&temporary);
        return Err(OutlineError::io("write", &temporary, err));
    }

    let backup_overwritten = backup.exists();
    if backup_overwritten {
        warn!(backup = %backup.display(), "replacing existing backup with the current document");
    }
    if let Err(err) = fs::rename(source, &backup) {
        let _ = fs::remove_file(&temporary);
        return Err(OutlineError::io("back up", source, err));
    }
    fs::rename(&temporary, source).map_err(|err| OutlineError::io("replace", source, err))?;

    info!(
        source = %source.display(),
        backup = %backup.display(),
        entries = tree.len(),
        "committed outline"
    );

    Ok(CommittedOutline {
        page_count: page_ids.len(),
        backup_path: backup,
        backup_overwritten,
    })
}

fn write_outline(document: &mut Document, tree: &OutlineTree, page_ids: &[ObjectId]) -> ObjectId {
    let outlines_id = document.new_object_id();
    let ids: Vec<ObjectId> = tree.nodes.iter().map(|_| document.new_object_id()).collect();

    // (prev, next) sibling of every node
    let mut links: Vec<(Option<usize>, Option<usize>)> = vec![(None, None); tree.len()];
    let sibling_lists = std::iter::once(&tree.roots).chain(tree.nodes.iter().map(|node| &node.children));
    for siblings in sibling_lists {
        for pair in siblings.windows(2) {
            links[pair[0]].1 = Some(pair[1]);
            links[pair[1]].0 = Some(pair[0]);
        }
    }

    for (index, node) in tree.nodes.iter().enumerate() {
        let parent = node.parent.map_or(outlines_id, |parent| ids[parent]);
        let mut item = dictionary! {
            "Title" => encode_text_string(&node.title),
            "Parent" => Object::Reference(parent),
            "Dest" => vec![
                Object::Reference(page_ids[node.page_index as usize]),
                Object::Name(b"Fit".to_vec()),
            ],
        };

        let (prev, next) = links[index];
        if let Some(prev) = prev {
            item.set("Prev", Object::Reference(ids[prev]));
        }
        if let Some(next) = next {
            item.set("Next", Object::Reference(ids[next]));
        }
        if let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) {
            item.set("First", Object::Reference(ids[first]));
            item.set("Last", Object::Reference(ids[last]));
            item.set("Count", tree.descendant_count(index) as i64);
        }

        document.objects.insert(ids[index], Object::Dictionary(item));
    }

    let mut outlines = dictionary! {
        "Type" => "Outlines",
        "Count" => tree.len() as i64,
    };
    if let (Some(&first), Some(&last)) = (tree.roots.first(), tree.roots.last()) {
        outlines.set("First", Object::Reference(ids[first]));
        outlines.set("Last", Object::Reference(ids[last]));
    }
    document.objects.insert(outlines_id, Object::Dictionary(outlines));

    outlines_id
}

fn catalog_id(document: &Document) -> Result<ObjectId, OutlineError> {
    document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| OutlineError::Pdf("document has no catalog".to_string()))
}

fn set_catalog_outline(document: &mut Document, outlines_id: ObjectId) -> Result<bool, OutlineError> {
    let catalog_id = catalog_id(document)?;
    let catalog: &mut Dictionary = document
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(pdf_error)?;

    let replaced = catalog.remove(b"Outlines").is_some();
    catalog.set("Outlines", Object::Reference(outlines_id));
    catalog.set("PageMode", "UseOutlines");

    Ok(replaced)
}

fn encode_text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(rest).into_owned();
    }
    bytes.iter().map(|&byte| byte as char).collect()
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Result<&'a Object, OutlineError> {
    match object {
        Object::Reference(id) => document.get_object(*id).map_err(pdf_error),
        other => Ok(other),
    }
}

pub fn read_outline(path: &Path) -> Result<Vec<DepthedLine>, OutlineError> {
    let document = Document::load(path).map_err(pdf_error)?;
    let catalog = document
        .get_dictionary(catalog_id(&document)?)
        .map_err(pdf_error)?;

    let Ok(outlines) = catalog.get(b"Outlines") else {
        return Ok(Vec::new());
    };
    let outlines = resolve(&document, outlines)?.as_dict().map_err(pdf_error)?;

    let page_numbers: Vec<(ObjectId, u32)> = document
        .get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect();

    let mut lines = Vec::new();
    let mut visited = HashSet::new();
    walk_items(
        &document,
        outlines.get(b"First").ok(),
        0,
        &page_numbers,
        &mut visited,
        &mut lines,
    )?;
    Ok(lines)
}

fn walk_items(
    document: &Document,
    first: Option<&Object>,
    depth: i32,
    page_numbers: &[(ObjectId, u32)],
    visited: &mut HashSet<ObjectId>,
    lines: &mut Vec<DepthedLine>,
) -> Result<(), OutlineError> {
    let mut current = first.and_then(|object| object.as_reference().ok());

    while let Some(id) = current {
        if !visited.insert(id) {
            return Err(OutlineError::Pdf(format!(
                "bookmark {} {} R is linked more than once",
                id.0, id.1
            )));
        }

        let item = document.get_dictionary(id).map_err(pdf_error)?;
        let title = match item.get(b"Title") {
            Ok(title) => resolve(document, title)?
                .as_str()
                .map(decode_text_string)
                .unwrap_or_default(),
            Err(_) => String::new(),
        };

        lines.push(DepthedLine {
            depth,
            title,
            page: destination_page(document, item, page_numbers),
        });

        walk_items(
            document,
            item.get(b"First").ok(),
            depth + 1,
            page_numbers,
            visited,
            lines,
        )?;

        current = item
            .get(b"Next")
            .ok()
            .and_then(|object| object.as_reference().ok());
    }

    Ok(())
}

fn destination_page(document: &Document, item: &Dictionary, page_numbers: &[(ObjectId, u32)]) -> Option<u32> {
    let destination = match item.get(b"Dest") {
        Ok(dest) => resolve(document, dest).ok()?,
        Err(_) => {
            let action = resolve(document, item.get(b"A").ok()?).ok()?.as_dict().ok()?;
            resolve(document, action.get(b"D").ok()?).ok()?
        }
    };

    let page_id = destination.as_array().ok()?.first()?.as_reference().ok()?;
    page_numbers
        .iter()
        .find(|(id, _)| *id == page_id)
        .map(|(_, number)| *number)
}

#[cfg(test)]
pub(crate) fn write_test_pdf(path: &Path, num_pages: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let catalog_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for page_num in 0..num_pages {
        let content = format!("BT /F1 12 Tf 50 700 Td (Page-{}) Tj ET", page_num + 1);
        let content_id = doc.add_object(lopdf::Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "Contents" => Object::Reference(content_id),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        page_ids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => num_pages as i64,
            "Kids" => page_ids,
        }),
    );
    doc.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        }),
    );
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.save(path).unwrap();
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::toc::outline::parse_outline;
    use crate::util::sha256_file;

    fn tree(text: &str) -> OutlineTree {
        parse_outline(text, "    ", "\t").unwrap()
    }

    #[test]
    fn text_strings_round_trip() {
        for title in ["Chapter 1", "1장 시작하기", "Über café"] {
            let object = encode_text_string(title);
            assert_eq!(decode_text_string(object.as_str().unwrap()), title);
        }
    }

    #[test]
    fn commit_writes_nested_bookmarks_and_keeps_backup() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        write_test_pdf(&source, 6);
        let original_hash = sha256_file(&source).unwrap();

        let outline = tree("1장 시작하기\t1\n    1.1 설치\t2\n    1.2 설정\t3\n2장 문법\t4\n    2.1 변수\t6\n");
        let committed = commit_outline(&source, &outline).unwrap();

        assert_eq!(committed.page_count, 6);
        assert_eq!(committed.backup_path, dir.path().join("_BAK_book.pdf"));
        assert_eq!(sha256_file(&committed.backup_path).unwrap(), original_hash);
        assert!(!dir.path().join("_book.pdf").exists());

        let reloaded = Document::load(&source).unwrap();
        assert_eq!(reloaded.get_pages().len(), 6);

        let lines = read_outline(&source).unwrap();
        let rendered = crate::model::render_lines(&lines);
        assert_eq!(
            rendered,
            vec![
                "1장 시작하기\t1",
                "    1.1 설치\t2",
                "    1.2 설정\t3",
                "2장 문법\t4",
                "    2.1 변수\t6",
            ]
        );
    }

    #[test]
    fn recommit_replaces_previous_outline() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        write_test_pdf(&source, 3);

        let first = commit_outline(&source, &tree("가\t1\n나\t2\n")).unwrap();
        let second = commit_outline(&source, &tree("다\t1\n    라\t3\n")).unwrap();
        assert!(!first.backup_overwritten);
        assert!(second.backup_overwritten);

        let lines = read_outline(&source).unwrap();
        assert_eq!(
            crate::model::render_lines(&lines),
            vec!["다\t1", "    라\t3"]
        );
        assert_eq!(read_outline(&backup_path(&source).unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn out_of_range_page_leaves_source_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("short.pdf");
        write_test_pdf(&source, 2);
        let original_hash = sha256_file(&source).unwrap();

        let err = commit_outline(&source, &tree("가\t1\n나\t5\n")).unwrap_err();
        assert!(matches!(
            err,
            OutlineError::PageOutOfRange { page: 5, page_count: 2, .. }
        ));
        assert_eq!(sha256_file(&source).unwrap(), original_hash);
        assert!(!dir.path().join("_BAK_short.pdf").exists());
        assert!(!dir.path().join("_short.pdf").exists());
    }

    #[test]
    fn unwritable_temporary_reports_io_error_and_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        write_test_pdf(&source, 2);
        let original_hash = sha256_file(&source).unwrap();
        fs::create_dir(dir.path().join("_book.pdf")).unwrap();

        let err = commit_outline(&source, &tree("가\t1\n")).unwrap_err();
        assert!(matches!(err, OutlineError::Io { action: "write", .. }));
        assert_eq!(sha256_file(&source).unwrap(), original_hash);
        assert!(!dir.path().join("_BAK_book.pdf").exists());
    }

    #[test]
    fn missing_source_reports_pdf_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = commit_outline(&dir.path().join("absent.pdf"), &tree("가\t1")).unwrap_err();
        assert!(matches!(err, OutlineError::Pdf(_)));
    }

    #[test]
    fn empty_outline_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("book.pdf");
        write_test_pdf(&source, 1);
        let err = commit_outline(&source, &OutlineTree::default()).unwrap_err();
        assert!(matches!(err, OutlineError::EmptyOutline));
        assert!(!dir.path().join("_BAK_book.pdf").exists());
    }

    #[test]
    fn document_without_outline_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("plain.pdf");
        write_test_pdf(&source, 1);
        assert!(read_outline(&source).unwrap().is_empty());
    }
}
