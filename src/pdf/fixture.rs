//! Generated text PDFs for tests.

use crate::pdf::Rect;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::{Path, PathBuf};

pub const FIRST_BASELINE: i64 = 720;
pub const LINE_GAP: i64 = 24;
pub const FONT_SIZE: i64 = 12;

pub fn media_box() -> Rect {
    Rect {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    }
}

/// Baseline of the `line`th entry on a page.
pub fn baseline(line: usize) -> f64 {
    (FIRST_BASELINE - LINE_GAP * line as i64) as f64
}

fn page_content(lines: &[&str]) -> Vec<u8> {
    let mut operations = Vec::new();
    if !lines.is_empty() {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Tf",
            vec!["F1".into(), Object::Integer(FONT_SIZE)],
        ));
        for (i, line) in lines.iter().enumerate() {
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(72),
                    Object::Integer(FIRST_BASELINE - LINE_GAP * i as i64),
                ],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }.encode().expect("encode fixture content")
}

/// Build a document with one page per entry of `pages`. An empty entry gives
/// a page with no content at all.
pub fn build(pages: &[&[&str]]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, page_content(lines)));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    // MediaBox lives on the tree node so pages inherit it.
    let page_tree = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(kids.len() as i64),
        "Kids" => kids,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(page_tree));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

pub fn write(dir: &Path, name: &str, pages: &[&[&str]]) -> PathBuf {
    let path = dir.join(name);
    build(pages).save(&path).expect("write fixture");
    path
}
