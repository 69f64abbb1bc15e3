//! Builders for small in-memory PDFs used by tests across the workspace.
#![allow(clippy::expect_used)]

use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream,
};

/// Builds a PDF with one page per entry; an empty entry produces a page without text.
pub fn pdf_document(pages: &[&str]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(kids.len()).expect("page count fits i64");
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

/// Serialises [`pdf_document`] to bytes, ready to be staged as an upload.
pub fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = pdf_document(pages);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialise pdf");
    buffer
}

/// A document whose trailer declares standard-handler encryption.
pub fn encrypted_pdf_document(pages: &[&str]) -> Document {
    let mut doc = pdf_document(pages);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "P" => -4,
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc
}

/// Serialises [`encrypted_pdf_document`] to bytes.
pub fn encrypted_pdf_bytes(pages: &[&str]) -> Vec<u8> {
    let mut doc = encrypted_pdf_document(pages);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialise pdf");
    buffer
}
