use super::*;
use lopdf::content::{Content, Operation};
use lopdf::{Document as PdfDocument, Object, Stream, dictionary};

/// Build a one-page PDF containing the given text.
fn sample_pdf(text: &str) -> Vec<u8> {
    let mut doc = PdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 48.into()]),
            Operation::new("Td", vec![100.into(), 600.into()]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ],
    };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().expect("Failed to encode content"),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to save PDF");
    bytes
}

#[test]
fn extracts_page_text() {
    let bytes = sample_pdf("Hello world");
    let extracted = extract_text(&bytes).expect("Extraction should succeed");

    assert_eq!(extracted.page_count(), 1);
    assert!(extracted.text().contains("Hello world"));
    assert!(!extracted.is_empty());
}

#[test]
fn corrupt_header_fails_extraction() {
    let result = extract_text(b"this is definitely not a pdf");

    assert!(matches!(result, Err(DocqaError::Extraction(_))));
}

#[test]
fn empty_input_fails_extraction() {
    let result = extract_text(b"");

    assert!(matches!(result, Err(DocqaError::Extraction(_))));
}

#[test]
fn text_concatenates_pages_in_order() {
    let doc = ExtractedDocument {
        pages: vec![
            "first page ".to_string(),
            String::new(),
            "third page".to_string(),
        ],
    };

    assert_eq!(doc.text(), "first page third page");
    assert_eq!(doc.page_count(), 3);
    assert!(!doc.is_empty());
}

#[test]
fn document_with_only_blank_pages_is_empty() {
    let doc = ExtractedDocument {
        pages: vec![String::new(), "  \n".to_string()],
    };

    assert!(doc.is_empty());
}
