//! Shared fixtures for the signing flow tests

use docsign_core::{DocumentSession, Point, SignatureImage, SigningConfig};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use shared_types::RasterImage;

/// Route tracing output through the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A text PDF with one page per MediaBox, each saying "Page N"
pub fn text_pdf(media_boxes: &[[i64; 4]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for (i, [a, b, c, d]) in media_boxes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("Page {}", i + 1))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("Should encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![(*a).into(), (*b).into(), (*c).into(), (*d).into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as i64,
        "Kids" => kids,
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Should save test PDF");
    bytes
}

/// `count` US Letter pages
pub fn letter_pdf(count: usize) -> Vec<u8> {
    text_pdf(&vec![[0, 0, 612, 792]; count])
}

/// A PDF whose trailer declares an encryption dictionary
pub fn encrypted_pdf() -> Vec<u8> {
    let mut doc = Document::load_mem(&letter_pdf(1)).expect("Should reload test PDF");
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 2,
        "R" => 3,
        "Length" => 128,
        "P" => -44,
        "O" => Object::string_literal(vec![0u8; 32]),
        "U" => Object::string_literal(vec![0u8; 32]),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Should save encrypted PDF");
    bytes
}

/// A solid black signature image
pub fn black_signature(width: u32, height: u32) -> SignatureImage {
    let image = RasterImage::from_rgba(width, height, [0, 0, 0, 255].repeat((width * height) as usize))
        .expect("Should build signature raster");
    SignatureImage::from_png(image.encode_png().expect("Should encode signature"))
        .expect("Should accept signature PNG")
}

/// Draw a short stroke on the session's pad and confirm it
pub fn draw_and_confirm(session: &mut DocumentSession) -> SignatureImage {
    let pad = session.capture_mut();
    pad.begin_stroke(Point::new(40.0, 100.0));
    pad.extend_stroke(Point::new(180.0, 60.0));
    pad.extend_stroke(Point::new(320.0, 120.0));
    pad.end_stroke();
    pad.confirm().expect("Should confirm drawn signature")
}

pub fn open_pdf(name: &str, bytes: Vec<u8>) -> DocumentSession {
    DocumentSession::open(name, "application/pdf", bytes, SigningConfig::default())
        .expect("Should open PDF session")
}
