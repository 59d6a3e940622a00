//! Minimal PDF page canvas over `lopdf`.
//!
//! DESIGN
//! ======
//! Pages are kept as operation lists until [`Canvas::finish`], so content
//! that depends on the final page count (footers) can be drawn afterwards
//! by re-selecting earlier pages. Coordinates are top-down points on an A4
//! page; the flip to PDF's bottom-up space happens here and nowhere else.
//!
//! Only the standard Type1 Helvetica pair is used, with `WinAnsiEncoding`.
//! Text is transliterated to that code page before encoding.

pub mod barcode;
pub mod layout;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use super::ExportError;

pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// Average Helvetica glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.52;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => FONT_REGULAR,
            Self::Bold => FONT_BOLD,
        }
    }
}

/// Approximate rendered width of `text` in points.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH
}

/// Bytes of `text` in the PDF's single-byte encoding.
#[must_use]
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            'ş' => b's',
            'Ş' => b'S',
            'ğ' => b'g',
            'Ğ' => b'G',
            'ı' => b'i',
            'İ' => b'I',
            '\u{2013}' | '\u{2014}' => b'-',
            '\u{2018}' | '\u{2019}' => b'\'',
            '\u{201C}' | '\u{201D}' => b'"',
            '\t' | '\n' | '\r' => b' ',
            c if (' '..='~').contains(&c) || ('\u{A0}'..='\u{FF}').contains(&c) => u8::try_from(u32::from(c)).unwrap_or(b'?'),
            _ => b'?',
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct Canvas {
    pages: Vec<Vec<Operation>>,
    current: usize,
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a blank page and make it current.
    pub fn add_page(&mut self) {
        self.pages.push(Vec::new());
        self.current = self.pages.len() - 1;
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Make an existing page current. Out-of-range indices are ignored.
    pub fn select_page(&mut self, index: usize) {
        if index < self.pages.len() {
            self.current = index;
        }
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        if self.pages.is_empty() {
            self.add_page();
        }
        &mut self.pages[self.current]
    }

    /// Draw a single line of text with its baseline at `y`.
    pub fn text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec![font.resource().into(), size.into()]));
        ops.push(Operation::new("Td", vec![x.into(), (PAGE_HEIGHT - y).into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(encode_text(text))]));
        ops.push(Operation::new("ET", vec![]));
    }

    /// Filled rectangle with its top-left corner at (`x`, `y`). `gray` is 0 (black) to 1 (white).
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, gray: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("g", vec![gray.into()]));
        ops.push(Operation::new("re", vec![x.into(), (PAGE_HEIGHT - y - height).into(), width.into(), height.into()]));
        ops.push(Operation::new("f", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32) {
        let ops = self.ops();
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new("w", vec![width.into()]));
        ops.push(Operation::new("m", vec![x1.into(), (PAGE_HEIGHT - y1).into()]));
        ops.push(Operation::new("l", vec![x2.into(), (PAGE_HEIGHT - y2).into()]));
        ops.push(Operation::new("S", vec![]));
        ops.push(Operation::new("Q", vec![]));
    }

    /// Encode every page into a PDF file.
    ///
    /// # Errors
    ///
    /// Returns `Pdf` if content encoding or serialization fails.
    pub fn finish(mut self, title: &str) -> Result<Vec<u8>, ExportError> {
        if self.pages.is_empty() {
            self.add_page();
        }
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let regular = doc.add_object(helvetica("Helvetica"));
        let bold = doc.add_object(helvetica("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => regular,
                FONT_BOLD => bold,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let encoded = Content { operations }.encode().map_err(|e| ExportError::Pdf(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id: ObjectId = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = i64::try_from(kids.len()).map_err(|e| ExportError::Pdf(e.to_string()))?;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(encode_text(title)),
            "Producer" => Object::string_literal("backoffice"),
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).map_err(|e| ExportError::Pdf(e.to_string()))?;
        Ok(bytes)
    }
}

fn helvetica(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
