//! Flowing document layout on top of [`Canvas`].
//!
//! A [`Layout`] keeps a vertical cursor and starts a new page, with the
//! header band redrawn, whenever the next block would run into the footer
//! area. Tables repeat their header row after a page break. Footers are
//! drawn on every page at [`Layout::finish`] once the page count is known.

use time::OffsetDateTime;
use time::macros::format_description;

use super::{Canvas, Font, PAGE_HEIGHT, PAGE_WIDTH, barcode, text_width};
use crate::export::ExportError;

pub const MARGIN: f32 = 40.0;
const HEADER_HEIGHT: f32 = 56.0;
const FOOTER_HEIGHT: f32 = 30.0;
const BODY_SIZE: f32 = 9.5;
const LINE_HEIGHT: f32 = 14.0;
const ROW_HEIGHT: f32 = 16.0;
const CELL_PADDING: f32 = 4.0;

#[derive(Debug, Clone)]
pub struct Header {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub title: String,
    /// Share of the content width; shares are normalized across columns.
    pub weight: f32,
    pub align: Align,
}

impl Column {
    #[must_use]
    pub fn left(title: &str, weight: f32) -> Self {
        Self { title: title.to_owned(), weight, align: Align::Left }
    }

    #[must_use]
    pub fn right(title: &str, weight: f32) -> Self {
        Self { title: title.to_owned(), weight, align: Align::Right }
    }
}

fn content_width() -> f32 {
    PAGE_WIDTH - 2.0 * MARGIN
}

fn body_bottom() -> f32 {
    PAGE_HEIGHT - MARGIN - FOOTER_HEIGHT
}

/// `text` cut with an ellipsis so it fits `width` at `size`.
#[must_use]
pub fn fit(text: &str, width: f32, size: f32) -> String {
    if text_width(text, size) <= width {
        return text.to_owned();
    }
    let mut out = String::new();
    for c in text.chars() {
        out.push(c);
        if text_width(&out, size) + text_width("...", size) > width {
            out.pop();
            break;
        }
    }
    out.push_str("...");
    out
}

/// Greedy word wrap against the approximate glyph width.
#[must_use]
pub fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() { word.to_owned() } else { format!("{line} {word}") };
            if text_width(&candidate, size) <= width || line.is_empty() {
                line = candidate;
            } else {
                lines.push(std::mem::replace(&mut line, word.to_owned()));
            }
        }
        lines.push(line);
    }
    lines
}

/// `YYYY-MM-DD HH:MM UTC` stamp for footers.
#[must_use]
pub fn timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
    at.to_offset(time::UtcOffset::UTC).format(&format).unwrap_or_else(|_| at.to_string())
}

pub struct Layout {
    canvas: Canvas,
    header: Header,
    generated_at: OffsetDateTime,
    cursor: f32,
}

impl Layout {
    /// Start the first page with its header band.
    #[must_use]
    pub fn new(header: Header, generated_at: OffsetDateTime) -> Self {
        let mut layout = Self { canvas: Canvas::new(), header, generated_at, cursor: 0.0 };
        layout.start_page();
        layout
    }

    fn start_page(&mut self) {
        self.canvas.add_page();
        self.canvas.fill_rect(0.0, 0.0, PAGE_WIDTH, HEADER_HEIGHT, 0.92);
        self.canvas.text(MARGIN, 26.0, 15.0, Font::Bold, &self.header.title);
        self.canvas.text(MARGIN, 43.0, 9.0, Font::Regular, &self.header.subtitle);
        self.cursor = HEADER_HEIGHT + 24.0;
    }

    /// Break the page unless `height` more points fit. Returns whether it broke.
    fn reserve(&mut self, height: f32) -> bool {
        if self.cursor + height > body_bottom() {
            self.start_page();
            return true;
        }
        false
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.canvas.page_count()
    }

    pub fn spacer(&mut self, height: f32) {
        self.cursor += height;
    }

    pub fn heading(&mut self, text: &str) {
        self.reserve(LINE_HEIGHT * 2.0);
        self.cursor += 4.0;
        self.canvas.text(MARGIN, self.cursor + 8.0, 11.5, Font::Bold, text);
        self.canvas.line(MARGIN, self.cursor + 12.0, PAGE_WIDTH - MARGIN, self.cursor + 12.0, 0.6);
        self.cursor += LINE_HEIGHT + 8.0;
    }

    pub fn paragraph(&mut self, text: &str) {
        for line in wrap(text, content_width(), BODY_SIZE) {
            self.reserve(LINE_HEIGHT);
            self.canvas.text(MARGIN, self.cursor + BODY_SIZE, BODY_SIZE, Font::Regular, &line);
            self.cursor += LINE_HEIGHT;
        }
        self.cursor += 4.0;
    }

    /// Label/value pairs laid out row-major across `columns` columns.
    #[allow(clippy::cast_precision_loss)]
    pub fn metadata_grid(&mut self, pairs: &[(&str, String)], columns: usize) {
        let columns = columns.max(1);
        let cell_width = content_width() / columns as f32;
        for row in pairs.chunks(columns) {
            self.reserve(LINE_HEIGHT * 2.0);
            let mut x = MARGIN;
            for (label, value) in row {
                self.canvas.text(x, self.cursor + 8.0, 7.5, Font::Regular, &label.to_uppercase());
                self.canvas.text(x, self.cursor + 20.0, 10.0, Font::Bold, &fit(value, cell_width - 8.0, 10.0));
                x += cell_width;
            }
            self.cursor += LINE_HEIGHT * 2.0 + 4.0;
        }
        self.cursor += 4.0;
    }

    fn table_header(&mut self, columns: &[Column], widths: &[f32]) {
        self.canvas.fill_rect(MARGIN, self.cursor, content_width(), ROW_HEIGHT, 0.85);
        self.row(columns.iter().map(|c| c.title.as_str()), columns, widths, Font::Bold);
    }

    fn row<'a>(&mut self, cells: impl Iterator<Item = &'a str>, columns: &[Column], widths: &[f32], font: Font) {
        let mut x = MARGIN;
        for ((cell, column), width) in cells.zip(columns).zip(widths) {
            let inner = width - 2.0 * CELL_PADDING;
            let text = fit(cell, inner, BODY_SIZE);
            let tx = match column.align {
                Align::Left => x + CELL_PADDING,
                Align::Right => x + width - CELL_PADDING - text_width(&text, BODY_SIZE),
            };
            self.canvas.text(tx, self.cursor + 11.5, BODY_SIZE, font, &text);
            x += width;
        }
        self.cursor += ROW_HEIGHT;
    }

    /// Table with a shaded header row that repeats after each page break.
    #[allow(clippy::cast_precision_loss)]
    pub fn table(&mut self, columns: &[Column], rows: &[Vec<String>]) {
        if columns.is_empty() {
            return;
        }
        let total: f32 = columns.iter().map(|c| c.weight.max(0.0)).sum();
        let widths: Vec<f32> = if total > 0.0 {
            columns.iter().map(|c| content_width() * c.weight.max(0.0) / total).collect()
        } else {
            vec![content_width() / columns.len() as f32; columns.len()]
        };

        self.reserve(ROW_HEIGHT * 2.0);
        self.table_header(columns, &widths);
        for (i, cells) in rows.iter().enumerate() {
            if self.reserve(ROW_HEIGHT) {
                self.table_header(columns, &widths);
            }
            if i % 2 == 1 {
                self.canvas.fill_rect(MARGIN, self.cursor, content_width(), ROW_HEIGHT, 0.97);
            }
            self.row(cells.iter().map(String::as_str), columns, &widths, Font::Regular);
        }
        self.canvas.line(MARGIN, self.cursor, PAGE_WIDTH - MARGIN, self.cursor, 0.4);
        self.cursor += 8.0;
    }

    /// Code 39 symbol `height` points tall with the human-readable text under it.
    ///
    /// # Errors
    ///
    /// Returns `Barcode` or `EmptyBarcode` if `data` cannot be encoded.
    #[allow(clippy::cast_precision_loss)]
    pub fn barcode(&mut self, data: &str, module: f32, height: f32) -> Result<(), ExportError> {
        let (bars, modules) = barcode::encode(data)?;
        self.reserve(height + LINE_HEIGHT * 2.0);
        for (start, width) in bars {
            self.canvas.fill_rect(MARGIN + start as f32 * module, self.cursor, width as f32 * module, height, 0.0);
        }
        let symbol_width = modules as f32 * module;
        let label = data.to_ascii_uppercase();
        let label_x = MARGIN + (symbol_width - text_width(&label, BODY_SIZE)).max(0.0) / 2.0;
        self.canvas.text(label_x, self.cursor + height + 12.0, BODY_SIZE, Font::Regular, &label);
        self.cursor += height + LINE_HEIGHT * 2.0;
        Ok(())
    }

    /// Draw footers on every page and encode the file.
    ///
    /// # Errors
    ///
    /// Returns `Pdf` if encoding fails.
    pub fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let total = self.canvas.page_count();
        let stamp = format!("Generated {}", timestamp(self.generated_at));
        let footer_y = PAGE_HEIGHT - MARGIN;
        for index in 0..total {
            self.canvas.select_page(index);
            self.canvas.line(MARGIN, footer_y - 12.0, PAGE_WIDTH - MARGIN, footer_y - 12.0, 0.4);
            self.canvas.text(MARGIN, footer_y, 7.5, Font::Regular, &stamp);
            let page = format!("Page {} / {total}", index + 1);
            let x = PAGE_WIDTH - MARGIN - text_width(&page, 7.5);
            self.canvas.text(x, footer_y, 7.5, Font::Regular, &page);
        }
        self.canvas.finish(&self.header.title)
    }
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
