//! Minimal flowing layout on top of `printpdf`: a cursor that moves down
//! an A4 page, wraps text, draws simple ruled tables, and opens a new page
//! when the next block would cross the bottom margin.

use std::io::BufWriter;

use printpdf::*;

use super::ReportError;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 20.0;
const MARGIN_TOP: f32 = 20.0;
const MARGIN_BOTTOM: f32 = 18.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_LEFT;

/// Approximate Helvetica advance per character, in mm per point of size.
const CHAR_WIDTH_PER_PT: f32 = 0.18;
const LINE_FACTOR: f32 = 0.45;
const CELL_PADDING: f32 = 1.5;

/// Text size classes used by the reports.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Style {
    Title,
    Subtitle,
    Section,
    Body,
    Bold,
    Small,
}

impl Style {
    fn size(self) -> f32 {
        match self {
            Style::Title => 20.0,
            Style::Subtitle => 12.0,
            Style::Section => 14.0,
            Style::Body | Style::Bold => 9.5,
            Style::Small => 8.0,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, Style::Title | Style::Section | Style::Bold)
    }
}

pub struct ReportWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl ReportWriter {
    pub fn new(title: &str) -> Result<Self, ReportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN_TOP,
            pages: 1,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages
    }

    fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Layer {}", self.pages + 1));
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.pages += 1;
    }

    /// Break to a new page unless `height` mm still fit above the margin.
    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    pub fn space(&mut self, mm: f32) {
        self.y -= mm;
        if self.y < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn draw(&self, text: &str, style: Style, x: f32) {
        let font = if style.is_bold() { &self.bold } else { &self.regular };
        self.layer
            .use_text(pdf_safe(text), style.size(), Mm(x), Mm(self.y), font);
    }

    /// Wrapped paragraph across the full content width.
    pub fn paragraph(&mut self, text: &str, style: Style) {
        self.paragraph_at(text, style, MARGIN_LEFT, CONTENT_WIDTH);
    }

    /// Wrapped paragraph indented by `indent` mm.
    pub fn paragraph_at(&mut self, text: &str, style: Style, x: f32, width: f32) {
        let line_height = style.size() * LINE_FACTOR;
        for line in wrap_text(text, chars_for(width, style.size())) {
            self.ensure_space(line_height);
            self.y -= line_height;
            self.draw(&line, style, x);
        }
    }

    /// `Label: value` with the label in bold.
    pub fn labeled(&mut self, label: &str, value: &str) {
        self.paragraph(label, Style::Bold);
        self.paragraph_at(value, Style::Body, MARGIN_LEFT + 4.0, CONTENT_WIDTH - 4.0);
        self.space(1.5);
    }

    pub fn section(&mut self, title: &str) {
        // Keep a heading together with at least a couple of body lines.
        self.ensure_space(Style::Section.size() * LINE_FACTOR + 15.0);
        self.space(2.0);
        self.paragraph(title, Style::Section);
        self.rule();
        self.space(2.0);
    }

    fn rule(&mut self) {
        self.y -= 1.5;
        self.hline(MARGIN_LEFT, MARGIN_LEFT + CONTENT_WIDTH);
    }

    fn hline(&self, from: f32, to: f32) {
        let line = Line {
            points: vec![
                (Point::new(Mm(from), Mm(self.y)), false),
                (Point::new(Mm(to), Mm(self.y)), false),
            ],
            is_closed: false,
        };
        self.layer.set_outline_color(Color::Rgb(Rgb::new(0.87, 0.89, 0.90, None)));
        self.layer.set_outline_thickness(0.6);
        self.layer.add_line(line);
    }

    /// Ruled table; `widths` are column widths in mm. The header row is bold
    /// and repeated on each page the table spans.
    pub fn table(&mut self, widths: &[f32], header: &[&str], rows: &[Vec<String>]) {
        let size = Style::Body.size();
        let line_height = size * LINE_FACTOR;
        let right = MARGIN_LEFT + widths.iter().sum::<f32>();

        let header_cells: Vec<String> = header.iter().map(|h| h.to_string()).collect();
        let header_height = self.row_height(widths, &header_cells, size);
        self.ensure_space(header_height + line_height * 2.0);
        self.table_row(widths, &header_cells, Style::Bold, right);

        for row in rows {
            let height = self.row_height(widths, row, size);
            if self.y - height < MARGIN_BOTTOM {
                self.new_page();
                self.table_row(widths, &header_cells, Style::Bold, right);
            }
            self.table_row(widths, row, Style::Body, right);
        }
        self.space(4.0);
    }

    fn row_height(&self, widths: &[f32], cells: &[String], size: f32) -> f32 {
        let lines = cells
            .iter()
            .zip(widths)
            .map(|(cell, &w)| wrap_text(cell, chars_for(w - 2.0 * CELL_PADDING, size)).len())
            .max()
            .unwrap_or(1);
        lines as f32 * size * LINE_FACTOR + 2.0 * CELL_PADDING
    }

    fn table_row(&mut self, widths: &[f32], cells: &[String], style: Style, right: f32) {
        let size = style.size();
        let line_height = size * LINE_FACTOR;
        let height = self.row_height(widths, cells, size);
        let top = self.y;

        if style == Style::Bold {
            self.hline(MARGIN_LEFT, right);
        }

        let mut x = MARGIN_LEFT;
        for (cell, &width) in cells.iter().zip(widths) {
            self.y = top - CELL_PADDING;
            for line in wrap_text(cell, chars_for(width - 2.0 * CELL_PADDING, size)) {
                self.y -= line_height;
                self.draw(&line, style, x + CELL_PADDING);
            }
            x += width;
        }

        self.y = top - height;
        self.hline(MARGIN_LEFT, right);
    }

    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
    }
}

fn chars_for(width_mm: f32, size: f32) -> usize {
    ((width_mm / (size * CHAR_WIDTH_PER_PT)) as usize).max(8)
}

/// Greedy word wrap. Words longer than a line are split. Leading
/// whitespace is kept as a hanging indent on every line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let body = text.trim_start();
    let indent = text.len() - body.len();
    if indent == 0 || body.is_empty() {
        return wrap_words(body, max_chars);
    }
    let pad = " ".repeat(indent);
    wrap_words(body, max_chars.saturating_sub(indent).max(1))
        .into_iter()
        .map(|line| format!("{pad}{line}"))
        .collect()
}

fn wrap_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let split = word
                .char_indices()
                .nth(max_chars)
                .map(|(i, _)| i)
                .unwrap_or(word.len());
            lines.push(word[..split].to_string());
            word = &word[split..];
        }
        if word.is_empty() {
            continue;
        }
        if current.chars().count() + word.chars().count() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Builtin PDF fonts only cover Latin-1 reliably; map the few symbols the
/// agronomy tables use and drop anything else outside ASCII.
pub fn pdf_safe(text: &str) -> String {
    let body = text.trim_start();
    let indent = " ".repeat(text[..text.len() - body.len()].chars().count());
    let mut out = String::with_capacity(text.len());
    for c in body.chars() {
        match c {
            '°' => out.push_str(" deg "),
            '–' | '—' => out.push('-'),
            '•' | '·' => out.push('-'),
            '‘' | '’' => out.push('\''),
            '“' | '”' => out.push('"'),
            c if c.is_ascii() => out.push(c),
            _ => {}
        }
    }
    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        collapsed
    } else {
        indent + &collapsed
    }
}
