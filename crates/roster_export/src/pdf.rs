//! Paginated PDF table writer.
//!
//! Builds PDF 1.4 files by hand with the built-in Helvetica fonts, so no font
//! files are needed. Each landscape page carries a header band (branding,
//! title, generation metadata), the table header row, as many data rows as
//! fit, and a page-numbered footer. Cells wrap long values.
//!
//! The whole document is laid out before any bytes are produced; a table
//! that cannot be laid out is an error and yields nothing.

use anyhow::Result;
use roster_core::RosterError;
use tracing::debug;

use crate::assembler::ExportTable;
use crate::font_metrics::{Font, char_width, text_width, win_ansi_byte};
use crate::writer::{DocumentMeta, DocumentWriter, ExportFormat};

const BAND_HEIGHT: f64 = 62.0;
const FOOTER_HEIGHT: f64 = 18.0;
const LINE_SPACING: f64 = 1.25;
/// Space between the footer branding and the page label.
const FOOTER_GAP: f64 = 12.0;
const ELLIPSIS: &str = "...";

type Rgb = (f64, f64, f64);

const HEADER_FILL: Rgb = (0.17, 0.31, 0.52);
const STRIPE_FILL: Rgb = (0.95, 0.95, 0.95);
const GRID_STROKE: Rgb = (0.75, 0.75, 0.75);
const MUTED_TEXT: Rgb = (0.4, 0.4, 0.4);
const BLACK: Rgb = (0.0, 0.0, 0.0);
const WHITE: Rgb = (1.0, 1.0, 1.0);

/// Page geometry and typography, in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfLayout {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub font_size: f64,
    pub first_column_width: f64,
    pub min_column_width: f64,
    /// Widest a column may ask for before its values wrap.
    pub max_natural_width: f64,
    pub cell_padding: f64,
}

impl Default for PdfLayout {
    /// US Letter, landscape.
    fn default() -> Self {
        Self {
            page_width: 792.0,
            page_height: 612.0,
            margin: 36.0,
            font_size: 8.0,
            first_column_width: 90.0,
            min_column_width: 28.0,
            max_natural_width: 220.0,
            cell_padding: 3.0,
        }
    }
}

impl PdfLayout {
    fn content_width(&self) -> f64 {
        self.page_width - 2.0 * self.margin
    }

    fn line_height(&self) -> f64 {
        self.font_size * LINE_SPACING
    }

    fn body_top(&self) -> f64 {
        self.page_height - self.margin - BAND_HEIGHT
    }

    fn body_bottom(&self) -> f64 {
        self.margin + FOOTER_HEIGHT
    }
}

fn render_error(message: String) -> anyhow::Error {
    RosterError::Render(message).into()
}

/// A table row broken into per-cell lines.
#[derive(Debug)]
struct LaidOutRow {
    cells: Vec<Vec<String>>,
    height: f64,
}

#[derive(Debug, Clone)]
pub struct PdfWriter {
    layout: PdfLayout,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new(PdfLayout::default())
    }
}

impl PdfWriter {
    pub fn new(layout: PdfLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &PdfLayout {
        &self.layout
    }

    pub fn write_table(&self, table: &ExportTable, meta: &DocumentMeta) -> Result<Vec<u8>> {
        let widths = self.column_widths(table)?;
        let header = self.lay_out_row(&table.headers, &widths, Font::Bold);
        let rows: Vec<LaidOutRow> = table
            .rows
            .iter()
            .map(|row| self.lay_out_row(row, &widths, Font::Regular))
            .collect();
        let pages = self.paginate(&header, &rows)?;

        let total = pages.len();
        let streams: Vec<String> = pages
            .iter()
            .enumerate()
            .map(|(idx, page_rows)| {
                self.draw_page(idx + 1, total, meta, &widths, &header, &rows, page_rows)
            })
            .collect();

        debug!(
            pages = total,
            columns = widths.len(),
            rows = rows.len(),
            "Laid out PDF table"
        );

        let builder = PdfBuilder {
            pages: streams,
            page_width: self.layout.page_width,
            page_height: self.layout.page_height,
        };
        Ok(builder.build(meta))
    }

    /// First column fixed, the rest sized by content and stretched or
    /// squeezed to fill the remaining width.
    fn column_widths(&self, table: &ExportTable) -> Result<Vec<f64>> {
        let l = &self.layout;
        let n = table.column_count();
        if n == 0 {
            return Err(render_error("table has no columns".into()));
        }
        let content = l.content_width();
        if n == 1 {
            return Ok(vec![content]);
        }

        let first = l.first_column_width.max(l.min_column_width);
        let others = n - 1;
        let rest = content - first;
        let min_total = others as f64 * l.min_column_width;
        if rest < min_total {
            return Err(render_error(format!(
                "{n} columns need at least {:.0}pt but the page is {:.0}pt wide",
                first + min_total,
                content
            )));
        }

        let cap = l.max_natural_width.max(l.min_column_width);
        let naturals: Vec<f64> = (1..n)
            .map(|col| self.natural_width(table, col).clamp(l.min_column_width, cap))
            .collect();
        let slack: f64 = naturals.iter().map(|w| w - l.min_column_width).sum();
        let spare = rest - min_total;

        let mut widths = Vec::with_capacity(n);
        widths.push(first);
        if slack <= f64::EPSILON {
            widths.extend(std::iter::repeat_n(rest / others as f64, others));
        } else {
            widths.extend(
                naturals
                    .iter()
                    .map(|w| l.min_column_width + (w - l.min_column_width) * spare / slack),
            );
        }
        Ok(widths)
    }

    fn natural_width(&self, table: &ExportTable, col: usize) -> f64 {
        let size = self.layout.font_size;
        let widest_line = |text: &str, font: Font| {
            text.lines()
                .map(|line| text_width(line, font, size))
                .fold(0.0_f64, f64::max)
        };
        let header = table
            .headers
            .get(col)
            .map(|h| widest_line(h, Font::Bold))
            .unwrap_or(0.0);
        let cells = table
            .rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|cell| widest_line(cell, Font::Regular))
            .fold(0.0_f64, f64::max);
        header.max(cells) + 2.0 * self.layout.cell_padding
    }

    fn lay_out_row(&self, cells: &[String], widths: &[f64], font: Font) -> LaidOutRow {
        let l = &self.layout;
        let cells: Vec<Vec<String>> = widths
            .iter()
            .enumerate()
            .map(|(col, width)| {
                let text = cells.get(col).map(String::as_str).unwrap_or("");
                wrap_text(text, font, l.font_size, width - 2.0 * l.cell_padding)
            })
            .collect();
        let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
        LaidOutRow {
            cells,
            height: lines as f64 * l.line_height() + 2.0 * l.cell_padding,
        }
    }

    /// Groups row indices into pages. Every page repeats the header row.
    fn paginate(&self, header: &LaidOutRow, rows: &[LaidOutRow]) -> Result<Vec<Vec<usize>>> {
        let available = self.layout.body_top() - self.layout.body_bottom() - header.height;
        if available <= 0.0 {
            return Err(render_error(
                "page is too small for the table header".into(),
            ));
        }

        let mut pages = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut used = 0.0;
        for (idx, row) in rows.iter().enumerate() {
            if row.height > available {
                return Err(render_error(format!(
                    "row {} is too tall to fit on a page ({:.0}pt, {:.0}pt available)",
                    idx + 1,
                    row.height,
                    available
                )));
            }
            if used + row.height > available && !current.is_empty() {
                pages.push(std::mem::take(&mut current));
                used = 0.0;
            }
            current.push(idx);
            used += row.height;
        }
        pages.push(current);
        Ok(pages)
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_page(
        &self,
        page_number: usize,
        page_count: usize,
        meta: &DocumentMeta,
        widths: &[f64],
        header: &LaidOutRow,
        rows: &[LaidOutRow],
        page_rows: &[usize],
    ) -> String {
        let l = &self.layout;
        let mut content = String::new();

        // Header band
        let band_top = l.page_height - l.margin;
        let band_width = l.content_width();
        let branding = fit_text(&meta.branding, Font::Bold, 9.0, band_width);
        set_fill(&mut content, MUTED_TEXT);
        text_op(&mut content, Font::Bold, 9.0, l.margin, band_top - 9.0, &branding);
        let title = fit_text(&meta.title, Font::Bold, 16.0, band_width);
        set_fill(&mut content, BLACK);
        text_op(&mut content, Font::Bold, 16.0, l.margin, band_top - 29.0, &title);
        let generated = meta.generated_at.format("%B %-d, %Y %-I:%M %p");
        let summary = format!("Generated: {generated}  |  Records: {}", meta.record_count);
        let summary = fit_text(&summary, Font::Regular, 9.0, band_width);
        set_fill(&mut content, MUTED_TEXT);
        text_op(&mut content, Font::Regular, 9.0, l.margin, band_top - 45.0, &summary);
        set_stroke(&mut content, GRID_STROKE);
        content.push_str("0.75 w\n");
        let rule_y = band_top - BAND_HEIGHT + 8.0;
        content.push_str(&format!(
            "{:.2} {rule_y:.2} m {:.2} {rule_y:.2} l S\n",
            l.margin,
            l.page_width - l.margin
        ));

        // Table
        let mut y = l.body_top();
        self.draw_row(&mut content, header, widths, y, Font::Bold, Some(HEADER_FILL), WHITE);
        y -= header.height;
        for &idx in page_rows {
            let row = &rows[idx];
            let fill = (idx % 2 == 1).then_some(STRIPE_FILL);
            self.draw_row(&mut content, row, widths, y, Font::Regular, fill, BLACK);
            y -= row.height;
        }

        // Footer
        let footer_y = l.margin + 4.0;
        let page_label = format!("Page {page_number} of {page_count}");
        let label_width = text_width(&page_label, Font::Regular, 8.0);
        let label_x = l.page_width - l.margin - label_width;
        let branding = fit_text(
            &meta.branding,
            Font::Regular,
            8.0,
            l.content_width() - label_width - FOOTER_GAP,
        );
        set_fill(&mut content, MUTED_TEXT);
        text_op(&mut content, Font::Regular, 8.0, l.margin, footer_y, &branding);
        text_op(&mut content, Font::Regular, 8.0, label_x, footer_y, &page_label);

        content
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_row(
        &self,
        content: &mut String,
        row: &LaidOutRow,
        widths: &[f64],
        top: f64,
        font: Font,
        fill: Option<Rgb>,
        text_color: Rgb,
    ) {
        let l = &self.layout;
        let bottom = top - row.height;
        let total_width: f64 = widths.iter().sum();

        if let Some(color) = fill {
            set_fill(content, color);
            content.push_str(&format!(
                "{:.2} {bottom:.2} {total_width:.2} {:.2} re f\n",
                l.margin, row.height
            ));
        }

        set_stroke(content, GRID_STROKE);
        content.push_str("0.4 w\n");
        let mut x = l.margin;
        for width in widths {
            content.push_str(&format!(
                "{x:.2} {bottom:.2} {width:.2} {:.2} re S\n",
                row.height
            ));
            x += width;
        }

        set_fill(content, text_color);
        let mut x = l.margin;
        for (lines, width) in row.cells.iter().zip(widths) {
            for (i, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = top - l.cell_padding - (i as f64 + 1.0) * l.line_height()
                    + 0.25 * l.font_size;
                text_op(content, font, l.font_size, x + l.cell_padding, baseline, line);
            }
            x += width;
        }
    }
}

impl DocumentWriter for PdfWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn render(&self, table: &ExportTable, meta: &DocumentMeta) -> Result<Vec<u8>> {
        self.write_table(table, meta)
    }
}

/// Greedy word wrap to `max_width`. Explicit newlines are kept; words wider
/// than a line are broken between characters. Always returns at least one
/// line.
pub(crate) fn wrap_text(text: &str, font: Font, size: f64, max_width: f64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width(&candidate, font, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font, size) <= max_width {
                current = word.to_string();
                continue;
            }
            // `current` is empty here; track its width instead of re-measuring.
            let mut line_width = 0.0;
            for ch in word.chars() {
                let w = char_width(ch, font, size);
                if !current.is_empty() && line_width + w > max_width {
                    lines.push(std::mem::take(&mut current));
                    line_width = 0.0;
                }
                current.push(ch);
                line_width += w;
            }
        }
        lines.push(current);
    }
    lines
}

/// Cuts `text` at a character boundary and appends an ellipsis so it fits
/// `max_width`. Text that already fits is returned unchanged.
fn fit_text(text: &str, font: Font, size: f64, max_width: f64) -> String {
    if text_width(text, font, size) <= max_width {
        return text.to_string();
    }
    let budget = max_width - text_width(ELLIPSIS, font, size);
    let mut width = 0.0;
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        width += char_width(ch, font, size);
        if width > budget {
            break;
        }
        end = idx + ch.len_utf8();
    }
    format!("{}{ELLIPSIS}", text[..end].trim_end())
}

fn set_fill(content: &mut String, (r, g, b): Rgb) {
    content.push_str(&format!("{r:.2} {g:.2} {b:.2} rg\n"));
}

fn set_stroke(content: &mut String, (r, g, b): Rgb) {
    content.push_str(&format!("{r:.2} {g:.2} {b:.2} RG\n"));
}

fn text_op(content: &mut String, font: Font, size: f64, x: f64, y: f64, text: &str) {
    content.push_str(&format!(
        "BT /{} {size:.1} Tf {x:.2} {y:.2} Td ({}) Tj ET\n",
        font.resource(),
        pdf_escape(text)
    ));
}

/// Escape text for a PDF string literal in WinAnsi. Bytes outside printable
/// ASCII are written as octal escapes so the file body stays ASCII.
fn pdf_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            _ => {
                let byte = win_ansi_byte(c);
                if (0x20..0x7F).contains(&byte) {
                    out.push(byte as char);
                } else {
                    out.push_str(&format!("\\{byte:03o}"));
                }
            }
        }
    }
    out
}

/// Serializes finished page content streams into a PDF 1.4 file.
struct PdfBuilder {
    pages: Vec<String>,
    page_width: f64,
    page_height: f64,
}

impl PdfBuilder {
    // Fixed objects: 1 catalog, 2 page tree, 3-4 fonts, 5 info. Page N
    // (0-based) is object 6 + 2N, its content stream 7 + 2N.
    const FIRST_PAGE_OBJ: usize = 6;

    fn page_obj(index: usize) -> usize {
        Self::FIRST_PAGE_OBJ + 2 * index
    }

    fn build(&self, meta: &DocumentMeta) -> Vec<u8> {
        let mut pdf = String::new();
        let mut offsets: Vec<usize> = Vec::new();

        pdf.push_str("%PDF-1.4\n");

        offsets.push(pdf.len());
        pdf.push_str("1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");

        let kids: Vec<String> = (0..self.pages.len())
            .map(|i| format!("{} 0 R", Self::page_obj(i)))
            .collect();
        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n",
            kids.join(" "),
            self.pages.len()
        ));

        for (num, font) in [(3, Font::Bold), (4, Font::Regular)] {
            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{num} 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>\nendobj\n",
                font.base_font()
            ));
        }

        offsets.push(pdf.len());
        pdf.push_str(&format!(
            "5 0 obj\n<< /Title ({}) /Creator ({}) /Producer (roster_export) /CreationDate (D:{}) >>\nendobj\n",
            pdf_escape(&meta.title),
            pdf_escape(&meta.branding),
            meta.generated_at.format("%Y%m%d%H%M%S")
        ));

        for (i, stream) in self.pages.iter().enumerate() {
            let page = Self::page_obj(i);
            let contents = page + 1;

            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{page} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.0} {:.0}] \
                 /Contents {contents} 0 R /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> >>\nendobj\n",
                self.page_width, self.page_height
            ));

            offsets.push(pdf.len());
            pdf.push_str(&format!(
                "{contents} 0 obj\n<< /Length {} >>\nstream\n{stream}endstream\nendobj\n",
                stream.len()
            ));
        }

        let xref_offset = pdf.len();
        let num_objects = offsets.len() + 1;
        pdf.push_str(&format!("xref\n0 {num_objects}\n"));
        pdf.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            pdf.push_str(&format!("{offset:010} 00000 n \n"));
        }

        pdf.push_str(&format!(
            "trailer\n<< /Size {num_objects} /Root 1 0 R /Info 5 0 R >>\n"
        ));
        pdf.push_str(&format!("startxref\n{xref_offset}\n%%EOF\n"));

        pdf.into_bytes()
    }
}
