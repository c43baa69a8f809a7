//! Minimal PDF 1.4 writer for text-only documents.
//!
//! Produces A4 pages of left-aligned text using the standard Helvetica fonts,
//! so no font embedding is needed. Lines that do not fit on the current page
//! start a new one.

/// A4 page size in points.
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN: f32 = 50.0;

/// Column where field values start.
const VALUE_X: f32 = 210.0;

/// Rough character budgets per line at body size (Helvetica averages ~0.5em).
const BODY_WRAP: usize = 95;
const VALUE_WRAP: usize = 60;

#[derive(Debug, Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

/// Incrementally lays out text and serializes it as a PDF file.
#[derive(Debug)]
pub struct PdfBuilder {
    pages: Vec<String>,
    current: String,
    cursor_y: f32,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: String::new(),
            cursor_y: PAGE_HEIGHT - MARGIN,
        }
    }

    /// Large bold line, centred roughly by its length.
    pub fn title(&mut self, text: &str) -> &mut Self {
        let size = 18.0;
        let estimated_width = text.chars().count() as f32 * size * 0.55;
        let x = ((PAGE_WIDTH - estimated_width) / 2.0).max(MARGIN);
        self.line_at(x, text, Font::Bold, size, 28.0);
        self
    }

    /// Bold section heading with some space above it.
    pub fn heading(&mut self, text: &str) -> &mut Self {
        self.spacer(8.0);
        self.line_at(MARGIN, text, Font::Bold, 13.0, 20.0);
        self
    }

    /// Wrapped body paragraph.
    pub fn text(&mut self, text: &str) -> &mut Self {
        for line in wrap(text, BODY_WRAP) {
            self.line_at(MARGIN, &line, Font::Regular, 11.0, 15.0);
        }
        self
    }

    /// `Label: value` row with the value in its own column.
    pub fn field(&mut self, label: &str, value: &str) -> &mut Self {
        let lines = wrap(value, VALUE_WRAP);
        for (i, line) in lines.iter().enumerate() {
            self.ensure_room(15.0);
            if i == 0 {
                self.put(MARGIN, self.cursor_y, &format!("{label}:"), Font::Bold, 11.0);
            }
            self.put(VALUE_X, self.cursor_y, line, Font::Regular, 11.0);
            self.cursor_y -= 15.0;
        }
        self
    }

    pub fn spacer(&mut self, points: f32) -> &mut Self {
        self.cursor_y -= points;
        self
    }

    /// Serialize every page into a complete PDF file.
    pub fn finish(mut self) -> Vec<u8> {
        if !self.current.is_empty() || self.pages.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
        }
        serialize(&self.pages)
    }

    fn line_at(&mut self, x: f32, text: &str, font: Font, size: f32, leading: f32) {
        self.ensure_room(leading);
        self.put(x, self.cursor_y, text, font, size);
        self.cursor_y -= leading;
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.cursor_y - needed < MARGIN {
            self.pages.push(std::mem::take(&mut self.current));
            self.cursor_y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn put(&mut self, x: f32, y: f32, text: &str, font: Font, size: f32) {
        self.current.push_str(&format!(
            "BT /{} {size} Tf {x:.1} {y:.1} Td ({}) Tj ET\n",
            font.resource(),
            escape(text)
        ));
    }
}

/// Escape a string for a PDF literal. Latin-1 letters become octal escapes,
/// which `/WinAnsiEncoding` maps to the same glyphs; anything beyond that is
/// replaced with `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\t' => out.push(' '),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap by character count. Words longer than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > width {
                if !line.is_empty() {
                    lines.push(std::mem::take(&mut line));
                }
                let head: String = word.chars().take(width).collect();
                word = word.chars().skip(width).collect();
                lines.push(head);
            }
            let needed = if line.is_empty() { 0 } else { 1 } + word.chars().count();
            if line.chars().count() + needed > width {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&word);
        }
        lines.push(line);
    }
    lines
}

fn serialize(pages: &[String]) -> Vec<u8> {
    // Objects 1..=4 are fixed; each page then takes a page object and a
    // content stream object.
    let page_obj = |i: usize| 5 + i * 2;
    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", page_obj(i)))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<String> = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (i, content) in pages.iter().enumerate() {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
             /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
            page_obj(i) + 1
        ));
        objects.push(format!(
            "<< /Length {} >>\nstream\n{content}endstream",
            content.len()
        ));
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", i + 1).as_bytes());
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(bytes: &[u8]) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn empty_document_is_a_single_page_pdf() {
        let pdf = as_text(&PdfBuilder::new().finish());
        assert!(pdf.starts_with("%PDF-1.4\n"));
        assert!(pdf.ends_with("%%EOF\n"));
        assert!(pdf.contains("/Count 1"));
    }

    #[test]
    fn startxref_points_at_xref_table() {
        let mut b = PdfBuilder::new();
        b.title("Application Form").field("Name", "Asha");
        let pdf = as_text(&b.finish());
        let start = pdf.rfind("startxref\n").unwrap() + "startxref\n".len();
        let offset: usize = pdf[start..].lines().next().unwrap().parse().unwrap();
        assert!(pdf[offset..].starts_with("xref\n"));
    }

    #[test]
    fn object_offsets_are_exact() {
        let mut b = PdfBuilder::new();
        b.heading("Personal Details").text("hello");
        let pdf = as_text(&b.finish());
        let xref = pdf.find("xref\n").unwrap();
        let entries: Vec<usize> = pdf[xref..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 6);
        for (i, offset) in entries.into_iter().enumerate() {
            assert!(pdf[offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn long_content_breaks_pages() {
        let mut b = PdfBuilder::new();
        for i in 0..120 {
            b.field("Row", &i.to_string());
        }
        let pdf = as_text(&b.finish());
        assert!(pdf.contains("/Count 3"));
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape(r"B.Com (H) \ x"), r"B.Com \(H\) \\ x");
        assert_eq!(escape("José"), r"Jos\351");
        assert_eq!(escape("Ñandú ±"), r"\321and\372 \261");
        assert_eq!(escape("Zoë → Ω"), r"Zo\353 ? ?");
    }

    #[test]
    fn wrap_respects_width() {
        let lines = wrap("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        let lines = wrap("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
    }
}
