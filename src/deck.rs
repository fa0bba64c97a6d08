//! Deck renderer: one US-Letter page per analysis record.
//!
//! Pages are built from printpdf `Op`s with the builtin Helvetica font, so no
//! font file is embedded. Text is word-wrapped on an average glyph width
//! estimate; hard line breaks in a record start a new line. Text taller than
//! the page runs past the bottom margin.

use crate::error::SlidesError;
use crate::record::parse_file;
use printpdf::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Points per millimetre.
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Average Helvetica glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Fixed page and typography settings, all in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeckLayout {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub leading: f32,
}

impl Default for DeckLayout {
    fn default() -> Self {
        Self {
            page_width: 612.0,
            page_height: 792.0,
            margin: 36.0,
            font_size: 16.0,
            leading: 24.0,
        }
    }
}

impl DeckLayout {
    /// Characters that fit between the side margins.
    pub fn chars_per_line(&self) -> usize {
        let usable = self.page_width - 2.0 * self.margin;
        ((usable / (self.font_size * AVG_GLYPH_WIDTH)) as usize).max(1)
    }

    /// Lines that fit between the top and bottom margins.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height - 2.0 * self.margin;
        (usable / self.leading).max(1.0) as usize
    }

    fn page_size(&self) -> (Mm, Mm) {
        (
            Mm(self.page_width / PT_PER_MM),
            Mm(self.page_height / PT_PER_MM),
        )
    }
}

/// Greedy word wrap at `max_chars`, keeping hard line breaks.
///
/// Blank lines survive as empty strings. A single word longer than
/// `max_chars` gets a line of its own rather than being split.
pub fn wrap_lines(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();

    for hard_line in text.lines() {
        let mut line = String::new();
        for word in hard_line.split_whitespace() {
            let needed = if line.is_empty() {
                word.chars().count()
            } else {
                line.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars && !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        lines.push(line);
    }

    lines
}

/// Drawing operations for a single page holding `text`.
///
/// The first baseline sits one font size below the top margin.
pub fn page_ops(text: &str, layout: &DeckLayout) -> Vec<Op> {
    let lines = wrap_lines(text, layout.chars_per_line());
    if lines.len() > layout.lines_per_page() {
        warn!(
            "Slide text needs {} lines but a page holds {}; it will overflow",
            lines.len(),
            layout.lines_per_page()
        );
    }

    let mut ops = Vec::with_capacity(lines.len() * 2 + 4);
    ops.push(Op::StartTextSection);
    ops.push(Op::SetFontSizeBuiltinFont {
        size: Pt(layout.font_size),
        font: BuiltinFont::Helvetica,
    });
    ops.push(Op::SetLineHeight {
        lh: Pt(layout.leading),
    });

    let mut y = layout.page_height - layout.margin - layout.font_size;
    for line in lines {
        if !line.is_empty() {
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(layout.margin),
                    y: Pt(y),
                },
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(line)],
                font: BuiltinFont::Helvetica,
            });
        }
        y -= layout.leading;
    }

    ops.push(Op::EndTextSection);
    ops
}

/// Render `texts` into a PDF at `output_path` with the default layout.
///
/// Returns the number of pages written. An empty `texts` still produces a
/// valid document with a single blank page.
pub fn render_deck(texts: &[String], output_path: &Path) -> Result<usize, SlidesError> {
    render_deck_with_layout(texts, output_path, &DeckLayout::default())
}

pub fn render_deck_with_layout(
    texts: &[String],
    output_path: &Path,
    layout: &DeckLayout,
) -> Result<usize, SlidesError> {
    let (width, height) = layout.page_size();

    let mut pages: Vec<PdfPage> = texts
        .iter()
        .enumerate()
        .map(|(i, text)| {
            debug!("Laying out page {} ({} chars)", i + 1, text.len());
            PdfPage::new(width, height, page_ops(text, layout))
        })
        .collect();
    if pages.is_empty() {
        warn!("No slide records to render; writing a blank page");
        pages.push(PdfPage::new(width, height, Vec::new()));
    }
    let page_count = pages.len();

    let title = output_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Slides");
    let mut warnings = Vec::new();
    let bytes = PdfDocument::new(title)
        .with_pages(pages)
        .save(&PdfSaveOptions::default(), &mut warnings);
    for w in &warnings {
        debug!("printpdf: {:?}", w);
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| SlidesError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(output_path, bytes).map_err(|e| SlidesError::DeckWriteFailed {
        path: output_path.to_path_buf(),
        detail: e.to_string(),
    })?;

    info!("Wrote {} pages to {}", page_count, output_path.display());
    Ok(page_count)
}

/// Parse an analysis file and render its records, one per page.
pub fn render_analysis_file(input: &Path, output: &Path) -> Result<usize, SlidesError> {
    let texts = parse_file(input)?;
    info!("Parsed {} slide records from {}", texts.len(), input.display());
    render_deck(&texts, output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn written_text(ops: &[Op]) -> Vec<String> {
        ops.iter()
            .filter_map(|op| match op {
                Op::WriteTextBuiltinFont { items, .. } => Some(items),
                _ => None,
            })
            .flatten()
            .filter_map(|item| match item {
                TextItem::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn default_layout_is_us_letter() {
        let layout = DeckLayout::default();
        assert_eq!((layout.page_width, layout.page_height), (612.0, 792.0));
        // 540pt usable at 8pt per glyph
        assert_eq!(layout.chars_per_line(), 67);
        assert_eq!(layout.lines_per_page(), 30);
    }

    #[test]
    fn wrap_breaks_on_word_boundaries() {
        let lines = wrap_lines("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    }

    #[test]
    fn wrap_keeps_hard_breaks_and_blank_lines() {
        let lines = wrap_lines("Title\n\n- point one\n- point two", 80);
        assert_eq!(lines, vec!["Title", "", "- point one", "- point two"]);
    }

    #[test]
    fn wrap_gives_long_words_their_own_line() {
        let lines = wrap_lines("a supercalifragilistic b", 5);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn page_ops_write_only_their_own_text() {
        let layout = DeckLayout::default();
        assert_eq!(written_text(&page_ops("Hello", &layout)), vec!["Hello"]);
        assert_eq!(written_text(&page_ops("World", &layout)), vec!["World"]);
    }

    #[test]
    fn first_line_starts_below_top_margin() {
        let layout = DeckLayout::default();
        let ops = page_ops("Hello", &layout);
        let cursor = ops.iter().find_map(|op| match op {
            Op::SetTextCursor { pos } => Some((pos.x.0, pos.y.0)),
            _ => None,
        });
        assert_eq!(cursor, Some((36.0, 792.0 - 36.0 - 16.0)));
    }

    #[test]
    fn render_writes_one_page_per_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deck.pdf");
        let texts = vec!["Hello".to_string(), "World".to_string()];

        let pages = render_deck(&texts, &out).unwrap();
        assert_eq!(pages, 2);

        let doc = lopdf::Document::load(&out).expect("output should be a valid PDF");
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn empty_deck_gets_a_blank_page() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.pdf");
        assert_eq!(render_deck(&[], &out).unwrap(), 1);
        assert!(out.exists());
    }

    #[test]
    fn missing_analysis_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = render_analysis_file(
            &dir.path().join("missing_analysis.txt"),
            &dir.path().join("out.pdf"),
        )
        .unwrap_err();
        assert!(matches!(err, SlidesError::Io { .. }));
    }
}
