/// PDF rendering of an [`ActivityLog`].
///
/// Rendering happens in two steps. [`ReportLayout::paginate`] decides which
/// line lands on which page and at which height; [`ReportWriter`] then turns
/// each laid-out page into a PDF page through a [`PageCanvas`], whose
/// `finish` is the only way a page gets into the document.
use crate::activity_log::ActivityLog;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const BODY_FONT: &str = "F1";
const TITLE_FONT: &str = "F2";

/// Errors that can occur while producing the report.
#[derive(Debug)]
pub enum ReportError {
    /// A page could not be encoded.
    RenderFailed { page: usize, reason: String },
    /// The finished document could not be written to disk.
    SaveFailed { path: PathBuf, reason: String },
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RenderFailed { page, reason } => {
                write!(f, "Failed to render report page {}: {}", page, reason)
            }
            Self::SaveFailed { path, reason } => {
                write!(f, "Failed to save report {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ReportError {}

pub type ReportResult<T> = Result<T, ReportError>;

/// Page geometry and typography, in PDF points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportLayout {
    /// Bold heading printed once, at the top of the first page.
    pub title: String,
    pub page_width: f32,
    pub page_height: f32,
    pub left_margin: f32,
    /// Baseline of the title on the first page.
    pub title_y: f32,
    /// Baseline of the first log line on the first page.
    pub first_line_y: f32,
    /// Baseline of the first log line on every following page.
    pub top_margin: f32,
    /// A new page starts once the cursor drops below this baseline.
    pub bottom_margin: f32,
    pub leading: f32,
    pub title_font_size: f32,
    pub font_size: f32,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            title: "File Organization Report".to_string(),
            page_width: 612.0,
            page_height: 792.0,
            left_margin: 50.0,
            title_y: 750.0,
            first_line_y: 720.0,
            top_margin: 750.0,
            bottom_margin: 50.0,
            leading: 14.5,
            title_font_size: 16.0,
            font_size: 10.0,
        }
    }
}

/// A line of text with its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine<'a> {
    pub text: &'a str,
    pub y: f32,
}

/// The lines that belong to one page. Pages are numbered from 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout<'a> {
    pub number: usize,
    pub lines: Vec<PlacedLine<'a>>,
}

impl<'a> PageLayout<'a> {
    fn new(number: usize) -> Self {
        Self {
            number,
            lines: Vec::new(),
        }
    }
}

impl ReportLayout {
    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.leading <= 0.0 {
            return Err("report.leading must be positive".to_string());
        }
        if self.font_size <= 0.0 || self.title_font_size <= 0.0 {
            return Err("report font sizes must be positive".to_string());
        }
        if self.bottom_margin >= self.top_margin {
            return Err("report.bottom_margin must be below report.top_margin".to_string());
        }
        if self.first_line_y > self.title_y {
            return Err("report.first_line_y must not be above report.title_y".to_string());
        }
        if self.top_margin > self.page_height || self.title_y > self.page_height {
            return Err("report text must start inside the page".to_string());
        }
        Ok(())
    }

    /// Distributes `lines` over pages.
    ///
    /// The first page always exists, even for an empty log, because it
    /// carries the title. Before each line the cursor is checked against the
    /// bottom margin; a cursor below it closes the current page and the line
    /// goes to the top of a fresh one.
    pub fn paginate<'a, S: AsRef<str>>(&self, lines: &'a [S]) -> Vec<PageLayout<'a>> {
        let mut pages = Vec::new();
        let mut current = PageLayout::new(1);
        let mut y = self.first_line_y;

        for line in lines {
            if y < self.bottom_margin {
                let next = PageLayout::new(current.number + 1);
                pages.push(std::mem::replace(&mut current, next));
                y = self.top_margin;
            }
            current.lines.push(PlacedLine {
                text: line.as_ref(),
                y,
            });
            y -= self.leading;
        }

        pages.push(current);
        pages
    }
}

/// What a report run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStats {
    pub path: PathBuf,
    pub pages: usize,
    pub lines: usize,
}

/// Content of a single page under construction.
///
/// Every text run is emitted as a complete `BT ... ET` object, so a canvas
/// never holds an open text object between calls.
struct PageCanvas {
    number: usize,
    operations: Vec<Operation>,
}

impl PageCanvas {
    fn begin(number: usize) -> Self {
        Self {
            number,
            operations: Vec::new(),
        }
    }

    fn text(&mut self, font: &str, size: f32, x: f32, y: f32, text: &str) {
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.into(), size.into()]),
            Operation::new("Td", vec![x.into(), y.into()]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }

    /// Finalizes the page: encodes its content stream and adds the page
    /// object to `doc`.
    fn finish(self, doc: &mut Document, parent: ObjectId) -> ReportResult<ObjectId> {
        let number = self.number;
        let content = Content {
            operations: self.operations,
        };
        let encoded = content.encode().map_err(|e| ReportError::RenderFailed {
            page: number,
            reason: e.to_string(),
        })?;

        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "Contents" => content_id,
        });
        tracing::debug!(page = number, "report page finalized");
        Ok(page_id)
    }
}

/// Writes an [`ActivityLog`] as a paginated PDF.
#[derive(Debug, Clone, Default)]
pub struct ReportWriter {
    layout: ReportLayout,
}

impl ReportWriter {
    pub fn new(layout: ReportLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ReportLayout {
        &self.layout
    }

    /// Builds the in-memory document for `log`.
    ///
    /// Returns the document together with its page count.
    pub fn render(&self, log: &ActivityLog) -> ReportResult<(Document, usize)> {
        let layout = &self.layout;
        let lines = log.lines();
        let pages = layout.paginate(&lines);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let body_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let title_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                BODY_FONT => body_font_id,
                TITLE_FONT => title_font_id,
            },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in &pages {
            let mut canvas = PageCanvas::begin(page.number);
            if page.number == 1 {
                canvas.text(
                    TITLE_FONT,
                    layout.title_font_size,
                    layout.left_margin,
                    layout.title_y,
                    &layout.title,
                );
            }
            for line in &page.lines {
                canvas.text(
                    BODY_FONT,
                    layout.font_size,
                    layout.left_margin,
                    line.y,
                    line.text,
                );
            }
            kids.push(canvas.finish(&mut doc, pages_id)?.into());
        }

        let page_count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count as i64,
                "Resources" => resources_id,
                "MediaBox" => vec![
                    0.into(),
                    0.into(),
                    layout.page_width.into(),
                    layout.page_height.into(),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let created = chrono::Local::now().format("D:%Y%m%d%H%M%S").to_string();
        let info_id = doc.add_object(dictionary! {
            "Title" => text_string(&layout.title),
            "Producer" => Object::string_literal(concat!("prefixsort ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(created),
        });
        doc.trailer.set("Info", info_id);

        Ok((doc, page_count))
    }

    /// Renders `log` and saves it to `path`.
    pub fn write(&self, log: &ActivityLog, path: &Path) -> ReportResult<ReportStats> {
        let (mut doc, pages) = self.render(log)?;

        doc.save(path).map_err(|e| ReportError::SaveFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::info!(path = %path.display(), pages, lines = log.len(), "report written");
        Ok(ReportStats {
            path: path.to_path_buf(),
            pages,
            lines: log.len(),
        })
    }
}

/// Builds a PDF text string for document metadata.
///
/// ASCII stays a literal string; anything else is written as UTF-16BE with
/// a byte order mark, which readers decode regardless of font encodings.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Encodes text for a standard Type1 font with WinAnsiEncoding.
///
/// Latin-1 maps to itself, a few common typographic characters map into the
/// 0x80-0x9F block and everything else becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}
