use crate::books::enumerate_books;
use crate::models::HighlightRecord;
use chrono::NaiveDate;
use docx_rs::{
    AbstractNumbering, Docx, IndentLevel, Level, LevelJc, LevelText, NumberFormat, Numbering,
    NumberingId, Paragraph, Run, SpecialIndentType, Start, Style, StyleType,
};
use log::{debug, info, warn};
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, XlsxError};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DIR_PREFIX: &str = "clips_";
const WORKBOOK_PREFIX: &str = "#clippings_";
const SHEET_NAME: &str = "Clippings";
const HEADERS: [&str; 5] = ["Book Title", "Location", "Date", "Quote", "Authors"];
const COLUMN_WIDTHS: [f64; 5] = [30.0, 20.0, 15.0, 120.0, 30.0];
const HEADER_ROW_HEIGHT: f64 = 20.0;
const HEADER_BACKGROUND: u32 = 0x4E4E4E;
const DATE_NUM_FORMAT: &str = "mmmm d yyyy";

const MAX_STEM_CHARS: usize = 56;
const FORBIDDEN_IN_STEM: &[char] = &[':', '/', '\\', '*', '?', '"', '<', '>', '|'];
const QUOTE_SEPARATOR: &str = "______________________________";
const BULLET_NUMBERING: usize = 1;

#[derive(Debug)]
pub enum ExportError {
    Io(String),
    Workbook(String),
    Document(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "File operation failed: {}", e),
            ExportError::Workbook(e) => write!(f, "Failed to write workbook: {}", e),
            ExportError::Document(e) => write!(f, "Failed to write document: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e.to_string())
    }
}

impl From<XlsxError> for ExportError {
    fn from(e: XlsxError) -> Self {
        ExportError::Workbook(e.to_string())
    }
}

#[derive(Debug, PartialEq)]
pub enum DirStatus {
    Created,
    Existing,
}

#[derive(Debug, PartialEq)]
pub struct ExportSummary {
    pub workbook: PathBuf,
    pub rows: usize,
    pub documents: usize,
}

pub fn output_dir(root: &Path, today: NaiveDate) -> PathBuf {
    root.join(format!("{}{}", DIR_PREFIX, today.format("%Y-%m-%d")))
}

pub fn workbook_path(dir: &Path, today: NaiveDate) -> PathBuf {
    dir.join(format!("{}{}.xlsx", WORKBOOK_PREFIX, today.format("%Y-%m-%d")))
}

/// Creates the dated output directory. An existing directory is reused.
pub fn prepare_output_dir(path: &Path) -> Result<DirStatus, ExportError> {
    match fs::create_dir(path) {
        Ok(()) => Ok(DirStatus::Created),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && path.is_dir() => {
            warn!("output folder {} already exists, writing into it", path.display());
            Ok(DirStatus::Existing)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            fs::create_dir_all(path)?;
            Ok(DirStatus::Created)
        }
        Err(e) => Err(e.into()),
    }
}

/// Writes every record as one row of the `Clippings` sheet and returns the
/// number of data rows written.
pub fn write_workbook(path: &Path, records: &[HighlightRecord]) -> Result<usize, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_BACKGROUND))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let cell = Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    let date = cell.clone().set_num_format(DATE_NUM_FORMAT);
    let wrap = Format::new()
        .set_text_wrap()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter);

    for (col, width) in COLUMN_WIDTHS.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width)?;
    }
    worksheet.set_row_height(0, HEADER_ROW_HEIGHT)?;

    for (col, title) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header)?;
    }
    worksheet.autofilter(0, 0, 0, (HEADERS.len() - 1) as u16)?;

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;

        worksheet.write_string_with_format(row, 0, &record.title, &cell)?;
        worksheet.write_number_with_format(row, 1, record.location, &cell)?;
        match record.added_at() {
            Some(added) => {
                worksheet.write_datetime_with_format(row, 2, &added, &date)?;
            }
            None => {
                worksheet.write_string_with_format(row, 2, &record.date, &date)?;
            }
        }
        worksheet.write_string_with_format(row, 3, &record.quote, &wrap)?;
        worksheet.write_string_with_format(row, 4, record.authors_joined(), &wrap)?;
    }

    workbook.save(path)?;
    debug!("wrote {}", path.display());

    Ok(records.len())
}

/// Turns a book title into something usable as a file name stem.
pub fn sanitize_stem(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !FORBIDDEN_IN_STEM.contains(c))
        .collect();

    cleaned
        .trim()
        .chars()
        .take(MAX_STEM_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}

/// Appends ` (2)`, ` (3)`, ... when `stem` was already used in this run.
fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    if used.insert(stem.clone()) {
        return stem;
    }

    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", stem, n);
        if used.insert(candidate.clone()) {
            warn!("file name '{}' already used, writing '{}' instead", stem, candidate);
            return candidate;
        }
        n += 1;
    }
}

fn heading(text: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .style("Heading1")
}

fn bullet(text: &str) -> Paragraph {
    Paragraph::new()
        .add_run(Run::new().add_text(text))
        .numbering(NumberingId::new(BULLET_NUMBERING), IndentLevel::new(0))
}

fn plain(text: &str) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text))
}

fn new_document() -> Docx {
    Docx::new()
        .add_style(
            Style::new("Heading1", StyleType::Paragraph)
                .name("Heading 1")
                .size(32)
                .bold(),
        )
        .add_abstract_numbering(
            AbstractNumbering::new(BULLET_NUMBERING).add_level(
                Level::new(
                    0,
                    Start::new(1),
                    NumberFormat::new("bullet"),
                    LevelText::new("•"),
                    LevelJc::new("left"),
                )
                .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None),
            ),
        )
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
}

/// Writes `<dir>/<stem>.docx` with the selected titles, the authors of the
/// first matching record and every matching highlight in record order.
///
/// Authors are not merged across titles: with several books selected only
/// the first one's authors are listed.
pub fn write_document(
    dir: &Path,
    stem: &str,
    selected: &[String],
    records: &[HighlightRecord],
) -> Result<PathBuf, ExportError> {
    let matching: Vec<&HighlightRecord> = records
        .iter()
        .filter(|r| selected.contains(&r.title))
        .collect();

    let mut docx = new_document().add_paragraph(heading("Selected books:"));
    for title in selected {
        docx = docx.add_paragraph(bullet(title));
    }

    docx = docx.add_paragraph(heading("Authors:"));
    if let Some(first) = matching.first() {
        for author in &first.authors {
            docx = docx.add_paragraph(bullet(author));
        }
    }

    docx = docx
        .add_paragraph(plain(""))
        .add_paragraph(heading("Highlights"))
        .add_paragraph(plain(""));

    for record in &matching {
        docx = docx
            .add_paragraph(plain(&format!("{} ({})", record.quote, record.location)))
            .add_paragraph(plain(QUOTE_SEPARATOR))
            .add_paragraph(plain(""));
    }

    let path = dir.join(format!("{}.docx", stem));
    let file = File::create(&path)?;
    docx.build()
        .pack(file)
        .map_err(|e| ExportError::Document(format!("{}: {}", path.display(), e)))?;
    debug!("wrote {}", path.display());

    Ok(path)
}

/// Batch run: the workbook with every record, then one document per book.
pub fn export_all(
    dir: &Path,
    today: NaiveDate,
    records: &[HighlightRecord],
) -> Result<ExportSummary, ExportError> {
    let workbook = workbook_path(dir, today);
    let rows = write_workbook(&workbook, records)?;
    info!("wrote {} rows to {}", rows, workbook.display());

    let books = enumerate_books(records);
    let mut used = HashSet::new();
    for book in &books {
        let stem = unique_stem(sanitize_stem(book), &mut used);
        write_document(dir, &stem, std::slice::from_ref(book), records)?;
    }
    info!("wrote {} book documents to {}", books.len(), dir.display());

    Ok(ExportSummary {
        workbook,
        rows,
        documents: books.len(),
    })
}
