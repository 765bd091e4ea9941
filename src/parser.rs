use crate::models::HighlightRecord;
use log::{debug, warn};
use std::path::Path;

const SEPARATOR_MIN_LEN: usize = 10;
const MIN_SECTION_LINES: usize = 4;
const BOM: char = '\u{feff}';

// Tried in order: a location wins over a page on `on page 3 | location 40-41`,
// the page is used only when no location follows.
const LOCATION_MARKERS: &[&str] = &["location", "on page"];

#[derive(Debug, PartialEq)]
pub enum ParseError {
    Io(String),
    InvalidEncoding(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Io(details) => write!(f, "Failed to read clippings file: {}", details),
            ParseError::InvalidEncoding(file) => {
                write!(f, "Clippings file is not valid UTF-8: {}", file)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Why a single section could not become a record.
#[derive(Debug, PartialEq)]
pub enum SectionError {
    TooFewLines(usize),
    EmptyTitle,
    MissingAuthors(String),
    MissingAddedOn(String),
    MissingDate(String),
    MissingLocation(String),
    InvalidLocation(String),
}

impl std::fmt::Display for SectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SectionError::TooFewLines(n) => {
                write!(f, "expected at least {} lines, found {}", MIN_SECTION_LINES, n)
            }
            SectionError::EmptyTitle => write!(f, "header has no title"),
            SectionError::MissingAuthors(header) => {
                write!(f, "no authors in parentheses: '{}'", header)
            }
            SectionError::MissingAddedOn(meta) => write!(f, "no 'Added on' in '{}'", meta),
            SectionError::MissingDate(meta) => write!(f, "no date after 'Added on' in '{}'", meta),
            SectionError::MissingLocation(meta) => {
                write!(f, "no location or page marker in '{}'", meta)
            }
            SectionError::InvalidLocation(meta) => {
                write!(f, "location is not a number in '{}'", meta)
            }
        }
    }
}

impl std::error::Error for SectionError {}

/// The lines between two separators, numbered in file order from 0.
#[derive(Debug, PartialEq)]
pub struct Section<'a> {
    pub index: usize,
    pub lines: Vec<&'a str>,
}

#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<HighlightRecord>,
    pub skipped: Vec<(usize, SectionError)>,
}

pub fn read_clippings(path: &Path) -> Result<String, ParseError> {
    let bytes = std::fs::read(path)
        .map_err(|e| ParseError::Io(format!("{}: {}", path.display(), e)))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| ParseError::InvalidEncoding(path.display().to_string()))?;

    Ok(content.trim_start_matches(BOM).to_string())
}

fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.len() >= SEPARATOR_MIN_LEN && line.chars().all(|c| c == '=')
}

pub fn split_sections(content: &str) -> Vec<Section<'_>> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        if is_separator(line) {
            sections.push(Section {
                index: sections.len(),
                lines: std::mem::take(&mut current),
            });
        } else {
            current.push(line);
        }
    }

    if current.iter().any(|l| !l.trim().is_empty()) {
        debug!("ignoring {} trailing lines without separator", current.len());
    }

    sections
}

pub fn parse_section(lines: &[&str]) -> Result<HighlightRecord, SectionError> {
    if lines.len() < MIN_SECTION_LINES {
        return Err(SectionError::TooFewLines(lines.len()));
    }

    let header = lines[0].trim_start_matches(BOM);
    let (title, authors) = parse_header(header)?;

    let meta = lines[1].trim();
    let (before_added, after_added) = meta
        .split_once("Added on")
        .ok_or_else(|| SectionError::MissingAddedOn(meta.to_string()))?;
    let location = parse_location(before_added, meta)?;
    let (_, date) = after_added
        .split_once(", ")
        .ok_or_else(|| SectionError::MissingDate(meta.to_string()))?;

    let quote = lines[2..].join("\n").trim().to_string();

    Ok(HighlightRecord {
        title,
        authors,
        location,
        date: date.trim().to_string(),
        quote,
    })
}

fn parse_header(header: &str) -> Result<(String, Vec<String>), SectionError> {
    let (title, rest) = header
        .split_once('(')
        .ok_or_else(|| SectionError::MissingAuthors(header.trim().to_string()))?;

    let title = title.trim();
    if title.is_empty() {
        return Err(SectionError::EmptyTitle);
    }

    let inner = rest.split(')').next().unwrap_or_default();
    let authors: Vec<String> = inner
        .split(';')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect();

    if authors.is_empty() {
        return Err(SectionError::MissingAuthors(header.trim().to_string()));
    }

    Ok((title.to_string(), authors))
}

/// Reads the first run of digits following a marker phrase. A range such as
/// `1234-1240` stops at the dash, so the start is kept.
fn parse_location(text: &str, meta: &str) -> Result<u32, SectionError> {
    let mut marker_seen = false;

    for marker in LOCATION_MARKERS {
        let Some(pos) = text.find(marker) else {
            continue;
        };
        marker_seen = true;

        let digits: String = text[pos + marker.len()..]
            .trim_start()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();

        if let Ok(location) = digits.parse::<u32>() {
            return Ok(location);
        }
    }

    if marker_seen {
        Err(SectionError::InvalidLocation(meta.to_string()))
    } else {
        Err(SectionError::MissingLocation(meta.to_string()))
    }
}

/// Orders records by title, then location. The sort is stable, so records
/// sharing both keep their file order.
pub fn sort_records(records: &mut [HighlightRecord]) {
    records.sort_by(|a, b| {
        a.title
            .cmp(&b.title)
            .then_with(|| a.location.cmp(&b.location))
    });
}

pub fn extract_records(content: &str) -> Extraction {
    let mut extraction = Extraction::default();

    for section in split_sections(content) {
        match parse_section(&section.lines) {
            Ok(record) => extraction.records.push(record),
            Err(e) => {
                warn!("skipped malformed section {}: {}", section.index, e);
                extraction.skipped.push((section.index, e));
            }
        }
    }

    sort_records(&mut extraction.records);
    extraction
}
