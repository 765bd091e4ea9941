use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &["%d %B %Y %H:%M:%S", "%B %d, %Y %I:%M:%S %p"];
const DATE_FORMATS: &[&str] = &["%d %B %Y", "%B %d, %Y"];

/// One highlight as exported by the Kindle, parsed from a single section.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightRecord {
    pub title: String,
    pub authors: Vec<String>,
    pub location: u32,
    pub date: String,
    pub quote: String,
}

impl HighlightRecord {
    pub fn authors_joined(&self) -> String {
        self.authors.join(", ")
    }

    /// Interprets the raw `date` as a calendar timestamp. Kindle writes either
    /// `1 January 2024 10:22:33` or `January 1, 2024 10:22:33 AM` depending on
    /// the device locale.
    pub fn added_at(&self) -> Option<NaiveDateTime> {
        let raw = self.date.trim();

        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                DATE_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(date: &str) -> HighlightRecord {
        HighlightRecord {
            title: "The Book".to_string(),
            authors: vec!["Author A".to_string(), "Author B".to_string()],
            location: 12,
            date: date.to_string(),
            quote: "A notable quote.".to_string(),
        }
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_authors_joined() {
        let record = make_record("1 January 2024");

        assert_eq!(record.authors_joined(), "Author A, Author B");
    }

    #[test]
    fn test_added_at_european_format() {
        let record = make_record("14 March 2023 21:05:09");

        assert_eq!(record.added_at(), Some(datetime(2023, 3, 14, 21, 5, 9)));
    }

    #[test]
    fn test_added_at_us_format() {
        let record = make_record("March 14, 2023 9:05:09 PM");

        assert_eq!(record.added_at(), Some(datetime(2023, 3, 14, 21, 5, 9)));
    }

    #[test]
    fn test_added_at_date_only() {
        let record = make_record("1 January 2024");

        assert_eq!(record.added_at(), Some(datetime(2024, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_added_at_unrecognized() {
        let record = make_record("sometime last week");

        assert_eq!(record.added_at(), None);
    }
}
