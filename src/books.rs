use crate::models::HighlightRecord;
use std::io::{self, BufRead, Write};

/// Terminal interaction used by the interactive flow. Kept behind a trait so
/// the selection logic runs against scripted input in tests.
pub trait Prompt {
    fn say(&mut self, line: &str) -> io::Result<()>;
    fn ask(&mut self, question: &str) -> io::Result<String>;
}

pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    #[cfg(test)]
    fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Prompt for Console<R, W> {
    fn say(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)
    }

    fn ask(&mut self, question: &str) -> io::Result<String> {
        writeln!(self.writer, "{}", question)?;
        self.writer.flush()?;

        let mut answer = String::new();
        self.reader.read_line(&mut answer)?;
        Ok(answer.trim_end_matches(['\r', '\n']).to_string())
    }
}

#[derive(Debug, PartialEq)]
pub enum Choice {
    Confirmed { query: String, titles: Vec<String> },
    NoMatchingBooks,
    UserDeclined,
}

/// Distinct titles in the order they first appear.
pub fn enumerate_books(records: &[HighlightRecord]) -> Vec<String> {
    let mut books: Vec<String> = Vec::new();

    for record in records {
        if !books.contains(&record.title) {
            books.push(record.title.clone());
        }
    }

    books
}

pub fn select_books(books: &[String], query: &str) -> Vec<String> {
    books
        .iter()
        .filter(|b| b.contains(query))
        .cloned()
        .collect()
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    answer == "y" || answer == "yes"
}

pub fn list_books(prompt: &mut impl Prompt, books: &[String]) -> io::Result<()> {
    prompt.say("\nAvailable Books:\n---------------------------")?;
    for book in books {
        prompt.say(&format!("-> {}", book))?;
    }
    Ok(())
}

pub fn choose_books(prompt: &mut impl Prompt, books: &[String]) -> io::Result<Choice> {
    let query = prompt.ask("\nEnter desired book title:\n-------------------------")?;
    let titles = select_books(books, &query);

    if titles.is_empty() {
        prompt.say("\n<!> We didn't find any books.")?;
        return Ok(Choice::NoMatchingBooks);
    }

    prompt.say("\nWe found the following books:\n------------------------------")?;
    for title in &titles {
        prompt.say(&format!("-> {}", title))?;
    }

    let decision = prompt.ask("\nAre you sure you want to select these books? (y/n)")?;
    if !is_affirmative(&decision) {
        prompt.say("\n<!> Selection cancelled.")?;
        return Ok(Choice::UserDeclined);
    }

    Ok(Choice::Confirmed { query, titles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn make_record(title: &str, location: u32) -> HighlightRecord {
        HighlightRecord {
            title: title.to_string(),
            authors: vec!["Someone".to_string()],
            location,
            date: "1 January 2024".to_string(),
            quote: "q".to_string(),
        }
    }

    fn books() -> Vec<String> {
        vec!["The Book".to_string(), "Other Title".to_string()]
    }

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(console: Console<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(console.into_writer()).unwrap()
    }

    #[test]
    fn test_enumerate_books_first_seen_no_duplicates() {
        let records = vec![
            make_record("B", 1),
            make_record("A", 1),
            make_record("B", 2),
            make_record("C", 1),
            make_record("A", 5),
        ];

        assert_eq!(enumerate_books(&records), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_enumerate_books_empty() {
        assert!(enumerate_books(&[]).is_empty());
    }

    #[test]
    fn test_select_books_substring() {
        assert_eq!(select_books(&books(), "Book"), vec!["The Book"]);
    }

    #[test]
    fn test_select_books_no_match() {
        assert!(select_books(&books(), "xyz").is_empty());
    }

    #[test]
    fn test_select_books_case_sensitive() {
        assert!(select_books(&books(), "book").is_empty());
    }

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("YES"));
        assert!(is_affirmative(" Yes "));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
        assert!(!is_affirmative(""));
    }

    #[test]
    fn test_list_books_prints_every_title() {
        let mut prompt = console("");

        list_books(&mut prompt, &books()).unwrap();

        let out = output(prompt);
        assert!(out.contains("-> The Book\n"));
        assert!(out.contains("-> Other Title\n"));
    }

    #[test]
    fn test_choose_books_confirmed() {
        let mut prompt = console("Title\ny\n");

        let choice = choose_books(&mut prompt, &books()).unwrap();

        assert_eq!(
            choice,
            Choice::Confirmed {
                query: "Title".to_string(),
                titles: vec!["Other Title".to_string()],
            }
        );
    }

    #[test]
    fn test_choose_books_no_match() {
        let mut prompt = console("xyz\n");

        let choice = choose_books(&mut prompt, &books()).unwrap();

        assert_eq!(choice, Choice::NoMatchingBooks);
        assert!(output(prompt).contains("didn't find any books"));
    }

    #[test]
    fn test_choose_books_declined() {
        let mut prompt = console("The\nno\n");

        let choice = choose_books(&mut prompt, &books()).unwrap();

        assert_eq!(choice, Choice::UserDeclined);
        assert!(output(prompt).contains("-> The Book\n"));
    }

    #[test]
    fn test_choose_books_eof_declines() {
        let mut prompt = console("Book\n");

        let choice = choose_books(&mut prompt, &books()).unwrap();

        assert_eq!(choice, Choice::UserDeclined);
    }
}
