use kindle_clippings::books::{self, Choice, Console};
use kindle_clippings::config::{Config, Mode};
use kindle_clippings::export;
use kindle_clippings::parser;
use log::info;
use std::error::Error;
use std::io;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let content = parser::read_clippings(&config.input_path)?;
    let extraction = parser::extract_records(&content);
    info!(
        "parsed {} highlights from {} ({} sections skipped)",
        extraction.records.len(),
        config.input_path.display(),
        extraction.skipped.len()
    );

    let records = extraction.records;
    let all_books = books::enumerate_books(&records);
    let dir = export::output_dir(&config.output_root, config.today);

    match config.mode {
        Mode::Batch => {
            export::prepare_output_dir(&dir)?;
            let summary = export::export_all(&dir, config.today, &records)?;
            println!(
                "Created {} rows in {}",
                summary.rows,
                summary.workbook.display()
            );
            println!("Created {} book documents in {}", summary.documents, dir.display());
        }
        Mode::List => {
            let mut console = Console::new(io::stdin().lock(), io::stdout());
            books::list_books(&mut console, &all_books)?;
        }
        Mode::Choose => {
            let mut console = Console::new(io::stdin().lock(), io::stdout());
            match books::choose_books(&mut console, &all_books)? {
                Choice::Confirmed { query, titles } => {
                    export::prepare_output_dir(&dir)?;
                    let mut stem = export::sanitize_stem(&query);
                    if stem.is_empty() {
                        stem = export::sanitize_stem(&titles[0]);
                    }
                    let path = export::write_document(&dir, &stem, &titles, &records)?;
                    println!("File was successfully created: {}", path.display());
                }
                Choice::NoMatchingBooks => println!("No document written: no book matched."),
                Choice::UserDeclined => println!("No document written: selection declined."),
            }
        }
    }

    Ok(())
}
