use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_INPUT_PATH: &str = "My Clippings.txt";
const DEFAULT_OUTPUT_ROOT: &str = ".";

#[derive(Parser, Debug)]
#[command(name = "kindle-clippings")]
#[command(about = "Export Kindle highlights to a spreadsheet and one document per book")]
pub struct CliArgs {
    /// Path to the Kindle "My Clippings.txt" file
    #[arg(short, long)]
    pub input: Option<String>,

    /// Directory in which the dated output folder is created
    #[arg(short, long)]
    pub output_root: Option<String>,

    /// Date used to name the output folder (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    pub date: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Print every book title found in the clippings
    List,
    /// Pick books by title, confirm, and write a single document for them
    Choose,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Batch,
    List,
    Choose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_root: PathBuf,
    pub today: NaiveDate,
    pub mode: Mode,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    InvalidDateFormat(String),
    EmptyInputPath,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidDateFormat(s) => {
                write!(f, "Invalid date format: '{}'. Expected YYYY-MM-DD", s)
            }
            ConfigError::EmptyInputPath => write!(f, "Clippings path must not be empty"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let cli = CliArgs::parse();
        Self::from_args(cli, Local::now().date_naive())
    }

    fn from_args(cli: CliArgs, today: NaiveDate) -> Result<Self, ConfigError> {
        let today = match &cli.date {
            Some(s) => parse_date(s)?,
            None => today,
        };

        let input_path = cli
            .input
            .or_else(|| std::env::var("CLIPPINGS_PATH").ok())
            .unwrap_or_else(|| DEFAULT_INPUT_PATH.to_string());

        if input_path.trim().is_empty() {
            return Err(ConfigError::EmptyInputPath);
        }

        let output_root = cli
            .output_root
            .or_else(|| std::env::var("OUTPUT_ROOT").ok())
            .unwrap_or_else(|| DEFAULT_OUTPUT_ROOT.to_string());

        let mode = match cli.command {
            None => Mode::Batch,
            Some(Command::List) => Mode::List,
            Some(Command::Choose) => Mode::Choose,
        };

        Ok(Config {
            input_path: PathBuf::from(input_path),
            output_root: PathBuf::from(output_root),
            today,
            mode,
        })
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ConfigError::InvalidDateFormat(s.to_string()))
}
