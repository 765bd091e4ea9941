pub mod books;
pub mod config;
pub mod export;
pub mod models;
pub mod parser;
