pub mod analyzer;
pub mod config;
pub mod error;
pub mod forum;
pub mod llm;
pub mod pages;
pub mod relevance;
pub mod report;
pub mod server;
pub mod thread_url;

#[cfg(test)]
mod analyzer_tests;

// Re-export the main types
pub use analyzer::Analyzer;
pub use config::Config;
pub use error::AppError;
pub use relevance::{Relevance, Verdict};
pub use report::{CommentRecord, Summary, ThreadRecord};
