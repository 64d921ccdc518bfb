//! YouTube Comments CLI Library
//!
//! A library for fetching YouTube video comments and annotating them with
//! sentiment scores from the Cloud Natural Language API.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetcher;
pub mod formatter;
pub mod models;
pub mod parser;
pub mod sanitizer;
pub mod sentiment;

pub use cli::{Args, OutputFormat};
pub use config::RunConfig;
pub use error::{CommentsError, ParseError};
pub use models::{CommentRecord, Sentiment};
