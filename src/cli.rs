//! CLI interface and argument parsing.

use crate::error::ParseError;
use clap::{ArgAction, Parser, ValueEnum};

/// CLI tool to fetch YouTube video comments with optional sentiment scores.
#[derive(Parser, Debug)]
#[command(name = "yt-comments")]
#[command(version = "0.1.0")]
#[command(about = "Fetch YouTube video comments, optionally scored for sentiment")]
pub struct Args {
    /// Video id or YouTube URL
    #[arg(long = "video-id", value_name = "ID")]
    pub video_id: String,

    /// Score every comment with the Cloud Natural Language API
    #[arg(long = "include-sentiment")]
    pub include_sentiment: bool,

    /// Service account key file [default: credentials.json]
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS", value_name = "PATH")]
    pub credentials: Option<String>,

    /// Skip replies, keeping only top-level comments
    #[arg(long = "top-level-only")]
    pub top_level_only: bool,

    /// Comment threads requested per page
    #[arg(
        long = "max-results",
        default_value = "100",
        value_parser = clap::value_parser!(u32).range(1..=100)
    )]
    pub max_results: u32,

    /// Output format
    #[arg(short = 'f', long, default_value = "json", value_enum)]
    pub format: OutputFormat,

    /// Write output to file
    #[arg(short = 'O', long)]
    pub output: Option<String>,

    /// HTTP request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,

    /// Base URL of the YouTube Data API
    #[arg(long = "youtube-api-url", env = "YT_COMMENTS_YOUTUBE_API_URL", hide = true)]
    pub youtube_api_url: Option<String>,

    /// Base URL of the Cloud Natural Language API
    #[arg(long = "language-api-url", env = "YT_COMMENTS_LANGUAGE_API_URL", hide = true)]
    pub language_api_url: Option<String>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Available output formats.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    /// Pretty-printed JSON array (default)
    Json,
    /// One JSON object per line
    Jsonl,
    /// "author: text" per comment
    Text,
}

/// Parses a video id or a YouTube URL into a bare video id.
///
/// Supports:
/// - Bare id: XTjtPc0uiG8
/// - Watch URL: https://www.youtube.com/watch?v=XTjtPc0uiG8
/// - Short URL: https://youtu.be/XTjtPc0uiG8
/// - Shorts, embed and live URLs: https://www.youtube.com/shorts/XTjtPc0uiG8
pub fn parse_video_id(input: &str) -> Result<String, ParseError> {
    let input = input.trim().trim_end_matches('/');

    let without_scheme = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);

    let host_and_path = ["www.", "m.", "music."]
        .iter()
        .find_map(|prefix| without_scheme.strip_prefix(*prefix))
        .unwrap_or(without_scheme);

    let candidate = if let Some(rest) = host_and_path.strip_prefix("youtu.be/") {
        Some(first_path_segment(rest))
    } else if let Some(path) = host_and_path.strip_prefix("youtube.com/") {
        if let Some(query) = path.strip_prefix("watch?") {
            query_param(query, "v")
        } else {
            ["shorts/", "embed/", "live/", "v/"]
                .iter()
                .find_map(|prefix| path.strip_prefix(*prefix))
                .map(first_path_segment)
        }
    } else if host_and_path.contains('/') || host_and_path.contains('?') {
        None
    } else {
        Some(host_and_path)
    };

    match candidate {
        Some(id) if is_valid_video_id(id) => Ok(id.to_string()),
        _ => Err(ParseError::InvalidVideoId(input.to_string())),
    }
}

fn first_path_segment(path: &str) -> &str {
    path.split(['/', '?', '#', '&']).next().unwrap_or("")
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('#')
        .next()
        .unwrap_or("")
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Video ids are non-empty and use the URL-safe base64 alphabet.
fn is_valid_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
