//! Error types for the yt-comments CLI tool.

use thiserror::Error;

/// Errors that can occur while authenticating, fetching or enriching comments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommentsError {
    #[error("Failed to load credentials: {0}")]
    Credentials(String),

    #[error("Authentication with Google APIs failed: {0}")]
    UpstreamAuth(String),

    #[error("YouTube API request failed: {0}")]
    UpstreamRequest(String),

    #[error("Sentiment analysis failed: {0}")]
    SentimentService(String),
}

/// Errors that can occur when parsing a video identifier.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Cannot parse video id: {0}")]
    InvalidVideoId(String),
}
