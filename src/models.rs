//! Data models for YouTube comments and their sentiment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentiment returned by the Natural Language API for one piece of text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Sentiment {
    /// Polarity from -1.0 (negative) to 1.0 (positive).
    pub score: f64,
    /// Overall strength of emotion, unbounded above.
    pub magnitude: f64,
}

impl Sentiment {
    pub fn neutral() -> Self {
        Self {
            score: 0.0,
            magnitude: 0.0,
        }
    }

    /// Returns a coarse label for the score.
    pub fn label(&self) -> &'static str {
        if self.score >= 0.25 {
            "positive"
        } else if self.score <= -0.25 {
            "negative"
        } else {
            "neutral"
        }
    }
}

/// A single comment on a video, either top-level or a reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentRecord {
    pub comment_id: String,
    /// Id of the top-level comment this one replies to.
    pub parent_id: Option<String>,
    pub video_id: String,
    pub author: String,
    pub author_channel_id: Option<String>,
    pub author_channel_url: Option<String>,
    pub author_profile_image_url: Option<String>,
    /// Channel the comment was posted on.
    pub channel_id: Option<String>,
    pub text: String,
    pub like_count: u64,
    pub published_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
}

impl CommentRecord {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Score of the attached sentiment, if the comment was analyzed.
    pub fn sentiment_score(&self) -> Option<f64> {
        self.sentiment.map(|s| s.score)
    }

    /// Returns a copy of this record carrying the given sentiment.
    pub fn with_sentiment(self, sentiment: Sentiment) -> Self {
        Self {
            sentiment: Some(sentiment),
            ..self
        }
    }
}

impl fmt::Display for CommentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.author, self.text)
    }
}
