//! Sentiment scoring via the Cloud Natural Language API.

use crate::credentials::TokenProvider;
use crate::error::CommentsError;
use crate::models::{CommentRecord, Sentiment};
use crate::parser::api_error_message;
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::debug;

/// Trait for scoring text, allowing for mocking in tests.
pub trait SentimentAnalyzer {
    fn analyze(&self, text: &str) -> Result<Sentiment, CommentsError>;
}

/// Client for `documents:analyzeSentiment`.
pub struct LanguageClient {
    http: reqwest::blocking::Client,
    tokens: Rc<dyn TokenProvider>,
    url: String,
}

impl LanguageClient {
    pub fn new(http: reqwest::blocking::Client, tokens: Rc<dyn TokenProvider>, url: String) -> Self {
        Self { http, tokens, url }
    }

    /// Builds the POST for one plain-text document.
    pub fn build_request(
        &self,
        token: &str,
        text: &str,
    ) -> reqwest::Result<reqwest::blocking::Request> {
        self.http
            .post(&self.url)
            .bearer_auth(token)
            .json(&analyze_request_body(text))
            .build()
    }
}

impl SentimentAnalyzer for LanguageClient {
    fn analyze(&self, text: &str) -> Result<Sentiment, CommentsError> {
        let token = self.tokens.access_token()?;

        let response = self
            .build_request(&token, text)
            .and_then(|request| self.http.execute(request))
            .map_err(|e| CommentsError::SentimentService(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CommentsError::SentimentService(format!("cannot read response: {e}")))?;

        parse_sentiment_response(status, &body)
    }
}

/// Request body for a plain-text document.
pub fn analyze_request_body(text: &str) -> Value {
    json!({
        "document": {
            "type": "PLAIN_TEXT",
            "content": text
        },
        "encodingType": "UTF8"
    })
}

/// Parses an `analyzeSentiment` response.
/// Kept apart from the HTTP call so the status handling can be tested.
pub fn parse_sentiment_response(status: u16, body: &str) -> Result<Sentiment, CommentsError> {
    if !(200..300).contains(&status) {
        let message = api_error_message(body).unwrap_or_else(|| body.trim().to_string());
        return Err(CommentsError::SentimentService(format!(
            "status {status}: {message}"
        )));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| CommentsError::SentimentService(format!("invalid response JSON: {e}")))?;

    let document = value.get("documentSentiment").ok_or_else(|| {
        CommentsError::SentimentService("missing documentSentiment in response".to_string())
    })?;

    // The API omits zero-valued fields
    let score = document.get("score").and_then(|v| v.as_f64()).unwrap_or(0.0);
    let magnitude = document
        .get("magnitude")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.0);

    Ok(Sentiment { score, magnitude })
}

/// Attaches a sentiment to a comment. Blank comments are neutral and are not
/// sent to the service.
pub fn annotate(
    analyzer: &dyn SentimentAnalyzer,
    comment: CommentRecord,
) -> Result<CommentRecord, CommentsError> {
    let sentiment = if comment.text.trim().is_empty() {
        Sentiment::neutral()
    } else {
        analyzer.analyze(&comment.text)?
    };

    debug!(
        comment_id = %comment.comment_id,
        score = sentiment.score,
        magnitude = sentiment.magnitude,
        "Scored comment"
    );

    Ok(comment.with_sentiment(sentiment))
}
