//! YouTube Data API interaction and the comment pagination loop.

use crate::config::RunConfig;
use crate::credentials::TokenProvider;
use crate::error::CommentsError;
use crate::models::CommentRecord;
use crate::parser::{api_error_message, api_error_reason, next_page_token, parse_comment_threads};
use crate::sanitizer::strip_html;
use crate::sentiment::{annotate, SentimentAnalyzer};
use serde_json::Value;
use std::rc::Rc;
use tracing::{debug, info};

/// Trait for listing comment threads, allowing for mocking in tests.
pub trait CommentSource {
    /// Fetches one `commentThreads.list` page for `video_id`.
    fn list_comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<Value, CommentsError>;
}

/// Client for the YouTube Data API v3 `commentThreads` endpoint.
pub struct YouTubeClient {
    http: reqwest::blocking::Client,
    tokens: Rc<dyn TokenProvider>,
    url: String,
}

impl YouTubeClient {
    pub fn new(http: reqwest::blocking::Client, tokens: Rc<dyn TokenProvider>, url: String) -> Self {
        Self { http, tokens, url }
    }

    /// Builds one `commentThreads.list` request. `pageToken` is only sent
    /// after the first page.
    pub fn build_request(
        &self,
        token: &str,
        video_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> reqwest::Result<reqwest::blocking::Request> {
        let mut query = vec![
            ("part", "id,replies,snippet".to_string()),
            ("videoId", video_id.to_string()),
            ("maxResults", max_results.to_string()),
            ("textFormat", "html".to_string()),
        ];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token.to_string()));
        }

        self.http
            .get(&self.url)
            .query(&query)
            .bearer_auth(token)
            .build()
    }
}

impl CommentSource for YouTubeClient {
    fn list_comment_threads(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> Result<Value, CommentsError> {
        let token = self.tokens.access_token()?;

        let response = self
            .build_request(&token, video_id, page_token, max_results)
            .and_then(|request| self.http.execute(request))
            .map_err(|e| CommentsError::UpstreamRequest(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| CommentsError::UpstreamRequest(format!("cannot read response: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(map_status_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| CommentsError::UpstreamRequest(format!("invalid response JSON: {e}")))
    }
}

/// 403 reasons that describe the request or quota rather than the caller's identity.
const NON_AUTH_FORBIDDEN_REASONS: &[&str] = &[
    "commentsDisabled",
    "quotaExceeded",
    "dailyLimitExceeded",
    "rateLimitExceeded",
];

/// Maps a failed listing response to the error taxonomy.
/// This is a separate function to enable testing of the status mapping.
pub fn map_status_error(status: u16, body: &str) -> CommentsError {
    let message = api_error_message(body)
        .map(|m| strip_html(&m).into_owned())
        .unwrap_or_else(|| body.trim().to_string());
    let detail = format!("status {status}: {message}");

    let reason = api_error_reason(body);
    let is_auth = match status {
        401 => true,
        403 => !reason
            .as_deref()
            .is_some_and(|r| NON_AUTH_FORBIDDEN_REASONS.contains(&r)),
        _ => false,
    };

    if is_auth {
        CommentsError::UpstreamAuth(detail)
    } else {
        CommentsError::UpstreamRequest(detail)
    }
}

enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazy iterator over the pages of a video's comments.
///
/// Yields one `Vec<CommentRecord>` per upstream page in upstream order and
/// stops for good after the last page or the first error.
pub struct CommentPages<'a> {
    source: &'a dyn CommentSource,
    video_id: &'a str,
    max_results: u32,
    include_replies: bool,
    cursor: Cursor,
    pages_fetched: usize,
}

impl<'a> CommentPages<'a> {
    pub fn new(source: &'a dyn CommentSource, config: &'a RunConfig) -> Self {
        Self {
            source,
            video_id: &config.video_id,
            max_results: config.max_results,
            include_replies: config.include_replies,
            cursor: Cursor::Start,
            pages_fetched: 0,
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl Iterator for CommentPages<'_> {
    type Item = Result<Vec<CommentRecord>, CommentsError>;

    fn next(&mut self) -> Option<Self::Item> {
        let page_token = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Done => return None,
            Cursor::Start => None,
            Cursor::Next(token) => Some(token),
        };

        let page = match self.source.list_comment_threads(
            self.video_id,
            page_token.as_deref(),
            self.max_results,
        ) {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };
        self.pages_fetched += 1;

        let comments = match parse_comment_threads(&page, self.include_replies) {
            Ok(comments) => comments,
            Err(e) => return Some(Err(e)),
        };
        debug!(
            page = self.pages_fetched,
            comments = comments.len(),
            "Fetched comment page"
        );

        if let Some(token) = next_page_token(&page) {
            self.cursor = Cursor::Next(token);
        }

        Some(Ok(comments))
    }
}

/// Fetches every comment of the configured video, following page tokens
/// until the API reports no further page.
///
/// With an analyzer, each comment is scored as its page arrives; the first
/// failure aborts the whole fetch and nothing is returned.
pub fn fetch_comments(
    source: &dyn CommentSource,
    analyzer: Option<&dyn SentimentAnalyzer>,
    config: &RunConfig,
) -> Result<Vec<CommentRecord>, CommentsError> {
    let mut comments = Vec::new();
    let mut pages = CommentPages::new(source, config);

    for page in pages.by_ref() {
        for comment in page? {
            let comment = match analyzer {
                Some(analyzer) => annotate(analyzer, comment)?,
                None => comment,
            };
            comments.push(comment);
        }
    }

    info!(
        video_id = %config.video_id,
        pages = pages.pages_fetched(),
        comments = comments.len(),
        "Fetched comments"
    );

    Ok(comments)
}
