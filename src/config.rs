//! Run configuration resolved from command-line arguments and environment.

use crate::cli::{parse_video_id, Args};
use crate::error::ParseError;
use std::path::PathBuf;
use std::time::Duration;

/// Credentials file used when neither `--credentials` nor
/// `GOOGLE_APPLICATION_CREDENTIALS` is given.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

pub const YOUTUBE_SCOPE: &str = "https://www.googleapis.com/auth/youtube.force-ssl";
pub const LANGUAGE_SCOPE: &str = "https://www.googleapis.com/auth/cloud-language";

/// Everything a single fetch run needs. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub video_id: String,
    pub include_sentiment: bool,
    pub include_replies: bool,
    pub max_results: u32,
    pub credentials_path: PathBuf,
    pub timeout: Duration,
}

impl RunConfig {
    /// Builds the run configuration, normalizing the video id.
    pub fn from_args(args: &Args) -> Result<Self, ParseError> {
        Ok(Self {
            video_id: parse_video_id(&args.video_id)?,
            include_sentiment: args.include_sentiment,
            include_replies: !args.top_level_only,
            max_results: args.max_results,
            credentials_path: args
                .credentials
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or(DEFAULT_CREDENTIALS_PATH)
                .into(),
            timeout: Duration::from_secs(args.timeout),
        })
    }

    /// OAuth scopes the run's access token must carry.
    pub fn scopes(&self) -> Vec<&'static str> {
        let mut scopes = vec![YOUTUBE_SCOPE];
        if self.include_sentiment {
            scopes.push(LANGUAGE_SCOPE);
        }
        scopes
    }
}

const DEFAULT_YOUTUBE_API: &str = "https://www.googleapis.com/youtube/v3";
const DEFAULT_LANGUAGE_API: &str = "https://language.googleapis.com/v1";

/// Base URLs of the Google APIs the tool talks to.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiEndpoints {
    youtube: String,
    language: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            youtube: DEFAULT_YOUTUBE_API.to_string(),
            language: DEFAULT_LANGUAGE_API.to_string(),
        }
    }
}

impl ApiEndpoints {
    /// Public Google endpoints unless `--youtube-api-url` / `--language-api-url`
    /// (or their environment variables) point elsewhere.
    pub fn from_args(args: &Args) -> Self {
        let pick = |url: &Option<String>, default: &str| {
            url.as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .unwrap_or(default)
                .to_string()
        };
        Self {
            youtube: pick(&args.youtube_api_url, DEFAULT_YOUTUBE_API),
            language: pick(&args.language_api_url, DEFAULT_LANGUAGE_API),
        }
    }

    pub fn comment_threads_url(&self) -> String {
        format!("{}/commentThreads", self.youtube.trim_end_matches('/'))
    }

    pub fn analyze_sentiment_url(&self) -> String {
        format!(
            "{}/documents:analyzeSentiment",
            self.language.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["yt-comments", "--credentials", "key.json"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_from_args_normalizes_url() {
        let config =
            RunConfig::from_args(&args(&["--video-id", "https://youtu.be/XTjtPc0uiG8"])).unwrap();
        assert_eq!(config.video_id, "XTjtPc0uiG8");
        assert_eq!(config.credentials_path, PathBuf::from("key.json"));
        assert!(config.include_replies);
        assert!(!config.include_sentiment);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_from_args_invalid_video_id() {
        let result = RunConfig::from_args(&args(&["--video-id", "no such video"]));
        assert!(matches!(result, Err(ParseError::InvalidVideoId(_))));
    }

    #[test]
    fn test_from_args_default_credentials_path() {
        let mut parsed = args(&["--video-id", "XTjtPc0uiG8"]);
        parsed.credentials = None;
        let config = RunConfig::from_args(&parsed).unwrap();
        assert_eq!(config.credentials_path, PathBuf::from(DEFAULT_CREDENTIALS_PATH));
    }

    #[test]
    fn test_from_args_top_level_only() {
        let config =
            RunConfig::from_args(&args(&["--video-id", "XTjtPc0uiG8", "--top-level-only"]))
                .unwrap();
        assert!(!config.include_replies);
    }

    #[test]
    fn test_scopes() {
        let mut config = RunConfig::from_args(&args(&["--video-id", "XTjtPc0uiG8"])).unwrap();
        assert_eq!(config.scopes(), vec![YOUTUBE_SCOPE]);

        config.include_sentiment = true;
        assert_eq!(config.scopes(), vec![YOUTUBE_SCOPE, LANGUAGE_SCOPE]);
    }

    #[test]
    fn test_endpoints_from_args_default() {
        let endpoints = ApiEndpoints::from_args(&args(&["--video-id", "XTjtPc0uiG8"]));
        assert_eq!(endpoints, ApiEndpoints::default());
    }

    #[test]
    fn test_endpoints_from_args_override() {
        let endpoints = ApiEndpoints::from_args(&args(&[
            "--video-id",
            "XTjtPc0uiG8",
            "--youtube-api-url",
            "http://127.0.0.1:8080/youtube/v3/",
            "--language-api-url",
            "http://127.0.0.1:8081/v1",
        ]));
        assert_eq!(
            endpoints.comment_threads_url(),
            "http://127.0.0.1:8080/youtube/v3/commentThreads"
        );
        assert_eq!(
            endpoints.analyze_sentiment_url(),
            "http://127.0.0.1:8081/v1/documents:analyzeSentiment"
        );
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoints = ApiEndpoints::default();
        assert_eq!(
            endpoints.comment_threads_url(),
            "https://www.googleapis.com/youtube/v3/commentThreads"
        );
        assert_eq!(
            endpoints.analyze_sentiment_url(),
            "https://language.googleapis.com/v1/documents:analyzeSentiment"
        );

        let local = ApiEndpoints {
            youtube: "http://127.0.0.1:8080/".to_string(),
            language: "http://127.0.0.1:8081".to_string(),
        };
        assert_eq!(
            local.comment_threads_url(),
            "http://127.0.0.1:8080/commentThreads"
        );
    }
}
